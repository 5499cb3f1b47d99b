//! Process-wide logging and OpenTelemetry bootstrap for Tidepool binaries.

use crate::{Error, Result};

use opentelemetry::global;
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{self, Sampler, TracerProvider};
use opentelemetry_sdk::Resource;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const SERVICE_NAMESPACE: &str = "tidepool";
const ATTR_SERVICE_NAME: &str = "service.name";
const ATTR_SERVICE_NAMESPACE: &str = "service.namespace";
const ATTR_RUN_ID: &str = "tidepool.run_id";

/// Whether spans and metrics leave the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryMode {
    Disabled,
    Otlp,
}

impl TelemetryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryMode::Disabled => "disabled",
            TelemetryMode::Otlp => "otlp",
        }
    }
}

/// OTLP transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtlpProtocol {
    Grpc,
    HttpProtobuf,
}

impl OtlpProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtlpProtocol::Grpc => "grpc",
            OtlpProtocol::HttpProtobuf => "http/protobuf",
        }
    }
}

impl FromStr for OtlpProtocol {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "grpc" => Ok(Self::Grpc),
            "http/protobuf" | "http/proto" | "http" => Ok(Self::HttpProtobuf),
            other => Err(Error::Config(format!(
                "OTEL_EXPORTER_OTLP_PROTOCOL must be grpc or http/protobuf, got '{other}'"
            ))),
        }
    }
}

/// Telemetry settings resolved from `OTEL_*` and `TIDEPOOL_TELEMETRY_*` variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub mode: TelemetryMode,
    pub service_name: String,
    pub otlp_endpoint: Option<String>,
    pub otlp_protocol: OtlpProtocol,
    pub traces_sampler: String,
    pub run_id: Option<String>,
    pub resource_attributes: Vec<KeyValue>,
    sampler: Sampler,
}

impl TelemetryConfig {
    pub fn from_env(default_service_name: &str) -> Result<Self> {
        Self::from_lookup(default_service_name, &|name| std::env::var(name).ok())
    }

    fn from_lookup(
        default_service_name: &str,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let trimmed = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let service_name = match lookup("OTEL_SERVICE_NAME") {
            Some(name) if name.trim().is_empty() => {
                return Err(Error::Config("OTEL_SERVICE_NAME cannot be empty".to_string()));
            }
            Some(name) => name.trim().to_string(),
            None => default_service_name.to_string(),
        };

        let otlp_endpoint = trimmed("OTEL_EXPORTER_OTLP_ENDPOINT");
        let otlp_protocol = match lookup("OTEL_EXPORTER_OTLP_PROTOCOL") {
            Some(raw) => raw.parse()?,
            None => OtlpProtocol::Grpc,
        };

        let enabled = match lookup("TIDEPOOL_TELEMETRY_ENABLED") {
            Some(raw) => Some(parse_bool("TIDEPOOL_TELEMETRY_ENABLED", &raw)?),
            None => None,
        };
        let mode = match (enabled, otlp_endpoint.is_some()) {
            (Some(false), _) | (None, false) => TelemetryMode::Disabled,
            (Some(true), true) | (None, true) => TelemetryMode::Otlp,
            (Some(true), false) => {
                return Err(Error::Config(
                    "TIDEPOOL_TELEMETRY_ENABLED=true requires OTEL_EXPORTER_OTLP_ENDPOINT"
                        .to_string(),
                ));
            }
        };

        let run_id = trimmed("TIDEPOOL_TELEMETRY_RUN_ID");

        let traces_sampler =
            trimmed("OTEL_TRACES_SAMPLER").unwrap_or_else(|| "parentbased_always_on".to_string());
        let sampler = parse_sampler(&traces_sampler, lookup("OTEL_TRACES_SAMPLER_ARG").as_deref())?;

        let mut attributes = BTreeMap::new();
        if let Some(raw) = lookup("OTEL_RESOURCE_ATTRIBUTES") {
            attributes.extend(parse_resource_attributes(&raw)?);
        }
        attributes.insert(ATTR_SERVICE_NAME.to_string(), service_name.clone());
        attributes
            .entry(ATTR_SERVICE_NAMESPACE.to_string())
            .or_insert_with(|| SERVICE_NAMESPACE.to_string());
        if let Some(run_id) = &run_id {
            attributes.insert(ATTR_RUN_ID.to_string(), run_id.clone());
        }

        Ok(Self {
            mode,
            service_name,
            otlp_endpoint,
            otlp_protocol,
            traces_sampler,
            run_id,
            resource_attributes: attributes
                .into_iter()
                .map(|(k, v)| KeyValue::new(k, v))
                .collect(),
            sampler,
        })
    }
}

/// Keeps the SDK providers alive until the process exits.
pub struct Telemetry {
    config: TelemetryConfig,
    tracer_provider: TracerProvider,
    meter_provider: SdkMeterProvider,
}

impl Telemetry {
    /// Install the JSON log subscriber and global OTel providers.
    pub fn init_for_component(default_service_name: &str, log_level: &str) -> Result<Self> {
        let config = TelemetryConfig::from_env(default_service_name)?;
        let level: Level = log_level.trim().parse().map_err(|_| {
            Error::Config(format!(
                "invalid log level '{log_level}', expected one of [trace, debug, info, warn, error]"
            ))
        })?;

        FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .json()
            .try_init()
            .map_err(|e| Error::Config(format!("failed to initialize log subscriber: {e}")))?;

        let resource =
            Resource::default().merge(&Resource::new(config.resource_attributes.clone()));

        let tracer_provider = TracerProvider::builder()
            .with_config(
                trace::Config::default()
                    .with_sampler(config.sampler.clone())
                    .with_resource(resource.clone()),
            )
            .build();
        let _ = global::set_tracer_provider(tracer_provider.clone());

        let meter_provider = SdkMeterProvider::builder().with_resource(resource).build();
        global::set_meter_provider(meter_provider.clone());
        global::set_text_map_propagator(TraceContextPropagator::new());

        info!(
            service_name = %config.service_name,
            telemetry_mode = config.mode.as_str(),
            otlp_endpoint = %config.otlp_endpoint.as_deref().unwrap_or("none"),
            otlp_protocol = config.otlp_protocol.as_str(),
            traces_sampler = %config.traces_sampler,
            run_id = %config.run_id.as_deref().unwrap_or("none"),
            "Telemetry initialized"
        );

        Ok(Self {
            config,
            tracer_provider,
            meter_provider,
        })
    }
}

impl Drop for Telemetry {
    fn drop(&mut self) {
        info!(service_name = %self.config.service_name, "Telemetry shutting down");
        let _ = self.meter_provider.shutdown();
        let _ = self.tracer_provider.shutdown();
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "{name} must be a boolean (true/false/1/0), got '{raw}'"
        ))),
    }
}

fn parse_sampler(name: &str, arg: Option<&str>) -> Result<Sampler> {
    let ratio = || -> Result<f64> {
        let raw = arg.ok_or_else(|| {
            Error::Config("OTEL_TRACES_SAMPLER_ARG is required for ratio samplers".to_string())
        })?;
        let value: f64 = raw.trim().parse().map_err(|e| {
            Error::Config(format!("OTEL_TRACES_SAMPLER_ARG must be a float: {e}"))
        })?;
        if !(0.0..=1.0).contains(&value) {
            return Err(Error::Config(format!(
                "OTEL_TRACES_SAMPLER_ARG must be in [0,1], got {value}"
            )));
        }
        Ok(value)
    };

    match name.trim().to_ascii_lowercase().as_str() {
        "always_on" => Ok(Sampler::AlwaysOn),
        "always_off" => Ok(Sampler::AlwaysOff),
        "traceidratio" => Ok(Sampler::TraceIdRatioBased(ratio()?)),
        "parentbased_always_on" => Ok(Sampler::ParentBased(Box::new(Sampler::AlwaysOn))),
        "parentbased_always_off" => Ok(Sampler::ParentBased(Box::new(Sampler::AlwaysOff))),
        "parentbased_traceidratio" => Ok(Sampler::ParentBased(Box::new(
            Sampler::TraceIdRatioBased(ratio()?),
        ))),
        other => Err(Error::Config(format!(
            "OTEL_TRACES_SAMPLER '{other}' is not supported"
        ))),
    }
}

fn parse_resource_attributes(raw: &str) -> Result<Vec<(String, String)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                Error::Config(format!(
                    "OTEL_RESOURCE_ATTRIBUTES entry '{pair}' is invalid, expected key=value"
                ))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::Config(
                    "OTEL_RESOURCE_ATTRIBUTES contains an empty attribute key".to_string(),
                ));
            }
            Ok((key.to_string(), value.trim().to_string()))
        })
        .collect()
}
