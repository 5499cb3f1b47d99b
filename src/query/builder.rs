//! Query text construction
//!
//! Pure string building, no I/O. Clause order is stable: the time filter
//! always comes first and optional filters are appended with `AND`.
//!
//! Filter values are embedded verbatim. Callers must not pass untrusted input
//! until an escaping policy exists for the store dialect.

use super::{QueryKind, QueryRequest};
use crate::timeseries::TableCoordinates;

/// Lookback used by the health probe
pub const HEALTH_LOOKBACK_HOURS: u32 = 1;

/// Builds store queries against one table.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    coordinates: TableCoordinates,
}

impl QueryBuilder {
    pub fn new(coordinates: TableCoordinates) -> Self {
        Self { coordinates }
    }

    /// Build the query for a validated request.
    pub fn build(&self, request: &QueryRequest) -> String {
        match request.kind {
            QueryKind::Metrics => self.metrics_query(request.hours, request.source.as_deref()),
            QueryKind::Aggregated => {
                self.aggregated_query(request.hours, request.metric.as_deref())
            }
            QueryKind::Health => self.health_query(),
        }
    }

    /// Per-measure, per-source summary statistics.
    pub fn metrics_query(&self, hours: u32, source: Option<&str>) -> String {
        let where_clause = where_clause(hours, source.map(|s| ("source", s)));
        format!(
            "SELECT measure_name, \
             AVG(measure_value::double) as avg_value, \
             MAX(measure_value::double) as max_value, \
             MIN(measure_value::double) as min_value, \
             COUNT(*) as count, \
             source\n\
             FROM {}\n\
             WHERE {}\n\
             GROUP BY measure_name, source\n\
             ORDER BY measure_name, source",
            self.coordinates.qualified_name(),
            where_clause
        )
    }

    /// Hourly buckets per measure, newest bucket first.
    pub fn aggregated_query(&self, hours: u32, metric: Option<&str>) -> String {
        let where_clause = where_clause(hours, metric.map(|m| ("measure_name", m)));
        format!(
            "SELECT bin(time, 1h) as time_bucket, \
             measure_name, \
             AVG(measure_value::double) as avg_value, \
             COUNT(*) as count\n\
             FROM {}\n\
             WHERE {}\n\
             GROUP BY bin(time, 1h), measure_name\n\
             ORDER BY time_bucket DESC, measure_name",
            self.coordinates.qualified_name(),
            where_clause
        )
    }

    /// Row count over the last hour.
    pub fn health_query(&self) -> String {
        format!(
            "SELECT COUNT(*) as record_count\n\
             FROM {}\n\
             WHERE {}",
            self.coordinates.qualified_name(),
            where_clause(HEALTH_LOOKBACK_HOURS, None)
        )
    }
}

fn where_clause(hours: u32, filter: Option<(&str, &str)>) -> String {
    let mut clauses = vec![format!("time > ago({hours}h)")];
    // An empty value does not filter
    if let Some((column, value)) = filter.filter(|(_, value)| !value.is_empty()) {
        clauses.push(format!("{column} = '{value}'"));
    }
    clauses.join(" AND ")
}
