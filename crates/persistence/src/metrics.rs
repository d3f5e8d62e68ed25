//! Database metrics collection.

use metrics::{gauge, histogram};
use sqlx::SqlitePool;
use std::time::Instant;

/// Record storage query duration.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "storage_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Record connection pool metrics.
pub fn record_pool_metrics(pool: &SqlitePool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("storage_connections_active").set(active as f64);
    gauge!("storage_connections_idle").set(idle as f64);
    gauge!("storage_connections_total").set(size as f64);
}

/// Times one query; call [`QueryTimer::record`] once it completes.
///
/// ```ignore
/// let timer = QueryTimer::new("secure_state_get");
/// let row = sqlx::query_as::<_, SecureEntryEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration to metrics.
    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }
}
