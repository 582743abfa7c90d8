//! Connection pool monitor (C9): periodic sampling of the database pool's
//! utilization, surfaced as gauges and an unhealthy indicator.

use sqlx::PgPool;

const UNHEALTHY_UTILIZATION: f64 = 0.80;

/// A single pool sample (§4.9, "Pool Monitor").
#[derive(Debug, Clone, Copy)]
pub struct PoolHealth {
    pub active: u32,
    pub idle: u32,
    pub max: u32,
    pub utilization: f64,
    pub healthy: bool,
}

/// Sample `pool`'s current size/idle/max and derive utilization.
///
/// sqlx's `Pool` does not expose a count of tasks waiting on
/// `PoolConnection::acquire`, so the "threads awaiting connection" signal
/// named in the original monitor is approximated here by utilization and
/// the active-at-max condition alone.
pub fn sample(pool: &PgPool) -> PoolHealth {
    let max = pool.options().get_max_connections();
    let idle = pool.num_idle() as u32;
    let active = pool.size().saturating_sub(idle);
    let utilization = if max == 0 { 0.0 } else { active as f64 / max as f64 };
    let healthy = utilization < UNHEALTHY_UTILIZATION && active < max;

    PoolHealth { active, idle, max, utilization, healthy }
}

/// Emit the gauges named in §4.9 for one sample.
pub fn record_gauges(health: &PoolHealth) {
    metrics::gauge!("database.connection.pool.active").set(health.active as f64);
    metrics::gauge!("database.connection.pool.max").set(health.max as f64);
    metrics::gauge!("database.connection.pool.utilization").set(health.utilization);

    if !health.healthy {
        tracing::warn!(
            active = health.active,
            max = health.max,
            utilization = health.utilization,
            "database connection pool under pressure"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unhealthy_at_high_utilization() {
        let health = PoolHealth { active: 9, idle: 1, max: 10, utilization: 0.9, healthy: false };
        assert!(!health.healthy);
    }

    #[test]
    fn healthy_below_threshold() {
        let health = PoolHealth { active: 2, idle: 8, max: 10, utilization: 0.2, healthy: true };
        assert!(health.healthy);
    }
}
