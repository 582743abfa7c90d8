use execbridge_schemas::{FilterSpec, SortDirection, SortSpec};
use sqlx::{Postgres, QueryBuilder};

/// Append `WHERE <AND of set fields>` to `qb`. String fields compare
/// case-insensitively (`destination`, `securityId`); everything else is a
/// plain equality.
pub(crate) fn push_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a FilterSpec) {
    let mut first = true;
    let mut clause = |qb: &mut QueryBuilder<'a, Postgres>| {
        qb.push(if first { " where " } else { " and " });
        first = false;
    };

    if let Some(status) = &filter.execution_status {
        clause(qb);
        qb.push("execution_status = ").push_bind(status.as_str());
    }
    if let Some(tt) = &filter.trade_type {
        clause(qb);
        qb.push("trade_type = ").push_bind(tt.as_str());
    }
    if let Some(dest) = &filter.destination {
        clause(qb);
        qb.push("lower(destination) = lower(").push_bind(dest.as_str()).push(")");
    }
    if let Some(sec) = &filter.security_id {
        clause(qb);
        qb.push("lower(security_id) = lower(").push_bind(sec.as_str()).push(")");
    }
    if let Some(id) = filter.id {
        clause(qb);
        qb.push("id = ").push_bind(id);
    }
}

/// Append `ORDER BY <sort specs>`. Caller has already dropped unknown fields
/// and defaulted to `{id, asc}` (see `execbridge_schemas::sort::parse_sort_by`).
pub(crate) fn push_order_by(qb: &mut QueryBuilder<'_, Postgres>, sort: &[SortSpec]) {
    qb.push(" order by ");
    for (i, spec) in sort.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(spec.field.column());
        qb.push(match spec.direction {
            SortDirection::Asc => " asc",
            SortDirection::Desc => " desc",
        });
    }
}

pub(crate) const EXECUTION_COLUMNS: &str = "id, execution_status, trade_type, destination, security_id, \
    quantity, limit_price, received_timestamp, sent_timestamp, trade_service_execution_id, \
    quantity_filled, average_price, version";
