//! `sortBy` query-parameter parsing for `GET /executions`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    ExecutionStatus,
    TradeType,
    Destination,
    SecurityId,
    Quantity,
    ReceivedTimestamp,
    SentTimestamp,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::ExecutionStatus => "execution_status",
            SortField::TradeType => "trade_type",
            SortField::Destination => "destination",
            SortField::SecurityId => "security_id",
            SortField::Quantity => "quantity",
            SortField::ReceivedTimestamp => "received_timestamp",
            SortField::SentTimestamp => "sent_timestamp",
        }
    }

    fn parse(field: &str) -> Option<SortField> {
        match field {
            "id" => Some(SortField::Id),
            "executionStatus" => Some(SortField::ExecutionStatus),
            "tradeType" => Some(SortField::TradeType),
            "destination" => Some(SortField::Destination),
            "securityId" => Some(SortField::SecurityId),
            "quantity" => Some(SortField::Quantity),
            "receivedTimestamp" => Some(SortField::ReceivedTimestamp),
            "sentTimestamp" => Some(SortField::SentTimestamp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Parse a comma-separated `sortBy` value.
///
/// A leading `-` on a field means descending. Unknown fields are silently
/// dropped (duplicates are kept — callers may legitimately want a tie-break
/// on the same column repeated). If the result is empty, defaults to a
/// single `{id, asc}` entry.
pub fn parse_sort_by(raw: Option<&str>) -> Vec<SortSpec> {
    let mut out = Vec::new();
    if let Some(raw) = raw {
        for token in raw.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let (direction, field) = match token.strip_prefix('-') {
                Some(rest) => (SortDirection::Desc, rest),
                None => (SortDirection::Asc, token),
            };
            if let Some(field) = SortField::parse(field) {
                out.push(SortSpec { field, direction });
            }
        }
    }
    if out.is_empty() {
        out.push(SortSpec {
            field: SortField::Id,
            direction: SortDirection::Asc,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_defaults_to_id_asc() {
        let specs = parse_sort_by(None);
        assert_eq!(specs, vec![SortSpec { field: SortField::Id, direction: SortDirection::Asc }]);
        let specs = parse_sort_by(Some(""));
        assert_eq!(specs, vec![SortSpec { field: SortField::Id, direction: SortDirection::Asc }]);
    }

    #[test]
    fn unknown_fields_dropped() {
        let specs = parse_sort_by(Some("bogus,quantity"));
        assert_eq!(specs, vec![SortSpec { field: SortField::Quantity, direction: SortDirection::Asc }]);
    }

    #[test]
    fn leading_dash_means_descending() {
        let specs = parse_sort_by(Some("-receivedTimestamp"));
        assert_eq!(
            specs,
            vec![SortSpec { field: SortField::ReceivedTimestamp, direction: SortDirection::Desc }]
        );
    }

    #[test]
    fn duplicates_are_preserved() {
        let specs = parse_sort_by(Some("id,id"));
        assert_eq!(specs.len(), 2);
    }

    #[test]
    fn all_unknown_falls_back_to_default() {
        let specs = parse_sort_by(Some("foo,bar"));
        assert_eq!(specs, vec![SortSpec { field: SortField::Id, direction: SortDirection::Asc }]);
    }
}
