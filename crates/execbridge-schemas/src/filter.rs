use crate::status::{ExecutionStatus, TradeType};

/// `findBySpec` filter predicate: the AND of whichever fields are set.
/// String comparisons (`destination`, `securityId`) are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    pub execution_status: Option<ExecutionStatus>,
    pub trade_type: Option<TradeType>,
    pub destination: Option<String>,
    pub security_id: Option<String>,
    pub id: Option<i64>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.execution_status.is_none()
            && self.trade_type.is_none()
            && self.destination.is_none()
            && self.security_id.is_none()
            && self.id.is_none()
    }
}
