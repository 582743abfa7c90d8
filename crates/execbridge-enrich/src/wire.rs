//! Wire shape of the outbound security-catalog lookup (§6, "Outbound HTTP
//! (security service)").

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SecuritiesResponse {
    pub securities: Vec<SecurityRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SecurityRecord {
    pub security_id: String,
    pub ticker: Option<String>,
}
