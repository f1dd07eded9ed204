use serde::Serialize;

use super::repo_types::CreditTopup;

/// A top-up as returned to clients, with a short-lived link to the slip.
#[derive(Debug, Serialize)]
pub struct TopupView {
    #[serde(flatten)]
    pub topup: CreditTopup,
    pub slip_url: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub credits: i64,
}
