//! The external value-transfer service.

use std::future::Future;

use serde::{Deserialize, Serialize};
use wagerplay_protocol::{Amount, LobbyId};
use wagerplay_turn::{Party, Verdict};

use crate::SettlementError;

/// One transfer, from the loser's side to the winner's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRequest {
    pub from_address: String,
    pub to_address: String,
    pub amount: Amount,
    pub arbiter_address: String,
    pub session_id: LobbyId,
    pub round: u32,
}

impl SettlementRequest {
    /// Derives the transfer a verdict calls for.
    ///
    /// The house has no wallet, so whenever it is a party the arbiter
    /// address stands in for it.
    pub fn from_verdict(verdict: &Verdict) -> Self {
        let address = |party: &Party| match party {
            Party::Player(id) => id.as_str().to_string(),
            Party::House => verdict.arbiter_address.clone(),
        };
        Self {
            from_address: address(&verdict.loser),
            to_address: address(&verdict.winner),
            amount: verdict.settlement_amount(),
            arbiter_address: verdict.arbiter_address.clone(),
            session_id: verdict.session_id.clone(),
            round: verdict.round,
        }
    }
}

/// What the gateway hands back for a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReceipt {
    /// Gateway-side reference, e.g. a transaction hash.
    pub reference: String,
}

/// Moves value between wallets.
///
/// The core never implements the transfer itself. A gateway should be
/// idempotent on `(session_id, round)` where the rail allows it; the
/// ledger already guarantees it is asked at most once per round unless
/// a caller explicitly retries.
///
/// # Example
///
/// ```rust
/// use wagerplay_settlement::{
///     SettlementError, SettlementGateway, SettlementReceipt, SettlementRequest,
/// };
///
/// /// Gateway for a deployment without a payment rail.
/// struct Offline;
///
/// impl SettlementGateway for Offline {
///     async fn settle(
///         &self,
///         _request: &SettlementRequest,
///     ) -> Result<SettlementReceipt, SettlementError> {
///         Err(SettlementError::TransferFailed("no payment rail configured".into()))
///     }
/// }
/// ```
pub trait SettlementGateway: Send + Sync + 'static {
    fn settle(
        &self,
        request: &SettlementRequest,
    ) -> impl Future<Output = Result<SettlementReceipt, SettlementError>> + Send;
}
