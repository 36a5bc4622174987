//! Settlement ledger: one record per session round, dispatched at most
//! once, plus a running balance per address.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use wagerplay_protocol::{Amount, LobbyId};
use wagerplay_turn::{Party, Verdict};

use crate::{SettlementError, SettlementGateway, SettlementRequest};

// ---------------------------------------------------------------------------
// SettlementStatus
// ---------------------------------------------------------------------------

/// Where a session's settlement stands.
///
/// ```text
/// Pending ──(gateway ok)────→ Completed
///    │
///    └──(gateway failed)──→ FailedSimulated ──(retry)──→ Pending
/// ```
///
/// `FailedSimulated` means the game ended for the players but no value
/// moved. It stays listed by [`Settler::pending`] until a retry
/// succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Pending,
    Completed,
    FailedSimulated,
}

impl SettlementStatus {
    /// `true` until the transfer is known to have happened.
    pub fn is_unreconciled(self) -> bool {
        !matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::FailedSimulated => write!(f, "failed_simulated"),
        }
    }
}

// ---------------------------------------------------------------------------
// SettlementRecord
// ---------------------------------------------------------------------------

/// The ledger entry for one session round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRecord {
    pub session_id: LobbyId,
    pub round: u32,
    pub winner: Party,
    pub request: SettlementRequest,
    pub status: SettlementStatus,
    /// Gateway calls made so far. Zero for outcomes that moved nothing.
    pub attempts: u32,
    /// Gateway reference of the successful transfer.
    pub reference: Option<String>,
    /// Why the most recent attempt failed.
    pub last_error: Option<String>,
}

// ---------------------------------------------------------------------------
// Balance
// ---------------------------------------------------------------------------

/// Running totals for one address across every settled round.
///
/// Updated once per round when the verdict is recorded, whether or not
/// the transfer went through, so a `failed_simulated` round still shows
/// up here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub credited: Amount,
    pub debited: Amount,
}

impl Balance {
    /// Net movement in minor units. Negative when the address has lost
    /// more than it won.
    pub fn net_minor(&self) -> i128 {
        i128::from(self.credited.minor()) - i128::from(self.debited.minor())
    }

    /// What an address that started with `opening` holds now, or `None`
    /// when its losses exceed the opening balance.
    pub fn applied_to(&self, opening: Amount) -> Option<Amount> {
        opening.checked_add(self.credited)?.checked_sub(self.debited)
    }
}

// ---------------------------------------------------------------------------
// Settler
// ---------------------------------------------------------------------------

type RoundKey = (LobbyId, u32);

#[derive(Default)]
struct Ledger {
    records: HashMap<RoundKey, SettlementRecord>,
    balances: HashMap<String, Balance>,
}

impl Ledger {
    fn apply(&mut self, request: &SettlementRequest) {
        let amount = request.amount;
        let debit = self.balances.entry(request.from_address.clone()).or_default();
        match debit.debited.checked_add(amount) {
            Some(total) => debit.debited = total,
            None => tracing::warn!(address = %request.from_address, "debit total overflowed, left unchanged"),
        }
        let credit = self.balances.entry(request.to_address.clone()).or_default();
        match credit.credited.checked_add(amount) {
            Some(total) => credit.credited = total,
            None => tracing::warn!(address = %request.to_address, "credit total overflowed, left unchanged"),
        }
    }
}

/// Drives settlements through a [`SettlementGateway`].
///
/// - [`settle`](Self::settle) records the verdict and calls the gateway
///   once. Records are keyed by session and round, so a play-again
///   round settles on its own. Calling it again for the same round
///   returns the existing record without another transfer.
/// - A gateway failure is not retried. The record becomes
///   `failed_simulated` and stays visible.
/// - [`retry`](Self::retry) is the explicit reconciliation path for
///   failed records.
/// - [`discard`](Self::discard) drops a lobby's completed records once
///   the lobby is gone. Balances are kept.
pub struct Settler<G: SettlementGateway> {
    gateway: G,
    ledger: Mutex<Ledger>,
}

impl<G: SettlementGateway> Settler<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            ledger: Mutex::new(Ledger::default()),
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Settles a terminal verdict exactly once per round.
    ///
    /// Returns the record as it stands after this call. A transfer
    /// failure is reported through the record's status, not as an
    /// error, so the game can end normally.
    pub async fn settle(&self, verdict: &Verdict) -> SettlementRecord {
        let request = SettlementRequest::from_verdict(verdict);
        let session_id = verdict.session_id.clone();
        let round = verdict.round;
        let key = (session_id.clone(), round);

        let claimed = {
            let mut ledger = self.lock();
            if let Some(existing) = ledger.records.get(&key) {
                tracing::debug!(
                    %session_id,
                    round,
                    status = %existing.status,
                    "settlement already recorded"
                );
                return existing.clone();
            }

            let mut record = SettlementRecord {
                session_id: session_id.clone(),
                round,
                winner: verdict.winner.clone(),
                request,
                status: SettlementStatus::Pending,
                attempts: 0,
                reference: None,
                last_error: None,
            };

            if record.request.amount.is_zero() {
                record.status = SettlementStatus::Completed;
                tracing::info!(%session_id, round, winner = %record.winner, "nothing to transfer, settled locally");
                ledger.records.insert(key, record.clone());
                return record;
            }

            ledger.apply(&record.request);
            ledger.records.insert(key, record.clone());
            record
        };

        self.dispatch(claimed).await
    }

    /// Re-drives a `failed_simulated` settlement.
    ///
    /// # Errors
    /// [`SettlementError::NotFound`] if the round was never settled.
    /// [`SettlementError::NotRetryable`] if the record is pending or
    /// already completed.
    pub async fn retry(
        &self,
        session_id: &LobbyId,
        round: u32,
    ) -> Result<SettlementRecord, SettlementError> {
        let claimed = {
            let mut ledger = self.lock();
            let record = ledger
                .records
                .get_mut(&(session_id.clone(), round))
                .ok_or_else(|| SettlementError::NotFound {
                    session_id: session_id.clone(),
                    round,
                })?;
            if record.status != SettlementStatus::FailedSimulated {
                return Err(SettlementError::NotRetryable {
                    session_id: session_id.clone(),
                    round,
                    status: record.status,
                });
            }
            record.status = SettlementStatus::Pending;
            record.clone()
        };

        tracing::info!(%session_id, round, attempts = claimed.attempts, "retrying settlement");
        Ok(self.dispatch(claimed).await)
    }

    /// The record for one round of a session, if any.
    pub fn get(&self, session_id: &LobbyId, round: u32) -> Option<SettlementRecord> {
        self.lock()
            .records
            .get(&(session_id.clone(), round))
            .cloned()
    }

    /// Every record kept for a session, oldest round first.
    pub fn rounds(&self, session_id: &LobbyId) -> Vec<SettlementRecord> {
        let mut rounds: Vec<SettlementRecord> = self
            .lock()
            .records
            .values()
            .filter(|r| &r.session_id == session_id)
            .cloned()
            .collect();
        rounds.sort_by_key(|r| r.round);
        rounds
    }

    /// Every record whose transfer has not been confirmed, ordered by
    /// session id and round.
    pub fn pending(&self) -> Vec<SettlementRecord> {
        let mut open: Vec<SettlementRecord> = self
            .lock()
            .records
            .values()
            .filter(|r| r.status.is_unreconciled())
            .cloned()
            .collect();
        open.sort_by(|a, b| (&a.session_id, a.round).cmp(&(&b.session_id, b.round)));
        open
    }

    /// Running totals for `address`. Zero for an address that never
    /// took part in a settlement.
    pub fn balance(&self, address: &str) -> Balance {
        self.lock()
            .balances
            .get(address)
            .copied()
            .unwrap_or_default()
    }

    /// Drops the completed records of a session and returns how many
    /// went. Unreconciled records stay until a retry completes them.
    pub fn discard(&self, session_id: &LobbyId) -> usize {
        let mut ledger = self.lock();
        let before = ledger.records.len();
        ledger
            .records
            .retain(|(id, _), record| id != session_id || record.status.is_unreconciled());
        let removed = before - ledger.records.len();
        let kept = ledger.records.keys().filter(|(id, _)| id == session_id).count();
        drop(ledger);

        if removed > 0 || kept > 0 {
            tracing::debug!(%session_id, removed, kept, "settlement records discarded");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    /// Calls the gateway for a record this caller has claimed as
    /// `Pending`, then stores the result.
    async fn dispatch(&self, mut record: SettlementRecord) -> SettlementRecord {
        let session_id = record.session_id.clone();
        let round = record.round;
        tracing::info!(
            %session_id,
            round,
            from = %record.request.from_address,
            to = %record.request.to_address,
            amount = %record.request.amount,
            "dispatching settlement"
        );

        let result = self.gateway.settle(&record.request).await;

        record.attempts += 1;
        match result {
            Ok(receipt) => {
                record.status = SettlementStatus::Completed;
                record.reference = Some(receipt.reference);
                record.last_error = None;
                tracing::info!(%session_id, round, attempts = record.attempts, "settlement completed");
            }
            Err(e) => {
                record.status = SettlementStatus::FailedSimulated;
                record.last_error = Some(e.to_string());
                tracing::warn!(
                    %session_id,
                    round,
                    attempts = record.attempts,
                    error = %e,
                    "settlement failed, recorded as simulated"
                );
            }
        }

        self.lock().records.insert((session_id, round), record.clone());
        record
    }

    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
