//! Integration tests for the settlement ledger.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use wagerplay_protocol::{Amount, LobbyId, PlayerId};
use wagerplay_settlement::{
    Balance, SettlementError, SettlementGateway, SettlementReceipt, SettlementRequest,
    SettlementStatus, Settler,
};
use wagerplay_turn::{EngineState, Party, Verdict};

// =========================================================================
// Helpers
// =========================================================================

/// Counts calls; fails while `failing` is set. Each call takes a second
/// so overlapping settles can be observed under paused time.
#[derive(Default)]
struct ScriptedGateway {
    calls: AtomicUsize,
    failing: AtomicBool,
    seen: std::sync::Mutex<Vec<SettlementRequest>>,
}

impl ScriptedGateway {
    fn failing() -> Self {
        let gateway = Self::default();
        gateway.failing.store(true, Ordering::SeqCst);
        gateway
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn recover(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }
}

impl SettlementGateway for ScriptedGateway {
    async fn settle(&self, request: &SettlementRequest) -> Result<SettlementReceipt, SettlementError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.lock().unwrap().push(request.clone());
        tokio::time::sleep(Duration::from_secs(1)).await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(SettlementError::TransferFailed("gateway unreachable".into()));
        }
        Ok(SettlementReceipt {
            reference: format!("tx-{n}"),
        })
    }
}

fn player(id: &str) -> Party {
    Party::Player(PlayerId::new(id))
}

fn guest_wins(session: &str) -> Verdict {
    Verdict {
        session_id: LobbyId::new(session),
        round: 1,
        state: EngineState::Completed,
        winner: player("0xguest"),
        loser: player("0xhost"),
        payout: Amount::parse("1.0").unwrap(),
        forfeited: Amount::ZERO,
        wager: Amount::parse("0.5").unwrap(),
        arbiter_address: "0xarcade".into(),
    }
}

fn guest_loses_to_house(session: &str) -> Verdict {
    Verdict {
        session_id: LobbyId::new(session),
        round: 1,
        state: EngineState::LostForbiddenTerm,
        winner: Party::House,
        loser: player("0xguest"),
        payout: Amount::ZERO,
        forfeited: Amount::parse("0.5").unwrap(),
        wager: Amount::parse("0.5").unwrap(),
        arbiter_address: "0xarcade".into(),
    }
}

// =========================================================================
// SettlementRequest
// =========================================================================

#[test]
fn test_request_from_win_pays_pot_loser_to_winner() {
    let request = SettlementRequest::from_verdict(&guest_wins("S1"));
    assert_eq!(request.from_address, "0xhost");
    assert_eq!(request.to_address, "0xguest");
    assert_eq!(request.amount, Amount::parse("1").unwrap());
    assert_eq!(request.arbiter_address, "0xarcade");
    assert_eq!(request.session_id, LobbyId::new("S1"));
    assert_eq!(request.round, 1);
}

#[test]
fn test_request_house_win_goes_to_arbiter() {
    let request = SettlementRequest::from_verdict(&guest_loses_to_house("S1"));
    assert_eq!(request.from_address, "0xguest");
    assert_eq!(request.to_address, "0xarcade");
    assert_eq!(request.amount, Amount::parse("0.5").unwrap());
}

#[test]
fn test_request_serializes_camel_case() {
    let json = serde_json::to_value(SettlementRequest::from_verdict(&guest_wins("S1"))).unwrap();
    assert_eq!(json["fromAddress"], "0xhost");
    assert_eq!(json["toAddress"], "0xguest");
    assert_eq!(json["arbiterAddress"], "0xarcade");
    assert_eq!(json["sessionId"], "S1");
    assert_eq!(json["round"], 1);
    assert_eq!(json["amount"], 100_000_000u64);
}

// =========================================================================
// settle()
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_settle_success_completes_with_reference() {
    let settler = Settler::new(ScriptedGateway::default());

    let record = settler.settle(&guest_wins("S1")).await;

    assert_eq!(record.status, SettlementStatus::Completed);
    assert_eq!(record.attempts, 1);
    assert_eq!(record.reference.as_deref(), Some("tx-1"));
    assert!(record.last_error.is_none());
    assert!(settler.pending().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_settle_twice_dispatches_once() {
    let settler = Settler::new(ScriptedGateway::default());

    let first = settler.settle(&guest_wins("S1")).await;
    let second = settler.settle(&guest_wins("S1")).await;

    assert_eq!(first, second);
    assert_eq!(settler.gateway().calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_settle_concurrent_calls_dispatch_once() {
    let settler = Arc::new(Settler::new(ScriptedGateway::default()));

    let a = {
        let settler = Arc::clone(&settler);
        tokio::spawn(async move { settler.settle(&guest_wins("S1")).await })
    };
    let b = {
        let settler = Arc::clone(&settler);
        tokio::spawn(async move { settler.settle(&guest_wins("S1")).await })
    };
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    assert_eq!(settler.gateway().calls(), 1);
    let statuses = [a.status, b.status];
    assert!(statuses.contains(&SettlementStatus::Completed));
    assert_eq!(
        settler.get(&LobbyId::new("S1"), 1).unwrap().status,
        SettlementStatus::Completed
    );
}

#[tokio::test(start_paused = true)]
async fn test_settle_failure_is_visible_and_not_retried() {
    let settler = Settler::new(ScriptedGateway::failing());

    let record = settler.settle(&guest_wins("S1")).await;

    assert_eq!(record.status, SettlementStatus::FailedSimulated);
    assert_eq!(record.attempts, 1);
    assert!(record.reference.is_none());
    assert!(record.last_error.unwrap().contains("gateway unreachable"));

    // A second settle does not silently re-drive the transfer.
    settler.settle(&guest_wins("S1")).await;
    assert_eq!(settler.gateway().calls(), 1);

    let pending = settler.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].session_id, LobbyId::new("S1"));
}

#[tokio::test(start_paused = true)]
async fn test_settle_zero_amount_completes_without_gateway() {
    let settler = Settler::new(ScriptedGateway::failing());
    let verdict = Verdict {
        payout: Amount::ZERO,
        forfeited: Amount::ZERO,
        wager: Amount::ZERO,
        ..guest_wins("FREE")
    };

    let record = settler.settle(&verdict).await;

    assert_eq!(record.status, SettlementStatus::Completed);
    assert_eq!(record.attempts, 0);
    assert_eq!(settler.gateway().calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_settle_next_round_dispatches_again() {
    let settler = Settler::new(ScriptedGateway::default());
    let host_wins = Verdict {
        winner: player("0xhost"),
        loser: player("0xguest"),
        payout: Amount::ZERO,
        forfeited: Amount::parse("0.5").unwrap(),
        ..guest_wins("S1")
    };
    let rematch = Verdict {
        round: 2,
        ..guest_wins("S1")
    };

    let first = settler.settle(&host_wins).await;
    let second = settler.settle(&rematch).await;

    assert_eq!(settler.gateway().calls(), 2);
    assert_eq!(first.request.to_address, "0xhost");
    assert_eq!(second.round, 2);
    assert_eq!(second.request.to_address, "0xguest");
    assert_eq!(second.status, SettlementStatus::Completed);
    assert_eq!(second.reference.as_deref(), Some("tx-2"));

    let rounds: Vec<u32> = settler
        .rounds(&LobbyId::new("S1"))
        .iter()
        .map(|r| r.round)
        .collect();
    assert_eq!(rounds, vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_retry_targets_only_named_round() {
    let settler = Settler::new(ScriptedGateway::failing());
    settler.settle(&guest_wins("S1")).await;
    settler
        .settle(&Verdict {
            round: 2,
            ..guest_wins("S1")
        })
        .await;

    settler.gateway().recover();
    settler.retry(&LobbyId::new("S1"), 2).await.unwrap();

    let pending = settler.pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].round, 1);
    assert!(matches!(
        settler.retry(&LobbyId::new("S1"), 3).await,
        Err(SettlementError::NotFound { round: 3, .. })
    ));
}

// =========================================================================
// Balances
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_balance_tracks_each_round() {
    let settler = Settler::new(ScriptedGateway::default());
    settler.settle(&guest_wins("S1")).await;
    settler
        .settle(&Verdict {
            round: 2,
            ..guest_loses_to_house("S1")
        })
        .await;

    let guest = settler.balance("0xguest");
    assert_eq!(guest.credited, Amount::parse("1").unwrap());
    assert_eq!(guest.debited, Amount::parse("0.5").unwrap());
    assert_eq!(guest.net_minor(), 50_000_000);
    assert_eq!(
        guest.applied_to(Amount::parse("10").unwrap()),
        Some(Amount::parse("10.5").unwrap())
    );

    assert_eq!(settler.balance("0xhost").net_minor(), -100_000_000);
    assert_eq!(
        settler.balance("0xarcade").credited,
        Amount::parse("0.5").unwrap()
    );
}

#[tokio::test(start_paused = true)]
async fn test_balance_counts_failed_round_once() {
    let settler = Settler::new(ScriptedGateway::failing());
    settler.settle(&guest_loses_to_house("S1")).await;
    settler.settle(&guest_loses_to_house("S1")).await;
    settler.retry(&LobbyId::new("S1"), 1).await.unwrap();

    let guest = settler.balance("0xguest");
    assert_eq!(guest.debited, Amount::parse("0.5").unwrap());
    assert_eq!(guest.applied_to(Amount::parse("0.25").unwrap()), None);
}

#[tokio::test(start_paused = true)]
async fn test_balance_zero_amount_moves_nothing() {
    let settler = Settler::new(ScriptedGateway::default());
    settler
        .settle(&Verdict {
            payout: Amount::ZERO,
            forfeited: Amount::ZERO,
            wager: Amount::ZERO,
            ..guest_wins("FREE")
        })
        .await;

    assert_eq!(settler.balance("0xguest"), Balance::default());
    assert_eq!(settler.balance("0xnobody"), Balance::default());
}

// =========================================================================
// discard()
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_discard_drops_completed_keeps_unreconciled() {
    let settler = Settler::new(ScriptedGateway::default());
    settler.settle(&guest_wins("S1")).await;
    settler.gateway().failing.store(true, Ordering::SeqCst);
    settler
        .settle(&Verdict {
            round: 2,
            ..guest_wins("S1")
        })
        .await;
    settler.settle(&guest_wins("S2")).await;

    assert_eq!(settler.discard(&LobbyId::new("S1")), 1);

    assert!(settler.get(&LobbyId::new("S1"), 1).is_none());
    assert!(settler.get(&LobbyId::new("S1"), 2).is_some());
    assert!(settler.get(&LobbyId::new("S2"), 1).is_some());
    assert_eq!(settler.len(), 2);
    assert_eq!(settler.balance("0xguest").credited, Amount::parse("3").unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_discard_unknown_session_removes_nothing() {
    let settler = Settler::new(ScriptedGateway::default());
    settler.settle(&guest_wins("S1")).await;
    assert_eq!(settler.discard(&LobbyId::new("NOPE")), 0);
    assert_eq!(settler.len(), 1);
}

// =========================================================================
// retry()
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_retry_failed_record_after_recovery_completes() {
    let settler = Settler::new(ScriptedGateway::failing());
    settler.settle(&guest_loses_to_house("S1")).await;

    settler.gateway().recover();
    let record = settler.retry(&LobbyId::new("S1"), 1).await.unwrap();

    assert_eq!(record.status, SettlementStatus::Completed);
    assert_eq!(record.attempts, 2);
    assert_eq!(record.reference.as_deref(), Some("tx-2"));
    assert!(record.last_error.is_none());
    assert!(settler.pending().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_retry_still_failing_stays_failed() {
    let settler = Settler::new(ScriptedGateway::failing());
    settler.settle(&guest_wins("S1")).await;

    let record = settler.retry(&LobbyId::new("S1"), 1).await.unwrap();

    assert_eq!(record.status, SettlementStatus::FailedSimulated);
    assert_eq!(record.attempts, 2);
}

#[tokio::test(start_paused = true)]
async fn test_retry_completed_record_is_not_retryable() {
    let settler = Settler::new(ScriptedGateway::default());
    settler.settle(&guest_wins("S1")).await;

    let err = settler.retry(&LobbyId::new("S1"), 1).await.unwrap_err();
    assert!(matches!(
        err,
        SettlementError::NotRetryable {
            status: SettlementStatus::Completed,
            ..
        }
    ));
    assert_eq!(settler.gateway().calls(), 1);
}

#[tokio::test]
async fn test_retry_unknown_session_is_not_found() {
    let settler = Settler::new(ScriptedGateway::default());
    assert!(matches!(
        settler.retry(&LobbyId::new("NOPE"), 1).await,
        Err(SettlementError::NotFound { round: 1, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_pending_lists_only_unreconciled_sorted() {
    let settler = Settler::new(ScriptedGateway::failing());
    settler.settle(&guest_wins("B")).await;
    settler.settle(&guest_wins("A")).await;
    settler.gateway().recover();
    settler.settle(&guest_wins("C")).await;

    let ids: Vec<String> = settler
        .pending()
        .iter()
        .map(|r| r.session_id.to_string())
        .collect();
    assert_eq!(ids, vec!["A", "B"]);
    assert_eq!(settler.len(), 3);
}

#[test]
fn test_status_serializes_snake_case() {
    assert_eq!(
        serde_json::to_string(&SettlementStatus::FailedSimulated).unwrap(),
        "\"failed_simulated\""
    );
    assert_eq!(SettlementStatus::Pending.to_string(), "pending");
}
