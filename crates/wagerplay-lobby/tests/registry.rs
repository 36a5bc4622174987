//! Integration tests for the lobby registry, store write-through, and
//! the poll loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use wagerplay_lobby::{
    Lobby, LobbyError, LobbyRegistry, LobbyStatus, LobbyStore, MemoryStore, RegistryConfig,
    StoreError, WatchConfig, WatchOutcome, watch_lobby,
};
use wagerplay_protocol::{Amount, GameConfig, LobbyId, PlayerId, QuestionMode};

// =========================================================================
// Helpers
// =========================================================================

fn game_config() -> GameConfig {
    GameConfig {
        game_id: "1".into(),
        game_name: "Taboo the AI".into(),
        time_limit_seconds: 300,
        question_count: 1,
        question_mode: QuestionMode::Random,
        wager: Amount::parse("0.5").unwrap(),
        arbiter_address: "0xarcade".into(),
    }
}

fn registry() -> LobbyRegistry<MemoryStore> {
    LobbyRegistry::new(MemoryStore::new(), RegistryConfig::default())
}

fn host() -> Option<PlayerId> {
    Some(PlayerId::new("0xhost"))
}

fn fast_watch() -> WatchConfig {
    WatchConfig {
        interval: Duration::from_secs(2),
        initial_jitter: Duration::ZERO,
    }
}

/// Accepts the first `budget` saves, then refuses every write.
struct FlakyStore {
    inner: MemoryStore,
    budget: AtomicUsize,
}

impl FlakyStore {
    fn new(budget: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            budget: AtomicUsize::new(budget),
        }
    }
}

impl LobbyStore for FlakyStore {
    async fn save(&self, lobby: &Lobby) -> Result<(), StoreError> {
        let allowed = self
            .budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !allowed {
            return Err(StoreError::Backend("disk full".into()));
        }
        self.inner.save(lobby).await
    }

    async fn remove(&self, id: &LobbyId) -> Result<(), StoreError> {
        self.inner.remove(id).await
    }

    async fn load_all(&self) -> Result<Vec<Lobby>, StoreError> {
        self.inner.load_all().await
    }
}

// =========================================================================
// create / get
// =========================================================================

#[tokio::test]
async fn test_create_with_host_is_waiting() {
    let reg = registry();
    let lobby = reg.create(host(), 2, game_config()).await.unwrap();

    assert_eq!(lobby.status(), LobbyStatus::Waiting);
    assert_eq!(lobby.players(), &[PlayerId::new("0xhost")]);
    assert_eq!(lobby.host(), Some(&PlayerId::new("0xhost")));
    assert_eq!(lobby.id().as_str().len(), 8);
    assert_eq!(reg.get(lobby.id()).await.unwrap(), lobby);
}

#[tokio::test]
async fn test_create_persists_record() {
    let reg = registry();
    let lobby = reg.create(host(), 2, game_config()).await.unwrap();
    assert_eq!(reg.store().get(lobby.id()), Some(lobby));
}

#[tokio::test]
async fn test_create_zero_capacity_is_invalid() {
    let reg = registry();
    let err = reg.create(host(), 0, game_config()).await.unwrap_err();
    assert!(matches!(err, LobbyError::InvalidConfig(_)));
    assert!(reg.is_empty().await);
}

#[tokio::test]
async fn test_create_above_max_capacity_is_invalid() {
    let reg = registry();
    let err = reg.create(host(), 9, game_config()).await.unwrap_err();
    assert!(matches!(err, LobbyError::InvalidConfig(_)));
}

#[tokio::test]
async fn test_create_with_broken_config_is_invalid() {
    let reg = registry();
    let config = GameConfig {
        time_limit_seconds: 0,
        ..game_config()
    };
    let err = reg.create(host(), 2, config).await.unwrap_err();
    assert!(matches!(err, LobbyError::InvalidConfig(msg) if msg.contains("timeLimitSeconds")));
}

#[tokio::test]
async fn test_create_with_blank_host_is_invalid() {
    let reg = registry();
    let err = reg
        .create(Some(PlayerId::new("  ")), 2, game_config())
        .await
        .unwrap_err();
    assert!(matches!(err, LobbyError::InvalidConfig(_)));
}

#[tokio::test]
async fn test_create_single_seat_is_ready_immediately() {
    let reg = registry();
    let lobby = reg.create(host(), 1, game_config()).await.unwrap();
    assert!(lobby.is_ready());
}

#[tokio::test]
async fn test_create_store_failure_leaves_no_lobby() {
    let reg = LobbyRegistry::new(FlakyStore::new(0), RegistryConfig::default());
    let err = reg.create(host(), 2, game_config()).await.unwrap_err();
    assert!(matches!(err, LobbyError::Storage(_)));
    assert_eq!(reg.len().await, 0);
}

#[tokio::test]
async fn test_get_unknown_is_not_found() {
    let reg = registry();
    let err = reg.get(&LobbyId::new("NOPE0000")).await.unwrap_err();
    assert!(matches!(err, LobbyError::NotFound(id) if id.as_str() == "NOPE0000"));
}

// =========================================================================
// join
// =========================================================================

#[tokio::test]
async fn test_join_fills_lobby_and_flips_ready() {
    let reg = registry();
    let lobby = reg.create(host(), 2, game_config()).await.unwrap();

    let joined = reg.join(lobby.id(), PlayerId::new("0xguest")).await.unwrap();

    assert_eq!(joined.status(), LobbyStatus::Ready);
    assert_eq!(
        joined.players(),
        &[PlayerId::new("0xhost"), PlayerId::new("0xguest")]
    );
    assert!(reg.get(lobby.id()).await.unwrap().is_ready());
    assert!(reg.store().get(lobby.id()).unwrap().is_ready());
}

#[tokio::test]
async fn test_join_same_player_twice_is_idempotent() {
    let reg = registry();
    let lobby = reg.create(host(), 3, game_config()).await.unwrap();

    let once = reg.join(lobby.id(), PlayerId::new("0xguest")).await.unwrap();
    let twice = reg.join(lobby.id(), PlayerId::new("0xguest")).await.unwrap();

    assert_eq!(once, twice);
    assert_eq!(twice.players().len(), 2);
    assert_eq!(twice.status(), LobbyStatus::Waiting);
}

#[tokio::test]
async fn test_join_host_again_is_idempotent() {
    let reg = registry();
    let lobby = reg.create(host(), 2, game_config()).await.unwrap();
    let again = reg.join(lobby.id(), PlayerId::new("0xhost")).await.unwrap();
    assert_eq!(again.players().len(), 1);
    assert!(!again.is_ready());
}

#[tokio::test]
async fn test_join_full_lobby_is_rejected() {
    let reg = registry();
    let lobby = reg.create(host(), 2, game_config()).await.unwrap();
    reg.join(lobby.id(), PlayerId::new("0xguest")).await.unwrap();

    let err = reg
        .join(lobby.id(), PlayerId::new("0xlate"))
        .await
        .unwrap_err();
    assert!(matches!(err, LobbyError::Full { capacity: 2, .. }));

    let current = reg.get(lobby.id()).await.unwrap();
    assert_eq!(current.players().len(), 2);
    assert!(current.is_ready());
}

#[tokio::test]
async fn test_join_seated_player_on_full_lobby_is_ok() {
    let reg = registry();
    let lobby = reg.create(host(), 2, game_config()).await.unwrap();
    reg.join(lobby.id(), PlayerId::new("0xguest")).await.unwrap();

    let again = reg.join(lobby.id(), PlayerId::new("0xguest")).await.unwrap();
    assert_eq!(again.players().len(), 2);
}

#[tokio::test]
async fn test_join_blank_player_is_invalid() {
    let reg = registry();
    let lobby = reg.create(host(), 2, game_config()).await.unwrap();
    let err = reg.join(lobby.id(), PlayerId::new("")).await.unwrap_err();
    assert!(matches!(err, LobbyError::InvalidConfig(_)));
}

#[tokio::test]
async fn test_join_store_failure_keeps_previous_state() {
    // One save for create, then every write fails.
    let reg = LobbyRegistry::new(FlakyStore::new(1), RegistryConfig::default());
    let lobby = reg.create(host(), 2, game_config()).await.unwrap();

    let err = reg
        .join(lobby.id(), PlayerId::new("0xguest"))
        .await
        .unwrap_err();
    assert!(matches!(err, LobbyError::Storage(_)));

    let current = reg.get(lobby.id()).await.unwrap();
    assert_eq!(current.players().len(), 1);
    assert!(!current.is_ready());
}

#[tokio::test]
async fn test_join_without_host_fills_from_empty() {
    let reg = registry();
    let lobby = reg.create(None, 2, game_config()).await.unwrap();
    assert!(lobby.players().is_empty());

    let first = reg.join(lobby.id(), PlayerId::new("a")).await.unwrap();
    assert!(!first.is_ready());
    let second = reg.join(lobby.id(), PlayerId::new("b")).await.unwrap();
    assert!(second.is_ready());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_join_concurrent_race_admits_exactly_one() {
    let reg = Arc::new(registry());
    let lobby = reg.create(host(), 2, game_config()).await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..16 {
        let reg = Arc::clone(&reg);
        let id = lobby.id().clone();
        tasks.push(tokio::spawn(async move {
            reg.join(&id, PlayerId::new(format!("0xguest{i}"))).await
        }));
    }

    let mut admitted = 0;
    let mut full = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(LobbyError::Full { .. }) => full += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(admitted, 1);
    assert_eq!(full, 15);
    let current = reg.get(lobby.id()).await.unwrap();
    assert_eq!(current.players().len(), 2);
    assert!(current.is_ready());
}

#[tokio::test]
async fn test_join_readiness_rule_holds_after_every_call() {
    let reg = registry();
    for capacity in 1..=4 {
        let lobby = reg.create(None, capacity, game_config()).await.unwrap();
        assert_eq!(lobby.is_ready(), lobby.players().len() >= lobby.capacity());

        for p in 0..capacity + 1 {
            let result = reg.join(lobby.id(), PlayerId::new(format!("p{p}"))).await;
            let current = reg.get(lobby.id()).await.unwrap();
            assert_eq!(current.is_ready(), current.players().len() >= current.capacity());
            assert!(current.players().len() <= current.capacity());
            if p >= capacity {
                assert!(matches!(result, Err(LobbyError::Full { .. })));
            }
        }
    }
}

// =========================================================================
// cancel
// =========================================================================

#[tokio::test]
async fn test_cancel_returns_last_state_then_not_found() {
    let reg = registry();
    let lobby = reg.create(host(), 2, game_config()).await.unwrap();

    let cancelled = reg.cancel(lobby.id()).await.unwrap();
    assert_eq!(cancelled.id(), lobby.id());
    assert_eq!(cancelled.players().len(), 1);

    assert!(matches!(
        reg.get(lobby.id()).await,
        Err(LobbyError::NotFound(_))
    ));
    assert!(matches!(
        reg.join(lobby.id(), PlayerId::new("0xguest")).await,
        Err(LobbyError::NotFound(_))
    ));
    assert!(matches!(
        reg.cancel(lobby.id()).await,
        Err(LobbyError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_cancel_removes_stored_record() {
    let reg = registry();
    let lobby = reg.create(host(), 2, game_config()).await.unwrap();
    reg.cancel(lobby.id()).await.unwrap();
    assert!(reg.store().get(lobby.id()).is_none());
    assert!(reg.store().is_empty());
}

#[tokio::test]
async fn test_cancel_does_not_touch_other_lobbies() {
    let reg = registry();
    let a = reg.create(host(), 2, game_config()).await.unwrap();
    let b = reg.create(host(), 2, game_config()).await.unwrap();

    reg.cancel(a.id()).await.unwrap();

    assert!(reg.get(b.id()).await.is_ok());
    assert_eq!(reg.len().await, 1);
}

// =========================================================================
// expiry / listing
// =========================================================================

#[tokio::test]
async fn test_expire_idle_removes_waiting_keeps_ready() {
    let reg = registry();
    let waiting = reg.create(host(), 2, game_config()).await.unwrap();
    let ready = reg.create(host(), 1, game_config()).await.unwrap();

    let expired = reg.expire_idle(Duration::ZERO).await;

    assert_eq!(expired, vec![waiting.id().clone()]);
    assert!(matches!(
        reg.get(waiting.id()).await,
        Err(LobbyError::NotFound(_))
    ));
    assert!(reg.get(ready.id()).await.is_ok());
    assert!(reg.store().get(waiting.id()).is_none());
}

#[tokio::test]
async fn test_expire_idle_long_ttl_keeps_fresh_lobbies() {
    let reg = registry();
    reg.create(host(), 2, game_config()).await.unwrap();
    assert!(reg.expire_stale().await.is_empty());
    assert_eq!(reg.len().await, 1);
}

#[tokio::test]
async fn test_list_waiting_skips_ready_lobbies() {
    let reg = registry();
    let open = reg.create(host(), 2, game_config()).await.unwrap();
    reg.create(host(), 1, game_config()).await.unwrap();

    let waiting = reg.list_waiting().await;
    assert_eq!(waiting.len(), 1);
    assert_eq!(waiting[0].id(), open.id());
}

// =========================================================================
// restore
// =========================================================================

#[tokio::test]
async fn test_restore_resumes_persisted_lobbies() {
    let reg = registry();
    let lobby = reg.create(host(), 2, game_config()).await.unwrap();

    let snapshot = MemoryStore::new();
    for record in reg.store().load_all().await.unwrap() {
        snapshot.save(&record).await.unwrap();
    }

    let restored = LobbyRegistry::restore(snapshot, RegistryConfig::default())
        .await
        .unwrap();
    assert_eq!(restored.get(lobby.id()).await.unwrap(), lobby);

    let joined = restored
        .join(lobby.id(), PlayerId::new("0xguest"))
        .await
        .unwrap();
    assert!(joined.is_ready());
}

#[tokio::test]
async fn test_memory_store_rejects_status_regression() {
    let reg = registry();
    let lobby = reg.create(host(), 2, game_config()).await.unwrap();
    let waiting = lobby.clone();
    reg.join(lobby.id(), PlayerId::new("0xguest")).await.unwrap();

    let err = reg.store().save(&waiting).await.unwrap_err();
    assert!(matches!(err, StoreError::StatusRegression(_)));
}

// =========================================================================
// watch_lobby
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_watch_lobby_reports_ready_after_join() {
    let reg = Arc::new(registry());
    let lobby = reg.create(host(), 2, game_config()).await.unwrap();

    let watcher = watch_lobby(Arc::clone(&reg), lobby.id().clone(), fast_watch());
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(
        watcher.latest().map(|l| l.status()),
        Some(LobbyStatus::Waiting)
    );

    reg.join(lobby.id(), PlayerId::new("0xguest")).await.unwrap();

    match watcher.outcome().await {
        WatchOutcome::Ready(seen) => assert_eq!(seen.players().len(), 2),
        other => panic!("expected ready, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_watch_lobby_already_ready_returns_immediately() {
    let reg = Arc::new(registry());
    let lobby = reg.create(host(), 1, game_config()).await.unwrap();

    let outcome = watch_lobby(reg, lobby.id().clone(), fast_watch())
        .outcome()
        .await;
    assert!(matches!(outcome, WatchOutcome::Ready(_)));
}

#[tokio::test(start_paused = true)]
async fn test_watch_lobby_cancel_after_waiting_is_abandoned() {
    let reg = Arc::new(registry());
    let lobby = reg.create(host(), 2, game_config()).await.unwrap();

    let watcher = watch_lobby(Arc::clone(&reg), lobby.id().clone(), fast_watch());
    tokio::time::sleep(Duration::from_secs(3)).await;
    reg.cancel(lobby.id()).await.unwrap();

    assert_eq!(
        watcher.outcome().await,
        WatchOutcome::Abandoned(lobby.id().clone())
    );
}

#[tokio::test(start_paused = true)]
async fn test_watch_lobby_unknown_id_is_not_found() {
    let reg = Arc::new(registry());
    let id = LobbyId::new("MISSING0");
    let outcome = watch_lobby(reg, id.clone(), fast_watch()).outcome().await;
    assert_eq!(outcome, WatchOutcome::NotFound(id));
}

#[tokio::test(start_paused = true)]
async fn test_watch_lobby_stop_ends_loop() {
    let reg = Arc::new(registry());
    let lobby = reg.create(host(), 2, game_config()).await.unwrap();

    let watcher = watch_lobby(Arc::clone(&reg), lobby.id().clone(), fast_watch());
    tokio::time::sleep(Duration::from_secs(1)).await;
    watcher.stop();
    watcher.stop();

    assert_eq!(watcher.outcome().await, WatchOutcome::Stopped);
    assert!(reg.get(lobby.id()).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_watch_lobby_never_reports_waiting_after_ready() {
    let reg = Arc::new(registry());
    let lobby = reg.create(host(), 2, game_config()).await.unwrap();

    let watcher = watch_lobby(Arc::clone(&reg), lobby.id().clone(), fast_watch());
    let mut updates = watcher.subscribe();
    reg.join(lobby.id(), PlayerId::new("0xguest")).await.unwrap();

    let outcome = watcher.outcome().await;
    assert!(matches!(outcome, WatchOutcome::Ready(_)));
    let last = updates.borrow_and_update().clone();
    assert!(last.unwrap().is_ready());
}
