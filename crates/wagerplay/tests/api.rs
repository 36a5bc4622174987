//! JSON request dispatch through `Coordinator::handle_json`.

use serde_json::{Value, json};
use wagerplay::prelude::*;

struct NoRail;

impl SettlementGateway for NoRail {
    async fn settle(&self, _: &SettlementRequest) -> Result<SettlementReceipt, SettlementError> {
        Err(SettlementError::TransferFailed("no rail".into()))
    }
}

fn coordinator() -> Coordinator<MemoryStore, NoRail> {
    let bank = QuestionBank::new(vec![Question {
        main_term: "COFFEE".into(),
        prompt: "A brewed morning drink.".into(),
        forbidden_terms: vec!["BEAN".into(), "CUP".into()],
        topic: "Food & Drink".into(),
    }])
    .unwrap();
    CoordinatorBuilder::new().build(MemoryStore::new(), NoRail, bank)
}

fn game_config() -> Value {
    json!({
        "gameId": "1",
        "gameName": "Taboo the AI",
        "timeLimitSeconds": 300,
        "questionCount": 1,
        "questionMode": { "type": "random" },
        "wager": 50_000_000u64,
        "arbiterAddress": "0xarcade"
    })
}

async fn call(c: &Coordinator<MemoryStore, NoRail>, request: Value) -> Value {
    let body = serde_json::to_vec(&request).unwrap();
    serde_json::from_slice(&c.handle_json(&body).await).unwrap()
}

async fn create(c: &Coordinator<MemoryStore, NoRail>) -> String {
    let response = call(
        c,
        json!({
            "type": "create_lobby",
            "hostIdentifier": "0xhost",
            "capacity": 2,
            "gameConfig": game_config()
        }),
    )
    .await;
    assert_eq!(response["type"], "lobby", "{response}");
    response["lobby"]["id"].as_str().unwrap().to_string()
}

fn assert_error(response: &Value, code: &str, status: u64) {
    assert_eq!(response["type"], "error", "{response}");
    assert_eq!(response["code"], code, "{response}");
    assert_eq!(response["status"], status);
    assert!(!response["message"].as_str().unwrap().is_empty());
}

// =========================================================================
// Happy path
// =========================================================================

#[tokio::test]
async fn test_create_returns_waiting_lobby_with_host_seated() {
    let c = coordinator();
    let response = call(
        &c,
        json!({
            "type": "create_lobby",
            "hostIdentifier": "0xhost",
            "capacity": 2,
            "gameConfig": game_config()
        }),
    )
    .await;

    let lobby = &response["lobby"];
    assert_eq!(lobby["status"], "waiting");
    assert_eq!(lobby["hostIdentifier"], "0xhost");
    assert_eq!(lobby["players"], json!(["0xhost"]));
    assert_eq!(lobby["capacity"], 2);
    assert_eq!(lobby["gameConfig"]["arbiterAddress"], "0xarcade");
}

#[tokio::test]
async fn test_get_then_join_then_cancel() {
    let c = coordinator();
    let id = create(&c).await;

    let fetched = call(&c, json!({ "type": "get_lobby", "id": id })).await;
    assert_eq!(fetched["lobby"]["status"], "waiting");

    let joined = call(
        &c,
        json!({
            "type": "lobby_action",
            "id": id,
            "action": "join",
            "playerIdentifier": "0xguest"
        }),
    )
    .await;
    assert_eq!(joined["lobby"]["status"], "ready");
    assert_eq!(joined["lobby"]["players"], json!(["0xhost", "0xguest"]));

    let cancelled = call(&c, json!({ "type": "lobby_action", "id": id, "action": "cancel" })).await;
    assert_eq!(cancelled, json!({ "type": "cancelled", "ok": true }));

    let gone = call(&c, json!({ "type": "get_lobby", "id": id })).await;
    assert_error(&gone, "not_found", 404);
}

#[tokio::test]
async fn test_join_twice_is_idempotent() {
    let c = coordinator();
    let id = create(&c).await;
    let join = json!({
        "type": "lobby_action",
        "id": id,
        "action": "join",
        "playerIdentifier": "0xhost"
    });

    let response = call(&c, join).await;

    assert_eq!(response["lobby"]["players"], json!(["0xhost"]));
    assert_eq!(response["lobby"]["status"], "waiting");
}

// =========================================================================
// Rejections
// =========================================================================

#[tokio::test]
async fn test_create_without_host_is_invalid_config() {
    let c = coordinator();
    let response = call(
        &c,
        json!({ "type": "create_lobby", "capacity": 2, "gameConfig": game_config() }),
    )
    .await;
    assert_error(&response, "invalid_config", 400);
    assert!(response["message"].as_str().unwrap().contains("hostIdentifier"));
    assert!(c.list_waiting().await.is_empty());
}

#[tokio::test]
async fn test_create_without_game_config_is_invalid_config() {
    let c = coordinator();
    let response = call(
        &c,
        json!({ "type": "create_lobby", "hostIdentifier": "0xhost", "capacity": 2 }),
    )
    .await;
    assert_error(&response, "invalid_config", 400);
}

#[tokio::test]
async fn test_create_with_invalid_game_config_names_field() {
    let c = coordinator();
    let mut config = game_config();
    config["gameId"] = json!("");
    let response = call(
        &c,
        json!({
            "type": "create_lobby",
            "hostIdentifier": "0xhost",
            "capacity": 2,
            "gameConfig": config
        }),
    )
    .await;
    assert_error(&response, "invalid_config", 400);
    assert!(response["message"].as_str().unwrap().contains("gameId"));
}

#[tokio::test]
async fn test_join_without_player_is_bad_request() {
    let c = coordinator();
    let id = create(&c).await;
    let response = call(&c, json!({ "type": "lobby_action", "id": id, "action": "join" })).await;
    assert_error(&response, "bad_request", 400);
}

#[tokio::test]
async fn test_join_unknown_lobby_is_not_found() {
    let c = coordinator();
    let response = call(
        &c,
        json!({
            "type": "lobby_action",
            "id": "ZZZZZZZZ",
            "action": "join",
            "playerIdentifier": "0xguest"
        }),
    )
    .await;
    assert_error(&response, "not_found", 404);
}

#[tokio::test]
async fn test_join_full_lobby_is_lobby_full() {
    let c = coordinator();
    let id = create(&c).await;
    let join = |player: &str| {
        json!({
            "type": "lobby_action",
            "id": id,
            "action": "join",
            "playerIdentifier": player
        })
    };
    call(&c, join("0xguest")).await;

    let response = call(&c, join("0xlate")).await;
    assert_error(&response, "lobby_full", 409);
}

#[tokio::test]
async fn test_unknown_action_is_bad_request() {
    let c = coordinator();
    let response = call(&c, json!({ "type": "lobby_action", "id": "X", "action": "kick" })).await;
    assert_error(&response, "bad_request", 400);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let c = coordinator();
    let raw = c.handle_json(b"{not json").await;
    let response: Value = serde_json::from_slice(&raw).unwrap();
    assert_error(&response, "bad_request", 400);
}

#[tokio::test]
async fn test_handle_typed_request_matches_json_dispatch() {
    let c = coordinator();
    let id = LobbyId::new(create(&c).await);

    let response = c.handle(ApiRequest::GetLobby { id: id.clone() }).await.unwrap();

    match response {
        ApiResponse::Lobby { lobby } => assert_eq!(lobby.id(), &id),
        other => panic!("expected lobby, got {other:?}"),
    }
}
