//! Transport-agnostic request/response records.
//!
//! Whatever carries the bytes (an HTTP handler, a queue consumer, a test)
//! hands them to [`Coordinator::handle_json`] and sends back what it
//! returns. The flow is:
//!   1. Decode an [`ApiRequest`] → malformed input is `bad_request`
//!   2. Check required fields → missing ones are rejected before the
//!      registry sees them
//!   3. Run the lobby operation
//!   4. Encode an [`ApiResponse`], errors included

use serde::{Deserialize, Serialize};
use wagerplay_lobby::{Lobby, LobbyStore};
use wagerplay_protocol::{Codec, GameConfig, LobbyId, PlayerId, ProtocolError};
use wagerplay_settlement::SettlementGateway;

use crate::{Coordinator, WagerError};

/// One call from a client.
///
/// ```json
/// {"type": "create_lobby", "hostIdentifier": "0xhost", "capacity": 2, "gameConfig": {..}}
/// {"type": "get_lobby", "id": "K7Q2M9XA"}
/// {"type": "lobby_action", "id": "K7Q2M9XA", "action": "join", "playerIdentifier": "0xguest"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiRequest {
    CreateLobby {
        #[serde(rename = "hostIdentifier", default)]
        host_identifier: Option<PlayerId>,
        capacity: usize,
        #[serde(rename = "gameConfig", default)]
        game_config: Option<GameConfig>,
    },
    GetLobby {
        id: LobbyId,
    },
    LobbyAction {
        id: LobbyId,
        action: LobbyAction,
        #[serde(rename = "playerIdentifier", default)]
        player_identifier: Option<PlayerId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LobbyAction {
    Join,
    Cancel,
}

/// The answer to an [`ApiRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiResponse {
    Lobby { lobby: Lobby },
    Cancelled { ok: bool },
    Error { code: String, status: u16, message: String },
}

impl From<&WagerError> for ApiResponse {
    fn from(err: &WagerError) -> Self {
        Self::Error {
            code: err.code().to_string(),
            status: err.status(),
            message: err.to_string(),
        }
    }
}

impl<S: LobbyStore, G: SettlementGateway> Coordinator<S, G> {
    /// Runs a decoded request.
    ///
    /// # Errors
    /// `invalid_config` when `hostIdentifier` or `gameConfig` is missing
    /// or the config is invalid, [`WagerError::BadRequest`] when a join
    /// has no `playerIdentifier`, and whatever the lobby operation
    /// reports.
    pub async fn handle(&self, request: ApiRequest) -> Result<ApiResponse, WagerError> {
        match request {
            ApiRequest::CreateLobby {
                host_identifier,
                capacity,
                game_config,
            } => {
                let host = host_identifier
                    .ok_or_else(|| ProtocolError::InvalidConfig("hostIdentifier is required".into()))?;
                let game_config = game_config
                    .ok_or_else(|| ProtocolError::InvalidConfig("gameConfig is required".into()))?;
                let lobby = self.create_lobby(host, capacity, game_config).await?;
                Ok(ApiResponse::Lobby { lobby })
            }
            ApiRequest::GetLobby { id } => {
                let lobby = self.get_lobby(&id).await?;
                Ok(ApiResponse::Lobby { lobby })
            }
            ApiRequest::LobbyAction {
                id,
                action: LobbyAction::Join,
                player_identifier,
            } => {
                let player = player_identifier
                    .ok_or_else(|| WagerError::BadRequest("playerIdentifier is required".into()))?;
                let lobby = self.join_lobby(&id, player).await?;
                Ok(ApiResponse::Lobby { lobby })
            }
            ApiRequest::LobbyAction {
                id,
                action: LobbyAction::Cancel,
                ..
            } => {
                self.cancel_lobby(&id).await?;
                Ok(ApiResponse::Cancelled { ok: true })
            }
        }
    }

    /// Decodes a JSON request, runs it, and encodes the response.
    ///
    /// Never fails: every rejection is encoded as an `error` response
    /// carrying its reason code.
    pub async fn handle_json(&self, body: &[u8]) -> Vec<u8> {
        let response = match self.codec.decode::<ApiRequest>(body) {
            Ok(request) => match self.handle(request).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!(code = e.code(), error = %e, "request rejected");
                    ApiResponse::from(&e)
                }
            },
            Err(e) => {
                let e = WagerError::from(e);
                tracing::debug!(error = %e, "failed to decode request");
                ApiResponse::from(&e)
            }
        };

        self.codec.encode(&response).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to encode response");
            br#"{"type":"error","code":"internal","status":500,"message":"encode failed"}"#.to_vec()
        })
    }
}
