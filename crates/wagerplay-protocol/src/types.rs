//! Identity types and the question record.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable participant identifier, usually a wallet address.
///
/// Wallet connection happens outside this system; whatever string the
/// wallet layer hands over is used verbatim. The newtype keeps a player
/// id from being confused with a lobby id even though both are strings.
///
/// `#[serde(transparent)]` serializes `PlayerId("0xabc")` as `"0xabc"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` when the identifier is empty or only whitespace.
    ///
    /// Blank ids are rejected at the request boundary; a lobby never
    /// stores one.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A short, human-shareable lobby identifier.
///
/// The lobby id doubles as the invite token players pass around out of
/// band, and later as the session id of the materialized game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LobbyId(String);

impl LobbyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LobbyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LobbyId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// Question
// ---------------------------------------------------------------------------

/// One word-guessing prompt.
///
/// A guess is correct when it contains `main_term`; it is void when it
/// contains any entry of `forbidden_terms`. Both checks are
/// case-insensitive and live in the turn engine, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// The target word or phrase.
    pub main_term: String,
    /// Clue text shown to the guesser.
    pub prompt: String,
    /// Terms that invalidate a submission regardless of correctness.
    pub forbidden_terms: Vec<String>,
    /// Category tag used for topic-filtered selection.
    pub topic: String,
}
