use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::models::{Cell, GameParams};

/// Externally visible board: row-major cell markers plus the game outcome.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    pub board: Vec<Vec<Cell>>,
    pub game_over: bool,
    pub won: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    #[serde(rename = "reveal")]
    Reveal,
    #[serde(rename = "flag")]
    Flag,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRequest {
    pub action: Action,
    pub row: usize,
    pub col: usize,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AgentKind {
    #[default]
    #[serde(rename = "basic")]
    BasicDeduction,
    #[serde(rename = "random")]
    Random,
}

impl AgentKind {
    pub const NAMES: [&'static str; 2] = ["basic", "random"];

    pub const fn name(self) -> &'static str {
        match self {
            AgentKind::BasicDeduction => "basic",
            AgentKind::Random => "random",
        }
    }
}

impl FromStr for AgentKind {
    type Err = String;

    /// Identifiers are matched case-insensitively; `basic_deduction` is
    /// accepted for `basic`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" | "basic_deduction" => Ok(AgentKind::BasicDeduction),
            "random" => Ok(AgentKind::Random),
            _ => Err(format!("unknown agent {s:?}")),
        }
    }
}

impl<'de> Deserialize<'de> for AgentKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse()
            .map_err(|_| de::Error::unknown_variant(&name, &AgentKind::NAMES))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PlayAgentRequest {
    pub agent: AgentKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Board used when no game id is given and a fresh game is created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<GameParams>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentMove {
    #[serde(rename = "type")]
    pub action: Action,
    pub row: usize,
    pub col: usize,
}

/// One deduction pass of an agent and the board it produced.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub action: Vec<AgentMove>,
    pub state: BoardState,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlayAgentResponse {
    pub game_id: String,
    pub frames: Vec<Frame>,
    #[serde(rename = "final")]
    pub final_state: BoardState,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NewGameResponse {
    pub game_id: String,
    #[serde(flatten)]
    pub state: BoardState,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}
