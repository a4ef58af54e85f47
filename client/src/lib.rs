//! Minesweeper Client Library
//!
//! HTTP client for the minesweeper engine server. Every call maps to one
//! endpoint and returns the board in its serialized form.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use minesweeper_client::{
//!     Action, AgentKind, GameParams, MinesweeperClient, PlayAgentRequest, StepRequest,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let client = MinesweeperClient::new("http://localhost:8000")?;
//!
//!     let game = client.new_game(&GameParams::default()).await?;
//!     let state = client
//!         .step(&game.game_id, &StepRequest { action: Action::Reveal, row: 4, col: 4 })
//!         .await?;
//!     println!("Game over: {}, Won: {}", state.game_over, state.won);
//!
//!     let request = PlayAgentRequest {
//!         agent: AgentKind::BasicDeduction,
//!         ..Default::default()
//!     };
//!     let run = client.play_agent(Some(&game.game_id), &request).await?;
//!     println!("Agent played {} passes", run.frames.len());
//!
//!     client.delete_game(&game.game_id).await?;
//!     Ok(())
//! }
//! ```

mod client;

pub use client::MinesweeperClient;

// Re-export common types for convenience
pub use minesweeper_common::{models::*, protocol::*};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
