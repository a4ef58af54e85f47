use minesweeper_common::models::Pos;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("position {0} is outside the board")]
    OutOfBounds(Pos),
    #[error("invalid action: {0}")]
    InvalidAction(&'static str),
    #[error("unknown game: {0}")]
    UnknownGame(String),
    #[error("invalid game parameters: {0}")]
    InvalidParams(String),
}

pub type Result<T> = std::result::Result<T, GameError>;
