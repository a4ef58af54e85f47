//! Wire types shared between the minesweeper server and its clients.

pub mod models;
pub mod protocol;
