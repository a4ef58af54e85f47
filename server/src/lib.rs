pub mod agent;
pub mod cleanup;
pub mod cors;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod logic;
pub mod rate_limit;
pub mod registry;
pub mod routes;
