pub mod board;
pub mod classify;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fetch;
pub mod infra;
pub mod normalize;
pub mod output;
pub mod parser;
pub mod raw;
pub mod services;
pub mod time;
