// Library root: re-exports all modules so integration tests and external
// consumers can access the crate's public API.

pub mod app;
pub mod auth;
pub mod board;
pub mod chat;
pub mod config;
pub mod db;
pub mod export;
pub mod protocol;
pub mod remote;
pub mod tui;
