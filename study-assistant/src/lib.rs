// Library root: re-exports all modules so integration tests and the `bonsai`
// binary can access the crate's public API.

pub mod api;
pub mod app;
pub mod auth;
pub mod chat;
pub mod config;
pub mod protocol;
pub mod router;
pub mod scoreboard;
pub mod session;
pub mod storage;
pub mod tui;
