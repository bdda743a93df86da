//! Telegram bot that relays user questions to the Gemini API and logs
//! requests to SQLite. Consumed by two binaries: the plain poller
//! (`src/main.rs`) and the poller-plus-health-endpoint service
//! (`src/bin/service.rs`).

pub mod bot;
pub mod config;
pub mod gemini;
pub mod health;
pub mod store;
