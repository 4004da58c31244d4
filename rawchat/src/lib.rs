//! `rawchat` — raw line-protocol client for Twitch chat.

pub mod app;
pub mod config;
pub mod session;
pub mod transport;
