//! Line protocol helpers shared by the `rawchat` client.
//!
//! Everything in this crate is pure: no sockets, no async, no logging.

pub mod command;
pub mod escape;
pub mod line;
