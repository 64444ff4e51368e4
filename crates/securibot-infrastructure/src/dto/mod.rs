//! Data Transfer Objects for the chat API wire format.
//!
//! These types mirror the JSON bodies exchanged with the remote service and are
//! converted to and from the domain model at the client boundary.

pub mod api;
pub mod message;

pub use api::*;
pub use message::{ApiChatMessage, format_timestamp, parse_timestamp, to_wire};
