//! Inbound event model, outbound message model and the messenger port.

pub mod outbound;
pub mod port;
pub mod types;
