//! Backend API access: transport port, retrying client and request payloads.

pub mod client;
pub mod payload;
pub mod transport;

pub use client::{BackendClient, RetryPolicy};
pub use transport::{BackendRequest, HttpResponse, HttpTransport, Method, TransportError};
