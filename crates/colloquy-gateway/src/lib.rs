//! HTTP front end: session lifecycle routes and the SSE event stream.

pub mod error;
pub mod server;
pub mod sse;

pub use error::ApiError;
pub use server::{AppState, GatewayServer};
