//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → "/" without base param → landing.rs (static page)
//!     → anything else → proxy::Orchestrator
//!     → Send to client
//! ```

pub mod landing;
pub mod server;

pub use server::{AppState, HttpServer};
