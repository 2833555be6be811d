//! Fetch-and-respond subsystem.
//!
//! # Data Flow
//! ```text
//! axum handler
//!     → request.rs (path+query reference, base param, session cookie)
//!     → orchestrator.rs (bind / resolve / fetch / dispatch)
//!     → response.rs (status, Content-Type, body)
//! ```
//!
//! # Design Decisions
//! - Resolution and fetch failures end the request (400 or 500)
//! - Transform failures never do; the original body is returned instead
//! - Nothing is retried

pub mod error;
pub mod orchestrator;
pub mod request;
pub mod response;

pub use error::ProxyError;
pub use orchestrator::Orchestrator;
pub use request::ProxyRequest;
