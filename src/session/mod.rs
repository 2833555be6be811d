//! Session binding and URL resolution subsystem.
//!
//! # Data Flow
//! ```text
//! request with ?__base=<url>
//!     → binder.rs (origin prefix = directory of <url>)
//!     → store.rs (token → origin, expires in ttl)
//!     → cookie.rs (Set-Cookie: proxy-base-url=<token>)
//!
//! later request without __base
//!     → cookie.rs (read token)
//!     → store.rs (lookup, lazily expire)
//!     → binder.rs (join path+query onto origin)
//! ```
//!
//! # Design Decisions
//! - Store is injected; the in-memory implementation uses an injectable clock
//! - Expiry is evaluated at lookup time; the sweeper is housekeeping only
//! - Concurrent binds for the same token are last-write-wins

pub mod binder;
pub mod cookie;
pub mod store;
pub mod sweeper;

pub use binder::{BaseSource, Binding, SessionBinder, SessionError};
pub use store::{Clock, ManualClock, MemorySessionStore, SessionStore, SystemClock};
pub use sweeper::SessionSweeper;
