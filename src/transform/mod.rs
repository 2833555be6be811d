//! Image transform subsystem.
//!
//! # Data Flow
//! ```text
//! upstream body + Content-Type
//!     → codec.rs (closed content-type → decoder mapping)
//!     → engine.rs (decode into an RGBA raster, pixel limit check)
//!     → invert.rs (R,G,B = MAX - value; alpha untouched)
//!     → engine.rs (PNG encode)
//!     → TransformOutcome::Transformed | TransformOutcome::PassThrough
//! ```
//!
//! # Design Decisions
//! - Output is always PNG regardless of the source format
//! - The whole body is buffered; there is no streaming transform
//! - Failures never surface to the client, they select the pass-through variant

pub mod codec;
pub mod engine;
pub mod error;
pub mod invert;

pub use codec::{ImageCodec, OUTPUT_CONTENT_TYPE};
pub use engine::{ImageTransformer, TransformOutcome};
pub use error::TransformError;
