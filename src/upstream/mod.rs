//! Upstream fetch subsystem.
//!
//! The proxy only depends on the [`Fetcher`] trait; [`ReqwestFetcher`] is the
//! production implementation and tests substitute their own.

pub mod fetch;

pub use fetch::{FetchError, FetchedResource, Fetcher, ReqwestFetcher};
