//! Request middleware.
//!
//! Currently only request tracing; authentication is handled per handler by
//! the session extractor.

pub mod trace;

pub use trace::Trace;
