//! Middleware layers shipped with the crate.
//!
//! | Layer | Wrapper | Purpose |
//! |-------|---------|---------|
//! | [`RetryLayer`] | [`Retry`] | Retry [`FsError::Transient`](crate::FsError::Transient) failures with backoff |
//! | [`TracingLayer`] | [`Traced`] | Log every operation through `tracing` |
//!
//! Backends never retry on their own; wrap them in [`RetryLayer`] to opt in.

mod retry;
mod traced;

pub use retry::{Retry, RetryLayer, RetryPolicy};
pub use traced::{Traced, TracingLayer};
