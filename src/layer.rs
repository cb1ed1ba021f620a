//! # Layer Trait
//!
//! Tower-style middleware composition for filesystem backends.
//!
//! ## Overview
//!
//! A [`Layer`] wraps a backend to add behaviour such as retries or logging
//! without the backend knowing:
//!
//! ```text
//! Backend ──▶ Layer::layer() ──▶ Wrapped Backend
//! ```
//!
//! Each middleware provides:
//! 1. A wrapper struct that implements the filesystem traits
//! 2. A `Layer` implementation that creates the wrapper
//!
//! ## Fluent Composition
//!
//! ```rust
//! use urifs::{LayerExt, MemoryFs, RetryLayer, TracingLayer};
//!
//! let fs = MemoryFs::new()
//!     .layer(RetryLayer::default())
//!     .layer(TracingLayer::new("store"));
//! # let _ = fs;
//! ```

use crate::FileSystem;

/// A layer that wraps a backend to add functionality.
///
/// # Design Notes
///
/// - `layer(self, backend)` consumes both the layer and backend
/// - Wrappers keep the inner backend's scheme, so qualification is unchanged
pub trait Layer<B> {
    /// The resulting backend type after applying this layer.
    type Backend;

    /// Wrap the given backend with this layer's functionality.
    fn layer(self, backend: B) -> Self::Backend;
}

/// Extension trait for fluent layer composition.
///
/// Provides the `.layer()` method on any [`FileSystem`] backend.
pub trait LayerExt: FileSystem + Sized {
    /// Apply a layer to this backend.
    fn layer<L: Layer<Self>>(self, layer: L) -> L::Backend {
        layer.layer(self)
    }
}

// Blanket implementation - any FileSystem backend gets LayerExt for free
impl<B: FileSystem> LayerExt for B {}
