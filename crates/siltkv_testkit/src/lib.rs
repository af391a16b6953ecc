//! # siltkv Testkit
//!
//! Test utilities for siltkv.
//!
//! This crate provides:
//! - Test fixtures and store helpers for both engines
//! - Property-based test generators using proptest
//! - A model-checked integration harness and reusable scenarios
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust
//! use siltkv_testkit::prelude::*;
//!
//! with_each_engine(|engine, store| {
//!     seed(store, &[("k", "v")]);
//!     let mut txn = store.begin().unwrap();
//!     assert_eq!(txn.get(b"k").unwrap(), b"v", "{engine}");
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use stress::*;
