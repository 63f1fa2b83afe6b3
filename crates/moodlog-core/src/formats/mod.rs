//! # Formats Module
//!
//! On-disk and export representations of the mood store.

mod persistence;

pub use persistence::*;
