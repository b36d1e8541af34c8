//! Umbrella core library: manifest types, loading and subtree selection.
//!
//! - [`types`]: newtypes and domain structs
//! - [`error`]: [`ManifestError`]
//! - [`manifest`]: load / discover root / select

pub mod error;
pub mod manifest;
pub mod types;

pub use error::ManifestError;
pub use types::{Manifest, Subtree, SubtreeName, SubtreeSpec};
