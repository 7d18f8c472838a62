//! # InferenceIQ Core
//!
//! Domain types, traits, and error definitions for InferenceIQ.
//! This crate holds no I/O or SDK code. It defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Providers are defined as traits here; concrete SDK bindings live in
//! `inferenceiq-providers`. The recorder and the metrics engine only ever see
//! the [`InteractionRecord`] and the [`ResponseAdapter`] capability.

pub mod error;
pub mod fingerprint;
pub mod message;
pub mod provider;
pub mod record;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, StoreError};
pub use fingerprint::fingerprint;
pub use message::{Message, Role};
pub use provider::{
    BoxedResponse, Provider, ProviderRequest, ProviderResponse, ResponseAdapter, Usage,
};
pub use record::{CANONICAL_FIELDS, InteractionRecord, Outcome, Timestamp};
