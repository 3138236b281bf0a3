//! Metadata derivation for Needlework entities.
//!
//! Derived attributes are computed in two typed passes. Pass 1 reads one
//! entity at a time; pass 2 reads relationship targets and therefore only
//! accepts a [`Pass1Result`] covering the whole model. The raw
//! [`needlework_core::Entity`] is never mutated: callers look derived values
//! up in the [`DerivedModel`] by entity name.

pub mod cache;
pub mod derive;

pub use cache::{CACHE_ANCHOR, CacheEntry, cache_entries};
pub use derive::{
    DerivedEntityMetadata, DerivedModel, Pass1Metadata, Pass1Result, Pass2Metadata,
    TO_DTO_METHOD, derive, derive_model, derive_pass1, derive_pass2,
};
