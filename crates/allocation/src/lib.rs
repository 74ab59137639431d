//! The allocation calculator: the single authoritative derivation of
//! `{reserved, sold, available}` per inventory item.
//!
//! Every consumer (transition manager, analytics, availability filters) goes
//! through [`compute`] so views cannot drift apart.

pub mod snapshot;

pub use snapshot::{AllocationSnapshot, compute};
