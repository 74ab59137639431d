//! Item Ledger: static capacity per inventory item.
//!
//! Pure domain logic only. Capacity is set by inventory management (out of
//! scope here) and is read-only from the allocation engine's perspective.

pub mod item;

pub use item::{InventoryItem, ItemDisplayTag, derive_display_tag};
