//! Infrastructure layer: stores, the transition manager, the snapshot cache,
//! and analytics rollups.

pub mod analytics;
pub mod engine;
pub mod ledger;
pub mod store;


pub use engine::{TransitionEvent, TransitionManager, TransitionManagerConfig};
pub use ledger::AllocationLedger;
pub use store::{
    BookingStore, InMemoryBookingStore, InMemoryItemStore, InMemoryOrderStore, ItemStore,
    OrderStore,
};
