//! Persistence seams for the allocation engine.
//!
//! The engine consumes items, orders, and bookings through these traits and
//! relies on the conditional (version-checked) updates for its optimistic
//! concurrency discipline. The in-memory implementations are for tests/dev;
//! a database-backed implementation plugs in behind the same traits.

mod in_memory;

pub use in_memory::{InMemoryBookingStore, InMemoryItemStore, InMemoryOrderStore};

use std::sync::Arc;

use standops_bookings::Booking;
use standops_core::{AllocationResult, BookingId, ExpectedVersion, InventoryItemId, OrderId};
use standops_inventory::InventoryItem;
use standops_orders::Order;

/// Read access to the item ledger.
///
/// `upsert` exists for intake/seeding; the allocation engine itself never
/// writes items (capacity is immutable from its perspective).
pub trait ItemStore: Send + Sync {
    fn get(&self, id: InventoryItemId) -> Option<InventoryItem>;

    fn list(&self) -> Vec<InventoryItem>;

    fn upsert(&self, item: InventoryItem);
}

/// Order records with version-checked conditional updates.
pub trait OrderStore: Send + Sync {
    fn get(&self, id: OrderId) -> Option<Order>;

    fn list(&self) -> Vec<Order>;

    /// Orders with at least one line referencing `item_id`.
    fn list_for_item(&self, item_id: InventoryItemId) -> Vec<Order>;

    /// Register a new order (intake concern). Fails if the id is taken.
    fn insert(&self, order: Order) -> AllocationResult<()>;

    /// Persist an updated record iff the stored version still matches
    /// `expected`; otherwise fail with `ConcurrentModification`.
    fn persist(&self, order: Order, expected: ExpectedVersion) -> AllocationResult<()>;
}

/// Booking records with version-checked conditional updates.
pub trait BookingStore: Send + Sync {
    fn get(&self, id: BookingId) -> Option<Booking>;

    fn list(&self) -> Vec<Booking>;

    fn list_for_item(&self, item_id: InventoryItemId) -> Vec<Booking>;

    fn insert(&self, booking: Booking) -> AllocationResult<()>;

    fn persist(&self, booking: Booking, expected: ExpectedVersion) -> AllocationResult<()>;
}

impl<S> ItemStore for Arc<S>
where
    S: ItemStore + ?Sized,
{
    fn get(&self, id: InventoryItemId) -> Option<InventoryItem> {
        (**self).get(id)
    }

    fn list(&self) -> Vec<InventoryItem> {
        (**self).list()
    }

    fn upsert(&self, item: InventoryItem) {
        (**self).upsert(item)
    }
}

impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    fn get(&self, id: OrderId) -> Option<Order> {
        (**self).get(id)
    }

    fn list(&self) -> Vec<Order> {
        (**self).list()
    }

    fn list_for_item(&self, item_id: InventoryItemId) -> Vec<Order> {
        (**self).list_for_item(item_id)
    }

    fn insert(&self, order: Order) -> AllocationResult<()> {
        (**self).insert(order)
    }

    fn persist(&self, order: Order, expected: ExpectedVersion) -> AllocationResult<()> {
        (**self).persist(order, expected)
    }
}

impl<S> BookingStore for Arc<S>
where
    S: BookingStore + ?Sized,
{
    fn get(&self, id: BookingId) -> Option<Booking> {
        (**self).get(id)
    }

    fn list(&self) -> Vec<Booking> {
        (**self).list()
    }

    fn list_for_item(&self, item_id: InventoryItemId) -> Vec<Booking> {
        (**self).list_for_item(item_id)
    }

    fn insert(&self, booking: Booking) -> AllocationResult<()> {
        (**self).insert(booking)
    }

    fn persist(&self, booking: Booking, expected: ExpectedVersion) -> AllocationResult<()> {
        (**self).persist(booking, expected)
    }
}
