use std::collections::HashMap;
use std::sync::RwLock;

use standops_bookings::Booking;
use standops_core::{
    AllocationError, AllocationResult, BookingId, ExpectedVersion, InventoryItemId, OrderId,
    Versioned,
};
use standops_inventory::InventoryItem;
use standops_orders::Order;

use super::{BookingStore, ItemStore, OrderStore};

/// In-memory item ledger.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    items: RwLock<HashMap<InventoryItemId, InventoryItem>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ItemStore for InMemoryItemStore {
    fn get(&self, id: InventoryItemId) -> Option<InventoryItem> {
        let map = self.items.read().ok()?;
        map.get(&id).cloned()
    }

    fn list(&self) -> Vec<InventoryItem> {
        match self.items.read() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    fn upsert(&self, item: InventoryItem) {
        if let Ok(mut map) = self.items.write() {
            map.insert(item.id(), item);
        }
    }
}

/// In-memory order store with version-checked writes.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderStore for InMemoryOrderStore {
    fn get(&self, id: OrderId) -> Option<Order> {
        let map = self.orders.read().ok()?;
        map.get(&id).cloned()
    }

    fn list(&self) -> Vec<Order> {
        match self.orders.read() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    fn list_for_item(&self, item_id: InventoryItemId) -> Vec<Order> {
        match self.orders.read() {
            Ok(map) => map
                .values()
                .filter(|o| o.lines().iter().any(|l| l.item_id == item_id))
                .cloned()
                .collect(),
            Err(_) => vec![],
        }
    }

    fn insert(&self, order: Order) -> AllocationResult<()> {
        let mut map = self
            .orders
            .write()
            .map_err(|_| AllocationError::concurrent("order store lock poisoned"))?;

        if map.contains_key(&order.id()) {
            return Err(AllocationError::validation(format!(
                "order {} already exists",
                order.id()
            )));
        }
        map.insert(order.id(), order);
        Ok(())
    }

    fn persist(&self, order: Order, expected: ExpectedVersion) -> AllocationResult<()> {
        let mut map = self
            .orders
            .write()
            .map_err(|_| AllocationError::concurrent("order store lock poisoned"))?;

        let current = map.get(&order.id()).ok_or(AllocationError::NotFound)?;
        expected.check(current.version())?;

        map.insert(order.id(), order);
        Ok(())
    }
}

/// In-memory booking store with version-checked writes.
#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    bookings: RwLock<HashMap<BookingId, Booking>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookingStore for InMemoryBookingStore {
    fn get(&self, id: BookingId) -> Option<Booking> {
        let map = self.bookings.read().ok()?;
        map.get(&id).cloned()
    }

    fn list(&self) -> Vec<Booking> {
        match self.bookings.read() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    fn list_for_item(&self, item_id: InventoryItemId) -> Vec<Booking> {
        match self.bookings.read() {
            Ok(map) => map
                .values()
                .filter(|b| b.item_id() == item_id)
                .cloned()
                .collect(),
            Err(_) => vec![],
        }
    }

    fn insert(&self, booking: Booking) -> AllocationResult<()> {
        let mut map = self
            .bookings
            .write()
            .map_err(|_| AllocationError::concurrent("booking store lock poisoned"))?;

        if map.contains_key(&booking.id()) {
            return Err(AllocationError::validation(format!(
                "booking {} already exists",
                booking.id()
            )));
        }
        map.insert(booking.id(), booking);
        Ok(())
    }

    fn persist(&self, booking: Booking, expected: ExpectedVersion) -> AllocationResult<()> {
        let mut map = self
            .bookings
            .write()
            .map_err(|_| AllocationError::concurrent("booking store lock poisoned"))?;

        let current = map.get(&booking.id()).ok_or(AllocationError::NotFound)?;
        expected.check(current.version())?;

        map.insert(booking.id(), booking);
        Ok(())
    }
}
