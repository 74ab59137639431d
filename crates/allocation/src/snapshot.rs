use serde::{Deserialize, Serialize};

use standops_bookings::{Booking, BookingStatus, DateWindow};
use standops_core::{InventoryItemId, Versioned};
use standops_inventory::InventoryItem;
use standops_orders::{Order, OrderStatus};

/// Derived availability for one inventory item.
///
/// A snapshot is a disposable cache value, never a source of truth: it is
/// recomputed from the demand records on every invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationSnapshot {
    pub item_id: InventoryItemId,
    pub capacity: i64,
    /// Units held by approved-but-unpaid orders and confirmed bookings.
    pub reserved: i64,
    /// Units held by approved orders whose payment progressed past pending.
    pub sold: i64,
    /// Capacity minus committed, floored at zero.
    pub available: i64,
    /// True when the raw computation went negative (tolerated on reads,
    /// rejected on writes).
    pub overcommitted: bool,
}

impl AllocationSnapshot {
    /// Total units committed to demand.
    pub fn committed(&self) -> i64 {
        self.reserved + self.sold
    }

    /// True headroom, un-floored. Negative when overcommitted.
    pub fn headroom(&self) -> i64 {
        self.capacity - self.committed()
    }

    /// Whether `additional` more units fit without exceeding capacity.
    ///
    /// This is the write-path check: no floor-at-zero leniency here.
    pub fn fits(&self, additional: i64) -> bool {
        self.headroom() >= additional
    }
}

/// Derive the allocation snapshot for `item` from the demand records
/// referencing it.
///
/// Pure and idempotent: same inputs, same snapshot; no writes.
///
/// Booking policy: with `window = None` every confirmed booking holds one
/// unit regardless of dates (the flat policy used for running totals and all
/// capacity checks). With a window, only confirmed bookings overlapping it
/// count: the explicit date-scoped read.
pub fn compute(
    item: &InventoryItem,
    orders: &[Order],
    bookings: &[Booking],
    window: Option<&DateWindow>,
) -> AllocationSnapshot {
    let item_id = item.id();
    let mut reserved = 0i64;
    let mut sold = 0i64;

    for order in orders {
        if order.status() != OrderStatus::Approved {
            continue;
        }
        let quantity = order.quantity_for(item_id);
        if quantity == 0 {
            continue;
        }
        if order.payment_status().is_settling() {
            sold += quantity;
        } else {
            reserved += quantity;
        }
    }

    for booking in bookings {
        if booking.item_id() != item_id || booking.status() != BookingStatus::Confirmed {
            continue;
        }
        if window.is_none_or(|w| booking.overlaps(w)) {
            reserved += 1;
        }
    }

    let capacity = item.capacity();
    let raw_available = capacity - reserved - sold;
    let overcommitted = raw_available < 0;
    if overcommitted {
        tracing::warn!(
            item_id = %item_id,
            capacity,
            reserved,
            sold,
            "item overcommitted; flooring available at zero"
        );
    }

    AllocationSnapshot {
        item_id,
        capacity,
        reserved,
        sold,
        available: raw_available.max(0),
        overcommitted,
    }
}
