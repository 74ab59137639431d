//! Status transition manager.
//!
//! Orchestrates the full transition pipeline: load the record, decide the
//! event with pure domain logic, run the capacity check for
//! capacity-consuming transitions, persist with an optimistic version check,
//! invalidate affected snapshots, and publish the committed event.
//!
//! ```text
//! Request
//!   ↓
//! 1. Resolve record (NotFound if missing)
//!   ↓
//! 2. Acquire per-item locks (capacity-consuming transitions only)
//!   ↓
//! 3. Re-read fresh state, decide event (pure, no mutation)
//!   ↓
//! 4. Capacity check against fresh demand (approval/confirmation only)
//!   ↓
//! 5. Conditional persist (version check → ConcurrentModification)
//!   ↓
//! 6. Invalidate snapshots for affected items, publish event
//! ```
//!
//! Either steps 3-5 all commit or nothing is persisted. Queries never take
//! the per-item locks.

use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use standops_allocation::compute;
use standops_bookings::{Booking, BookingCommand, BookingEvent, BookingStatus};
use standops_core::{
    AllocationError, AllocationResult, BookingId, ExpectedVersion, InventoryItemId, OrderId,
    Versioned,
};
use standops_events::{Event, EventBus};
use standops_orders::{Order, OrderCommand, OrderEvent, OrderStatus, PaymentStatus};

use crate::ledger::AllocationLedger;
use crate::store::{BookingStore, ItemStore, OrderStore};

/// Committed transition notification, published after persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEvent {
    Order(OrderEvent),
    Booking(BookingEvent),
}

impl Event for TransitionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TransitionEvent::Order(e) => e.event_type(),
            TransitionEvent::Booking(e) => e.event_type(),
        }
    }

    fn version(&self) -> u32 {
        match self {
            TransitionEvent::Order(e) => Event::version(e),
            TransitionEvent::Booking(e) => Event::version(e),
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            TransitionEvent::Order(e) => e.occurred_at(),
            TransitionEvent::Booking(e) => e.occurred_at(),
        }
    }
}

/// Engine tunables.
#[derive(Debug, Clone, Copy)]
pub struct TransitionManagerConfig {
    /// Bound on waiting for per-item locks before the transition fails with
    /// `ConcurrentModification`. Retrying is a caller concern.
    pub lock_wait: Duration,
}

impl Default for TransitionManagerConfig {
    fn default() -> Self {
        Self {
            lock_wait: Duration::from_millis(200),
        }
    }
}

/// Per-item exclusive locks serializing capacity-consuming transitions.
///
/// Acquisition is all-or-wait under a single registry mutex, so there is no
/// lock-order inversion between concurrent multi-item approvals. Callers
/// pass item ids sorted and deduplicated.
#[derive(Debug, Default)]
struct ItemLockRegistry {
    held: Mutex<HashSet<InventoryItemId>>,
    released: Condvar,
}

struct ItemLockGuard<'a> {
    registry: &'a ItemLockRegistry,
    item_ids: Vec<InventoryItemId>,
}

impl ItemLockRegistry {
    fn acquire(
        &self,
        item_ids: &[InventoryItemId],
        wait: Duration,
    ) -> AllocationResult<ItemLockGuard<'_>> {
        let deadline = Instant::now() + wait;
        let mut held = self
            .held
            .lock()
            .map_err(|_| AllocationError::concurrent("item lock registry poisoned"))?;

        loop {
            if item_ids.iter().all(|id| !held.contains(id)) {
                held.extend(item_ids.iter().copied());
                return Ok(ItemLockGuard {
                    registry: self,
                    item_ids: item_ids.to_vec(),
                });
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(AllocationError::concurrent(
                    "timed out waiting for item locks",
                ));
            }

            let (guard, _) = self
                .released
                .wait_timeout(held, deadline - now)
                .map_err(|_| AllocationError::concurrent("item lock registry poisoned"))?;
            held = guard;
        }
    }
}

impl Drop for ItemLockGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut held) = self.registry.held.lock() {
            for id in &self.item_ids {
                held.remove(id);
            }
        }
        self.registry.released.notify_all();
    }
}

/// Validates and applies status changes to orders and bookings, keeping the
/// allocation ledger consistent.
#[derive(Debug)]
pub struct TransitionManager<I, O, B, E> {
    items: I,
    orders: O,
    bookings: B,
    ledger: Arc<AllocationLedger<I, O, B>>,
    bus: E,
    locks: ItemLockRegistry,
    config: TransitionManagerConfig,
}

impl<I, O, B, E> TransitionManager<I, O, B, E>
where
    I: ItemStore,
    O: OrderStore,
    B: BookingStore,
    E: EventBus<TransitionEvent>,
{
    pub fn new(
        items: I,
        orders: O,
        bookings: B,
        ledger: Arc<AllocationLedger<I, O, B>>,
        bus: E,
    ) -> Self {
        Self::with_config(
            items,
            orders,
            bookings,
            ledger,
            bus,
            TransitionManagerConfig::default(),
        )
    }

    pub fn with_config(
        items: I,
        orders: O,
        bookings: B,
        ledger: Arc<AllocationLedger<I, O, B>>,
        bus: E,
        config: TransitionManagerConfig,
    ) -> Self {
        Self {
            items,
            orders,
            bookings,
            ledger,
            bus,
            locks: ItemLockRegistry::default(),
            config,
        }
    }

    /// The allocation view kept consistent by this manager.
    pub fn ledger(&self) -> &AllocationLedger<I, O, B> {
        &self.ledger
    }

    /// Approve a pending order, consuming capacity for every item its lines
    /// reference. Rejected outright with `Overcommitted` if any item lacks
    /// headroom.
    pub fn request_order_approval(&self, order_id: OrderId) -> AllocationResult<()> {
        self.apply_order_status(order_id, OrderStatus::Approved)
    }

    /// Reject an order, releasing whatever it held.
    pub fn request_order_rejection(&self, order_id: OrderId) -> AllocationResult<()> {
        self.apply_order_status(order_id, OrderStatus::Rejected)
    }

    /// Apply an order status change per the transition table.
    pub fn apply_order_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> AllocationResult<()> {
        let order = self.orders.get(order_id).ok_or(AllocationError::NotFound)?;
        let item_ids = order.item_ids();

        // Only approval consumes capacity; other edges rely on the
        // version-checked persist alone.
        let _guard = if new_status == OrderStatus::Approved {
            Some(self.locks.acquire(&item_ids, self.config.lock_wait)?)
        } else {
            None
        };

        // Fresh read under the locks; the first read only named the items.
        let order = self.orders.get(order_id).ok_or(AllocationError::NotFound)?;
        let expected = ExpectedVersion::Exact(order.version());

        let event = order.handle(&OrderCommand::SetStatus {
            status: new_status,
            occurred_at: Utc::now(),
        })?;

        if new_status == OrderStatus::Approved {
            self.check_order_capacity(&order)?;
        }

        let mut updated = order;
        updated.apply(&event);
        self.orders.persist(updated, expected)?;

        self.ledger.invalidate(&item_ids);
        tracing::info!(
            order_id = %order_id,
            status = new_status.as_str(),
            "order status committed"
        );
        self.publish(TransitionEvent::Order(event));
        Ok(())
    }

    /// Apply a payment status change. Moves quantity between the reserved and
    /// sold buckets without growing the committed total, so there is no
    /// capacity check and it cannot fail `Overcommitted`.
    pub fn request_payment_status_change(
        &self,
        order_id: OrderId,
        new_payment_status: PaymentStatus,
    ) -> AllocationResult<()> {
        let order = self.orders.get(order_id).ok_or(AllocationError::NotFound)?;
        let expected = ExpectedVersion::Exact(order.version());
        let item_ids = order.item_ids();

        let event = order.handle(&OrderCommand::SetPaymentStatus {
            payment_status: new_payment_status,
            occurred_at: Utc::now(),
        })?;

        let mut updated = order;
        updated.apply(&event);
        self.orders.persist(updated, expected)?;

        self.ledger.invalidate(&item_ids);
        tracing::info!(
            order_id = %order_id,
            payment_status = new_payment_status.as_str(),
            "payment status committed"
        );
        self.publish(TransitionEvent::Order(event));
        Ok(())
    }

    /// Confirm a booking, consuming one unit of its item. Subject to the same
    /// capacity check as order approval.
    pub fn request_booking_confirmation(&self, booking_id: BookingId) -> AllocationResult<()> {
        self.apply_booking_status(booking_id, BookingStatus::Confirmed)
    }

    /// Cancel a confirmed booking (terminal), releasing its hold.
    pub fn request_booking_cancellation(&self, booking_id: BookingId) -> AllocationResult<()> {
        self.apply_booking_status(booking_id, BookingStatus::Cancelled)
    }

    /// Walk a confirmed booking back to unconfirmed, releasing its hold.
    pub fn request_booking_release(&self, booking_id: BookingId) -> AllocationResult<()> {
        self.apply_booking_status(booking_id, BookingStatus::Unconfirmed)
    }

    /// Apply a booking status change per the transition table.
    pub fn apply_booking_status(
        &self,
        booking_id: BookingId,
        new_status: BookingStatus,
    ) -> AllocationResult<()> {
        let booking = self
            .bookings
            .get(booking_id)
            .ok_or(AllocationError::NotFound)?;
        let item_id = booking.item_id();

        let _guard = if new_status == BookingStatus::Confirmed {
            Some(self.locks.acquire(&[item_id], self.config.lock_wait)?)
        } else {
            None
        };

        let booking = self
            .bookings
            .get(booking_id)
            .ok_or(AllocationError::NotFound)?;
        let expected = ExpectedVersion::Exact(booking.version());

        let event = booking.handle(&BookingCommand::SetStatus {
            status: new_status,
            occurred_at: Utc::now(),
        })?;

        if new_status == BookingStatus::Confirmed {
            self.check_booking_capacity(&booking)?;
        }

        let mut updated = booking;
        updated.apply(&event);
        self.bookings.persist(updated, expected)?;

        self.ledger.invalidate(&[item_id]);
        tracing::info!(
            booking_id = %booking_id,
            status = new_status.as_str(),
            "booking status committed"
        );
        self.publish(TransitionEvent::Booking(event));
        Ok(())
    }

    /// Would approving `order` overcommit any item its lines reference?
    ///
    /// Computed from fresh reads excluding the candidate order itself (it is
    /// still pending, but excluding by id keeps the check correct even if a
    /// store returns it mid-flight). Flat booking policy: confirmed bookings
    /// hold a unit regardless of dates.
    fn check_order_capacity(&self, order: &Order) -> AllocationResult<()> {
        for item_id in order.item_ids() {
            let item = self.items.get(item_id).ok_or(AllocationError::NotFound)?;
            let other_orders: Vec<Order> = self
                .orders
                .list_for_item(item_id)
                .into_iter()
                .filter(|o| o.id() != order.id())
                .collect();
            let bookings = self.bookings.list_for_item(item_id);

            let snapshot = compute(&item, &other_orders, &bookings, None);
            let requested = order.quantity_for(item_id);
            if !snapshot.fits(requested) {
                return Err(AllocationError::Overcommitted {
                    item_id,
                    requested,
                    available: snapshot.headroom(),
                });
            }
        }
        Ok(())
    }

    fn check_booking_capacity(&self, booking: &Booking) -> AllocationResult<()> {
        let item_id = booking.item_id();
        let item = self.items.get(item_id).ok_or(AllocationError::NotFound)?;
        let orders = self.orders.list_for_item(item_id);
        let other_bookings: Vec<Booking> = self
            .bookings
            .list_for_item(item_id)
            .into_iter()
            .filter(|b| b.id() != booking.id())
            .collect();

        let snapshot = compute(&item, &orders, &other_bookings, None);
        if !snapshot.fits(1) {
            return Err(AllocationError::Overcommitted {
                item_id,
                requested: 1,
                available: snapshot.headroom(),
            });
        }
        Ok(())
    }

    /// Best-effort notification; state is already persisted, and consumers
    /// are idempotent, so a failed publish is logged rather than surfaced.
    fn publish(&self, event: TransitionEvent) {
        if let Err(e) = self.bus.publish(event) {
            tracing::warn!(error = ?e, "failed to publish transition event");
        }
    }
}
