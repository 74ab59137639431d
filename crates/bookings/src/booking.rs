use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use standops_core::{
    AllocationError, AllocationResult, BookingId, InventoryItemId, Versioned,
};
use standops_events::Event;

/// Booking lifecycle.
///
/// Legal edges: `unconfirmed ↔ confirmed`, `confirmed → cancelled`.
/// `cancelled` is terminal. Only `confirmed` counts toward allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Unconfirmed,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Unconfirmed => "unconfirmed",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(self, to: BookingStatus) -> bool {
        matches!(
            (self, to),
            (BookingStatus::Unconfirmed, BookingStatus::Confirmed)
                | (BookingStatus::Confirmed, BookingStatus::Unconfirmed)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }

    pub fn transition_to(self, to: BookingStatus) -> AllocationResult<BookingStatus> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(AllocationError::invalid_transition(format!(
                "booking status {} -> {}",
                self.as_str(),
                to.as_str()
            )))
        }
    }
}

impl core::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive query window for date-scoped availability reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> AllocationResult<Self> {
        if from > to {
            return Err(AllocationError::validation("window from must not exceed to"));
        }
        Ok(Self { from, to })
    }

    pub fn from(&self) -> DateTime<Utc> {
        self.from
    }

    pub fn to(&self) -> DateTime<Utc> {
        self.to
    }
}

/// A booking: the reservation demand channel, holding one unit when confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    id: BookingId,
    item_id: InventoryItemId,
    status: BookingStatus,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    version: u64,
    updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        id: BookingId,
        item_id: InventoryItemId,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> AllocationResult<Self> {
        if starts_at > ends_at {
            return Err(AllocationError::validation(
                "booking starts_at must not exceed ends_at",
            ));
        }

        Ok(Self {
            id,
            item_id,
            status: BookingStatus::Unconfirmed,
            starts_at,
            ends_at,
            version: 1,
            updated_at: created_at,
        })
    }

    pub fn item_id(&self) -> InventoryItemId {
        self.item_id
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// True if the booking's date range intersects `window` (inclusive ends).
    pub fn overlaps(&self, window: &DateWindow) -> bool {
        self.starts_at <= window.to() && window.from() <= self.ends_at
    }

    /// Decide the event for a command against the current state.
    ///
    /// This must not mutate state. State evolution is done through `apply`.
    pub fn handle(&self, command: &BookingCommand) -> AllocationResult<BookingEvent> {
        match command {
            BookingCommand::SetStatus {
                status,
                occurred_at,
            } => {
                let to = self.status.transition_to(*status)?;
                Ok(BookingEvent::StatusChanged(BookingStatusChanged {
                    booking_id: self.id,
                    item_id: self.item_id,
                    from: self.status,
                    to,
                    occurred_at: *occurred_at,
                }))
            }
        }
    }

    /// Evolve state from a decided event.
    pub fn apply(&mut self, event: &BookingEvent) {
        match event {
            BookingEvent::StatusChanged(e) => {
                self.status = e.to;
                self.updated_at = e.occurred_at;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }
}

impl Versioned for Booking {
    type Id = BookingId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: request a booking status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingCommand {
    SetStatus {
        status: BookingStatus,
        occurred_at: DateTime<Utc>,
    },
}

/// Event: the booking lifecycle moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingStatusChanged {
    pub booking_id: BookingId,
    pub item_id: InventoryItemId,
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingEvent {
    StatusChanged(BookingStatusChanged),
}

impl Event for BookingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BookingEvent::StatusChanged(_) => "booking.status_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            BookingEvent::StatusChanged(e) => e.occurred_at,
        }
    }
}
