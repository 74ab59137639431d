use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use standops_core::{
    AllocationError, AllocationResult, InventoryItemId, OrderId, Versioned,
};
use standops_events::Event;

use crate::status::{OrderStatus, PaymentStatus};

/// One demand row of an order: a quantity against a single inventory item.
///
/// Lines belong to exactly one order (composition); several lines of the same
/// order may reference the same item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    pub item_id: InventoryItemId,
    pub quantity: i64,
}

/// A direct order: one of the two demand channels competing for capacity.
///
/// Orders are created by external intake flows in `pending`/`pending` state
/// and are mutated only through the transition manager. They are never
/// physically deleted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    status: OrderStatus,
    payment_status: PaymentStatus,
    lines: Vec<OrderLine>,
    version: u64,
    updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        id: OrderId,
        lines: Vec<OrderLine>,
        created_at: DateTime<Utc>,
    ) -> AllocationResult<Self> {
        for line in &lines {
            if line.quantity <= 0 {
                return Err(AllocationError::validation(format!(
                    "line {} quantity must be positive",
                    line.line_no
                )));
            }
        }

        Ok(Self {
            id,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            lines,
            version: 1,
            updated_at: created_at,
        })
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Distinct items referenced by this order's lines, in sorted order.
    pub fn item_ids(&self) -> Vec<InventoryItemId> {
        let mut ids: Vec<_> = self.lines.iter().map(|l| l.item_id).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Total quantity this order demands from `item_id` across all lines.
    pub fn quantity_for(&self, item_id: InventoryItemId) -> i64 {
        self.lines
            .iter()
            .filter(|l| l.item_id == item_id)
            .map(|l| l.quantity)
            .sum()
    }

    /// Decide the event for a command against the current state.
    ///
    /// This must not mutate state. State evolution is done through `apply`.
    pub fn handle(&self, command: &OrderCommand) -> AllocationResult<OrderEvent> {
        match command {
            OrderCommand::SetStatus {
                status,
                occurred_at,
            } => {
                let to = self.status.transition_to(*status)?;
                // A fully settled approval is terminal: reversing it would
                // require a refund flow, which lives outside this engine.
                if self.status == OrderStatus::Approved
                    && self.payment_status == PaymentStatus::Finished
                {
                    return Err(AllocationError::invalid_transition(format!(
                        "order status approved+finished -> {}",
                        to.as_str()
                    )));
                }
                Ok(OrderEvent::StatusChanged(StatusChanged {
                    order_id: self.id,
                    from: self.status,
                    to,
                    occurred_at: *occurred_at,
                }))
            }
            OrderCommand::SetPaymentStatus {
                payment_status,
                occurred_at,
            } => {
                let to = self.payment_status.transition_to(*payment_status)?;
                Ok(OrderEvent::PaymentStatusChanged(PaymentStatusChanged {
                    order_id: self.id,
                    from: self.payment_status,
                    to,
                    occurred_at: *occurred_at,
                }))
            }
        }
    }

    /// Evolve state from a decided event.
    pub fn apply(&mut self, event: &OrderEvent) {
        match event {
            OrderEvent::StatusChanged(e) => {
                self.status = e.to;
                self.updated_at = e.occurred_at;
            }
            OrderEvent::PaymentStatusChanged(e) => {
                self.payment_status = e.to;
                self.updated_at = e.occurred_at;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }
}

impl Versioned for Order {
    type Id = OrderId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: request a status or payment-status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    SetStatus {
        status: OrderStatus,
        occurred_at: DateTime<Utc>,
    },
    SetPaymentStatus {
        payment_status: PaymentStatus,
        occurred_at: DateTime<Utc>,
    },
}

/// Event: the approval lifecycle moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: payment progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusChanged {
    pub order_id: OrderId,
    pub from: PaymentStatus,
    pub to: PaymentStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    StatusChanged(StatusChanged),
    PaymentStatusChanged(PaymentStatusChanged),
}

impl OrderEvent {
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderEvent::StatusChanged(e) => e.order_id,
            OrderEvent::PaymentStatusChanged(e) => e.order_id,
        }
    }
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::StatusChanged(_) => "order.status_changed",
            OrderEvent::PaymentStatusChanged(_) => "order.payment_status_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::StatusChanged(e) => e.occurred_at,
            OrderEvent::PaymentStatusChanged(e) => e.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_line(item_id: InventoryItemId, quantity: i64) -> OrderLine {
        OrderLine {
            line_no: 1,
            item_id,
            quantity,
        }
    }

    fn test_order(quantity: i64) -> Order {
        Order::new(
            OrderId::new(),
            vec![test_line(InventoryItemId::new(), quantity)],
            Utc::now(),
        )
        .unwrap()
    }

    fn set_status(status: OrderStatus) -> OrderCommand {
        OrderCommand::SetStatus {
            status,
            occurred_at: Utc::now(),
        }
    }

    fn set_payment(payment_status: PaymentStatus) -> OrderCommand {
        OrderCommand::SetPaymentStatus {
            payment_status,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn rejects_non_positive_line_quantity() {
        let err = Order::new(
            OrderId::new(),
            vec![test_line(InventoryItemId::new(), 0)],
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, AllocationError::Validation(_)));
    }

    #[test]
    fn new_order_is_pending_pending() {
        let order = test_order(3);
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.payment_status(), PaymentStatus::Pending);
        assert_eq!(order.version(), 1);
    }

    #[test]
    fn approval_emits_status_changed() {
        let order = test_order(3);
        let event = order.handle(&set_status(OrderStatus::Approved)).unwrap();
        match event {
            OrderEvent::StatusChanged(e) => {
                assert_eq!(e.from, OrderStatus::Pending);
                assert_eq!(e.to, OrderStatus::Approved);
            }
            _ => panic!("expected StatusChanged event"),
        }
    }

    #[test]
    fn apply_moves_status_and_bumps_version() {
        let mut order = test_order(3);
        let event = order.handle(&set_status(OrderStatus::Approved)).unwrap();
        order.apply(&event);
        assert_eq!(order.status(), OrderStatus::Approved);
        assert_eq!(order.version(), 2);
    }

    #[test]
    fn approving_an_approved_order_is_invalid() {
        let mut order = test_order(3);
        let event = order.handle(&set_status(OrderStatus::Approved)).unwrap();
        order.apply(&event);

        let err = order
            .handle(&set_status(OrderStatus::Approved))
            .unwrap_err();
        assert!(matches!(err, AllocationError::InvalidTransition(_)));
    }

    #[test]
    fn approved_order_can_be_rejected_while_unsettled() {
        let mut order = test_order(3);
        let event = order.handle(&set_status(OrderStatus::Approved)).unwrap();
        order.apply(&event);

        let event = order.handle(&set_status(OrderStatus::Rejected)).unwrap();
        order.apply(&event);
        assert_eq!(order.status(), OrderStatus::Rejected);
    }

    #[test]
    fn settled_approval_cannot_be_rejected() {
        let mut order = test_order(3);
        let event = order.handle(&set_status(OrderStatus::Approved)).unwrap();
        order.apply(&event);
        let event = order.handle(&set_payment(PaymentStatus::Finished)).unwrap();
        order.apply(&event);

        let err = order
            .handle(&set_status(OrderStatus::Rejected))
            .unwrap_err();
        assert!(matches!(err, AllocationError::InvalidTransition(_)));
        assert_eq!(order.status(), OrderStatus::Approved);
    }

    #[test]
    fn payment_backward_is_invalid() {
        let mut order = test_order(3);
        let event = order.handle(&set_payment(PaymentStatus::Finished)).unwrap();
        order.apply(&event);

        let err = order
            .handle(&set_payment(PaymentStatus::Pending))
            .unwrap_err();
        assert!(matches!(err, AllocationError::InvalidTransition(_)));
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let order = test_order(3);
        let before = order.clone();

        let e1 = order.handle(&set_status(OrderStatus::Approved)).unwrap();
        let e2 = order.handle(&set_status(OrderStatus::Approved)).unwrap();

        assert_eq!(order, before);
        // Same state + same command → same decision, modulo timestamps.
        match (e1, e2) {
            (OrderEvent::StatusChanged(a), OrderEvent::StatusChanged(b)) => {
                assert_eq!(a.from, b.from);
                assert_eq!(a.to, b.to);
            }
            _ => panic!("expected StatusChanged events"),
        }
    }

    #[test]
    fn item_ids_are_sorted_and_distinct() {
        let shared = InventoryItemId::new();
        let other = InventoryItemId::new();
        let order = Order::new(
            OrderId::new(),
            vec![
                OrderLine { line_no: 1, item_id: shared, quantity: 2 },
                OrderLine { line_no: 2, item_id: other, quantity: 1 },
                OrderLine { line_no: 3, item_id: shared, quantity: 4 },
            ],
            Utc::now(),
        )
        .unwrap();

        let ids = order.item_ids();
        assert_eq!(ids.len(), 2);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(order.quantity_for(shared), 6);
        assert_eq!(order.quantity_for(other), 1);
    }
}
