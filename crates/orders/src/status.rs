use serde::{Deserialize, Serialize};

use standops_core::{AllocationError, AllocationResult};

/// Order approval lifecycle.
///
/// Legal edges: `pending → approved`, `pending → rejected`,
/// `approved → rejected` (reversal). Nothing leaves `rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Approved,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
        }
    }

    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        matches!(
            (self, to),
            (OrderStatus::Pending, OrderStatus::Approved)
                | (OrderStatus::Pending, OrderStatus::Rejected)
                | (OrderStatus::Approved, OrderStatus::Rejected)
        )
    }

    pub fn transition_to(self, to: OrderStatus) -> AllocationResult<OrderStatus> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(AllocationError::invalid_transition(format!(
                "order status {} -> {}",
                self.as_str(),
                to.as_str()
            )))
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment progress, independent of the approval lifecycle.
///
/// Legal edges: `pending → partially_pending → finished` and the direct
/// `pending → finished` jump. Payment never moves backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    PartiallyPending,
    Finished,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::PartiallyPending => "partially_pending",
            PaymentStatus::Finished => "finished",
        }
    }

    /// True once payment has progressed past "pending"; the committed
    /// quantity then counts as sold rather than reserved.
    pub fn is_settling(self) -> bool {
        matches!(
            self,
            PaymentStatus::PartiallyPending | PaymentStatus::Finished
        )
    }

    pub fn can_transition_to(self, to: PaymentStatus) -> bool {
        matches!(
            (self, to),
            (PaymentStatus::Pending, PaymentStatus::PartiallyPending)
                | (PaymentStatus::Pending, PaymentStatus::Finished)
                | (PaymentStatus::PartiallyPending, PaymentStatus::Finished)
        )
    }

    pub fn transition_to(self, to: PaymentStatus) -> AllocationResult<PaymentStatus> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(AllocationError::invalid_transition(format!(
                "payment status {} -> {}",
                self.as_str(),
                to.as_str()
            )))
        }
    }
}

impl core::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    static ORDER_STATUSES: [OrderStatus; 3] = [
        OrderStatus::Pending,
        OrderStatus::Approved,
        OrderStatus::Rejected,
    ];

    static PAYMENT_STATUSES: [PaymentStatus; 3] = [
        PaymentStatus::Pending,
        PaymentStatus::PartiallyPending,
        PaymentStatus::Finished,
    ];

    #[test]
    fn pending_order_can_be_approved_or_rejected() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Approved));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Rejected));
    }

    #[test]
    fn approval_can_be_reversed() {
        assert!(OrderStatus::Approved.can_transition_to(OrderStatus::Rejected));
    }

    #[test]
    fn nothing_leaves_rejected() {
        for to in ORDER_STATUSES {
            assert!(!OrderStatus::Rejected.can_transition_to(to));
        }
    }

    #[test]
    fn illegal_order_edge_reports_invalid_transition() {
        let err = OrderStatus::Rejected
            .transition_to(OrderStatus::Pending)
            .unwrap_err();
        assert!(matches!(err, AllocationError::InvalidTransition(_)));
    }

    #[test]
    fn payment_moves_forward_including_direct_jump() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::PartiallyPending));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Finished));
        assert!(PaymentStatus::PartiallyPending.can_transition_to(PaymentStatus::Finished));
    }

    #[test]
    fn payment_never_moves_backward() {
        assert!(!PaymentStatus::Finished.can_transition_to(PaymentStatus::Pending));
        assert!(!PaymentStatus::Finished.can_transition_to(PaymentStatus::PartiallyPending));
        assert!(!PaymentStatus::PartiallyPending.can_transition_to(PaymentStatus::Pending));
    }

    fn order_status() -> impl Strategy<Value = OrderStatus> {
        proptest::sample::select(&ORDER_STATUSES[..])
    }

    fn payment_status() -> impl Strategy<Value = PaymentStatus> {
        proptest::sample::select(&PAYMENT_STATUSES[..])
    }

    proptest! {
        #[test]
        fn no_self_edges(s in order_status()) {
            prop_assert!(!s.can_transition_to(s));
        }

        #[test]
        fn order_edges_are_antisymmetric(a in order_status(), b in order_status()) {
            // The table is a DAG; no pair of states is mutually reachable.
            prop_assert!(!(a.can_transition_to(b) && b.can_transition_to(a)));
        }

        #[test]
        fn payment_is_monotone(a in payment_status(), b in payment_status()) {
            // Encode progress as rank; edges only ever increase it.
            fn rank(s: PaymentStatus) -> u8 {
                match s {
                    PaymentStatus::Pending => 0,
                    PaymentStatus::PartiallyPending => 1,
                    PaymentStatus::Finished => 2,
                }
            }
            if a.can_transition_to(b) {
                prop_assert!(rank(b) > rank(a));
            }
        }
    }
}
