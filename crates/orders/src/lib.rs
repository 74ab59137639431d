//! Order half of the demand record store.
//!
//! Business rules only: the status/payment-status state machines and the
//! pure decision logic for applying them. No IO, no storage.

pub mod order;
pub mod status;

pub use order::{
    Order, OrderCommand, OrderEvent, OrderLine, PaymentStatusChanged, StatusChanged,
};
pub use status::{OrderStatus, PaymentStatus};
