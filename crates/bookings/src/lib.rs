//! Booking half of the demand record store.
//!
//! A confirmed booking holds one unit of its item. Pure domain logic only.

pub mod booking;

pub use booking::{
    Booking, BookingCommand, BookingEvent, BookingStatus, BookingStatusChanged, DateWindow,
};
