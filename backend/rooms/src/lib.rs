//! # Rooms
//!
//! Shared domain types and the room-inventory rules behind bookings.
//!
//! ## Inventory
//!
//! - Each kos has `total_rooms` and an `available_rooms` counter
//! - Accepting a booking takes one room, rejecting an accepted booking gives it back
//! - Pending bookings hold nothing, so the counter only moves on those two rules
//! - `total_rooms - available_rooms` is always the number of accepted bookings
//!
//! ## Calendar
//!
//! - One row per (kos, day) that has at least one accepted booking covering it
//! - A stay covers `[start_date, end_date)`, checkout day is free again
//! - A day can never hold more accepted bookings than the kos has rooms
//!
//! Nothing in here touches the store. The server applies these rules inside a
//! single transaction so the counter and calendar move together.

pub mod booking;
pub mod error;
pub mod models;
pub mod stay;
pub mod validate;

pub use booking::{RoomChange, Rooms, plan_transition};
pub use error::RoomsError;
pub use models::{BookingStatus, Gender, Role};
pub use stay::Stay;
