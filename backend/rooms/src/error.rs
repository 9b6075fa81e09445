use chrono::NaiveDate;
use thiserror::Error;

use crate::models::BookingStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomsError {
    #[error("No rooms available")]
    NoRoomsAvailable,

    #[error("All rooms are booked on {0}")]
    DayFullyBooked(NaiveDate),

    #[error("Booking is already {0}")]
    AlreadyInStatus(BookingStatus),

    #[error("Booking cannot be moved back to pending")]
    BackToPending,

    #[error("No occupied room to release")]
    NothingToRelease,

    #[error("Total rooms cannot drop below the {occupied} occupied rooms")]
    ShrinkBelowOccupied { occupied: u32 },

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}

impl RoomsError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        RoomsError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
