use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::RoomsError, stay::Stay};

macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = RoomsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(RoomsError::UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum!(Role, "role", {
    Owner => "owner",
    Society => "society",
});

string_enum!(Gender, "gender", {
    Male => "male",
    Female => "female",
    All => "all",
});

string_enum!(BookingStatus, "booking status", {
    Pending => "pending",
    Accept => "accept",
    Reject => "reject",
});

impl BookingStatus {
    /// Statuses that hold a room or may still take one.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Accept)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kos {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub address: String,
    pub description: String,
    pub price_per_month: i64,
    pub gender: Gender,
    pub total_rooms: u32,
    pub available_rooms: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    pub id: i64,
    pub kos_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: i64,
    pub kos_id: i64,
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub kos_id: i64,
    pub user_id: i64,
    pub rating: u8,
    pub comment: String,
    pub reply: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub kos_id: i64,
    pub user_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Stored bookings were validated on the way in, so only the ordering is rechecked.
    pub fn stay(&self) -> Result<Stay, RoomsError> {
        Stay::new(self.start_date, self.end_date, u32::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub day: NaiveDate,
    pub booked: u32,
    pub free: u32,
}

/// Incoming kos fields, shared by create and update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KosDraft {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub description: String,
    pub price_per_month: i64,
    pub gender: Gender,
    pub total_rooms: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewDraft {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_statuses_case_insensitively() {
        assert_eq!("accept".parse::<BookingStatus>(), Ok(BookingStatus::Accept));
        assert_eq!(" Reject ".parse::<BookingStatus>(), Ok(BookingStatus::Reject));
        assert_eq!("PENDING".parse::<BookingStatus>(), Ok(BookingStatus::Pending));
    }

    #[test]
    fn rejects_unknown_variants() {
        let err = "approved".parse::<BookingStatus>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown booking status 'approved'");
        assert!("landlord".parse::<Role>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"female\"");
        let role: Role = serde_json::from_str("\"society\"").unwrap();
        assert_eq!(role, Role::Society);
    }

    #[test]
    fn active_statuses() {
        assert!(BookingStatus::Pending.is_active());
        assert!(BookingStatus::Accept.is_active());
        assert!(!BookingStatus::Reject.is_active());
    }
}
