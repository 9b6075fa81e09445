use serde::Serialize;

use crate::{error::RoomsError, models::BookingStatus};

/// What a status change does to the room counter and calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomChange {
    Reserve,
    Release,
    Keep,
}

/// The two manual rules: anything becoming `accept` takes a room, an
/// accepted booking becoming `reject` gives it back.
pub fn plan_transition(from: BookingStatus, to: BookingStatus) -> Result<RoomChange, RoomsError> {
    use BookingStatus::*;

    match (from, to) {
        (from, to) if from == to => Err(RoomsError::AlreadyInStatus(to)),
        (_, Pending) => Err(RoomsError::BackToPending),
        (_, Accept) => Ok(RoomChange::Reserve),
        (Accept, Reject) => Ok(RoomChange::Release),
        (_, Reject) => Ok(RoomChange::Keep),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rooms {
    total: u32,
    available: u32,
}

impl Rooms {
    pub fn new(total: u32, available: u32) -> Result<Self, RoomsError> {
        if available > total {
            return Err(RoomsError::invalid(
                "available_rooms",
                format!("{available} exceeds total of {total}"),
            ));
        }

        Ok(Self { total, available })
    }

    /// A freshly listed kos has every room free.
    pub fn empty(total: u32) -> Self {
        Self {
            total,
            available: total,
        }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn available(&self) -> u32 {
        self.available
    }

    pub fn occupied(&self) -> u32 {
        self.total - self.available
    }

    pub fn is_full(&self) -> bool {
        self.available == 0
    }

    pub fn reserve(&mut self) -> Result<(), RoomsError> {
        if self.available == 0 {
            return Err(RoomsError::NoRoomsAvailable);
        }

        self.available -= 1;
        Ok(())
    }

    pub fn release(&mut self) -> Result<(), RoomsError> {
        if self.available == self.total {
            return Err(RoomsError::NothingToRelease);
        }

        self.available += 1;
        Ok(())
    }

    pub fn apply(&mut self, change: RoomChange) -> Result<(), RoomsError> {
        match change {
            RoomChange::Reserve => self.reserve(),
            RoomChange::Release => self.release(),
            RoomChange::Keep => Ok(()),
        }
    }

    /// Occupied rooms stay occupied, only the free pool grows or shrinks.
    pub fn resize(&self, new_total: u32) -> Result<Self, RoomsError> {
        if new_total == 0 {
            return Err(RoomsError::invalid("total_rooms", "must be at least 1"));
        }

        let occupied = self.occupied();
        if new_total < occupied {
            return Err(RoomsError::ShrinkBelowOccupied { occupied });
        }

        Ok(Self {
            total: new_total,
            available: new_total - occupied,
        })
    }

    /// Rebuilds the counter from the number of accepted bookings.
    pub fn from_accepted(total: u32, accepted: u32) -> Self {
        Self {
            total,
            available: total.saturating_sub(accepted),
        }
    }
}

/// Calendar guard for one day of a stay about to be accepted.
pub fn check_day_capacity(
    day: chrono::NaiveDate,
    booked: u32,
    total_rooms: u32,
) -> Result<(), RoomsError> {
    if booked >= total_rooms {
        return Err(RoomsError::DayFullyBooked(day));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::BookingStatus::*;

    #[test]
    fn accepting_reserves_a_room() {
        assert_eq!(plan_transition(Pending, Accept), Ok(RoomChange::Reserve));
        assert_eq!(plan_transition(Reject, Accept), Ok(RoomChange::Reserve));
    }

    #[test]
    fn rejecting_only_releases_accepted_bookings() {
        assert_eq!(plan_transition(Accept, Reject), Ok(RoomChange::Release));
        assert_eq!(plan_transition(Pending, Reject), Ok(RoomChange::Keep));
    }

    #[test]
    fn refuses_repeats_and_pending() {
        assert_eq!(
            plan_transition(Accept, Accept),
            Err(RoomsError::AlreadyInStatus(Accept))
        );
        assert_eq!(
            plan_transition(Pending, Pending),
            Err(RoomsError::AlreadyInStatus(Pending))
        );
        assert_eq!(plan_transition(Accept, Pending), Err(RoomsError::BackToPending));
        assert_eq!(plan_transition(Reject, Pending), Err(RoomsError::BackToPending));
    }

    #[test]
    fn reserve_stops_at_zero() {
        let mut rooms = Rooms::empty(2);
        rooms.reserve().unwrap();
        rooms.reserve().unwrap();

        assert!(rooms.is_full());
        assert_eq!(rooms.reserve(), Err(RoomsError::NoRoomsAvailable));
        assert_eq!(rooms.available(), 0);
    }

    #[test]
    fn release_never_exceeds_total() {
        let mut rooms = Rooms::new(3, 2).unwrap();
        rooms.release().unwrap();

        assert_eq!(rooms.available(), 3);
        assert_eq!(rooms.release(), Err(RoomsError::NothingToRelease));
    }

    #[test]
    fn apply_follows_the_plan() {
        let mut rooms = Rooms::empty(1);
        rooms.apply(RoomChange::Keep).unwrap();
        assert_eq!(rooms.available(), 1);

        rooms.apply(RoomChange::Reserve).unwrap();
        assert_eq!(rooms.occupied(), 1);

        rooms.apply(RoomChange::Release).unwrap();
        assert_eq!(rooms.occupied(), 0);
    }

    #[test]
    fn new_rejects_available_over_total() {
        assert!(Rooms::new(2, 3).is_err());
    }

    #[test]
    fn resize_keeps_occupied_rooms() {
        let rooms = Rooms::new(5, 2).unwrap();

        let grown = rooms.resize(8).unwrap();
        assert_eq!((grown.total(), grown.available()), (8, 5));

        let shrunk = rooms.resize(3).unwrap();
        assert_eq!((shrunk.total(), shrunk.available()), (3, 0));

        assert_eq!(
            rooms.resize(2),
            Err(RoomsError::ShrinkBelowOccupied { occupied: 3 })
        );
        assert!(rooms.resize(0).is_err());
    }

    #[test]
    fn rebuild_from_accepted_saturates() {
        assert_eq!(Rooms::from_accepted(4, 1).available(), 3);
        assert_eq!(Rooms::from_accepted(2, 5).available(), 0);
    }

    #[test]
    fn day_capacity() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        assert!(check_day_capacity(day, 1, 2).is_ok());
        assert_eq!(
            check_day_capacity(day, 2, 2),
            Err(RoomsError::DayFullyBooked(day))
        );
    }
}
