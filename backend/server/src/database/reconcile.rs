//! Rebuilds room counters and the calendar from accepted bookings.
//!
//! The transactional paths keep both in step, so drift only comes from writes
//! made outside the server (manual SQL, restored backups).
use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rooms::{Rooms, Stay};
use rusqlite::{Connection, TransactionBehavior, params};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drift {
    pub kos_id: i64,
    pub name: String,
    pub total_rooms: u32,
    pub accepted: u32,
    pub stored_available: u32,
    pub expected_available: u32,
    pub calendar_days_fixed: u32,
}

impl Drift {
    /// Accepted bookings beyond the room total, which no counter value can express.
    pub fn overbooked(&self) -> u32 {
        self.accepted.saturating_sub(self.total_rooms)
    }
}

fn expected_calendar(stays: &[Stay]) -> BTreeMap<NaiveDate, u32> {
    let mut days = BTreeMap::new();

    for stay in stays {
        for day in stay.days() {
            *days.entry(day).or_insert(0) += 1;
        }
    }

    days
}

fn differing_days(
    stored: &BTreeMap<NaiveDate, u32>,
    expected: &BTreeMap<NaiveDate, u32>,
) -> u32 {
    let days: BTreeSet<_> = stored.keys().chain(expected.keys()).collect();

    days.into_iter()
        .filter(|day| stored.get(*day) != expected.get(*day))
        .count() as u32
}

/// Reports every kos whose counter or calendar disagrees with its accepted
/// bookings, and every kos with more accepted bookings than rooms even when
/// its stored values already match. With `apply` the stored values are replaced.
pub fn reconcile(conn: &mut Connection, apply: bool) -> Result<Vec<Drift>, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let kos: Vec<(i64, String, u32, u32)> = tx
        .prepare("SELECT id, name, total_rooms, available_rooms FROM kos ORDER BY id")?
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
        .collect::<Result<_, _>>()?;

    let mut drifts = Vec::new();

    for (kos_id, name, total_rooms, stored_available) in kos {
        let stays = tx
            .prepare_cached(
                "SELECT start_date, end_date FROM bookings WHERE kos_id = ?1 AND status = 'accept'",
            )?
            .query_map([kos_id], |row| {
                Ok((row.get::<_, NaiveDate>(0)?, row.get::<_, NaiveDate>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|(start, end)| Stay::new(start, end, u32::MAX))
            .collect::<Result<Vec<_>, _>>()?;

        let stored: BTreeMap<NaiveDate, u32> = tx
            .prepare_cached("SELECT day, booked FROM booking_calendar WHERE kos_id = ?1")?
            .query_map([kos_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<_, _>>()?;

        let accepted = stays.len() as u32;
        let expected = Rooms::from_accepted(total_rooms, accepted);
        let calendar = expected_calendar(&stays);
        let calendar_days_fixed = differing_days(&stored, &calendar);

        if expected.available() == stored_available
            && calendar_days_fixed == 0
            && accepted <= total_rooms
        {
            continue;
        }

        let drift = Drift {
            kos_id,
            name,
            total_rooms,
            accepted,
            stored_available,
            expected_available: expected.available(),
            calendar_days_fixed,
        };

        warn!(
            kos_id,
            stored = stored_available,
            expected = expected.available(),
            calendar_days = calendar_days_fixed,
            overbooked = drift.overbooked(),
            "Inventory drift"
        );

        if apply {
            tx.execute(
                "UPDATE kos SET available_rooms = ?1 WHERE id = ?2",
                params![expected.available(), kos_id],
            )?;
            tx.execute("DELETE FROM booking_calendar WHERE kos_id = ?1", [kos_id])?;

            let mut insert = tx.prepare_cached(
                "INSERT INTO booking_calendar (kos_id, day, booked) VALUES (?1, ?2, ?3)",
            )?;
            for (day, booked) in &calendar {
                insert.execute(params![kos_id, day, booked])?;
            }
        }

        drifts.push(drift);
    }

    if apply {
        tx.commit()?;
        info!(fixed = drifts.len(), "Inventory reconciled");
    }

    Ok(drifts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn overlapping_stays_stack() {
        let stays = [
            Stay::new(date(1), date(3), 366).unwrap(),
            Stay::new(date(2), date(4), 366).unwrap(),
        ];
        let calendar = expected_calendar(&stays);

        assert_eq!(
            calendar.into_iter().collect::<Vec<_>>(),
            vec![(date(1), 1), (date(2), 2), (date(3), 1)]
        );
    }

    #[test]
    fn counts_missing_extra_and_wrong_days() {
        let stored = BTreeMap::from([(date(1), 1), (date(2), 1), (date(9), 1)]);
        let expected = BTreeMap::from([(date(1), 1), (date(2), 2), (date(3), 1)]);

        assert_eq!(differing_days(&stored, &expected), 3);
    }
}
