//! Per-day booking calendar.
//!
//! Only accepted stays are counted. Reserving checks every day of the stay
//! before writing any of them, so a full day refuses the whole stay.
use std::collections::HashMap;

use chrono::NaiveDate;
use rooms::{
    RoomsError, Stay,
    booking::check_day_capacity,
    models::{CalendarDay, Kos},
};
use rusqlite::{Connection, params};
use tracing::warn;

use crate::error::AppError;

pub const MAX_WINDOW_DAYS: u32 = 92;
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

pub fn booked_days(
    conn: &Connection,
    kos_id: i64,
    window: &Stay,
) -> Result<HashMap<NaiveDate, u32>, AppError> {
    let mut stmt = conn.prepare_cached(
        "SELECT day, booked FROM booking_calendar WHERE kos_id = ?1 AND day >= ?2 AND day < ?3",
    )?;

    let days = stmt
        .query_map(params![kos_id, window.start(), window.end()], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<Result<HashMap<_, _>, _>>()?;

    Ok(days)
}

pub fn reserve(
    conn: &Connection,
    kos_id: i64,
    total_rooms: u32,
    stay: &Stay,
) -> Result<(), AppError> {
    let booked = booked_days(conn, kos_id, stay)?;

    for day in stay.days() {
        check_day_capacity(day, booked.get(&day).copied().unwrap_or(0), total_rooms)?;
    }

    let mut stmt = conn.prepare_cached(
        "INSERT INTO booking_calendar (kos_id, day, booked) VALUES (?1, ?2, 1)
         ON CONFLICT (kos_id, day) DO UPDATE SET booked = booked + 1",
    )?;

    for day in stay.days() {
        stmt.execute(params![kos_id, day])?;
    }

    Ok(())
}

pub fn release(conn: &Connection, kos_id: i64, stay: &Stay) -> Result<(), AppError> {
    let mut decrement = conn.prepare_cached(
        "UPDATE booking_calendar SET booked = booked - 1
         WHERE kos_id = ?1 AND day = ?2 AND booked > 1",
    )?;
    let mut remove = conn.prepare_cached(
        "DELETE FROM booking_calendar WHERE kos_id = ?1 AND day = ?2 AND booked = 1",
    )?;

    let mut missing = 0;
    for day in stay.days() {
        let decremented = decrement.execute(params![kos_id, day])?;
        if decremented == 0 && remove.execute(params![kos_id, day])? == 0 {
            missing += 1;
        }
    }

    if missing > 0 {
        warn!(kos_id, missing, "Calendar had no entry for released days, run reconcile");
    }

    Ok(())
}

/// Validates a requested view window, `to` is inclusive.
pub fn window(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<Stay, AppError> {
    let start = from.unwrap_or(today);

    let Some(to) = to else {
        return Ok(Stay::window(start, DEFAULT_WINDOW_DAYS)?);
    };

    if to < start {
        return Err(RoomsError::invalid("to", format!("{to} is before {start}")).into());
    }

    let days = (to - start).num_days() + 1;
    if days > i64::from(MAX_WINDOW_DAYS) {
        return Err(RoomsError::invalid(
            "to",
            format!("window is limited to {MAX_WINDOW_DAYS} days"),
        )
        .into());
    }

    Ok(Stay::window(start, days as u32)?)
}

pub fn view(conn: &Connection, kos: &Kos, window: &Stay) -> Result<Vec<CalendarDay>, AppError> {
    let booked = booked_days(conn, kos.id, window)?;

    let days = window
        .days()
        .map(|day| {
            let booked = booked.get(&day).copied().unwrap_or(0);

            CalendarDay {
                day,
                booked,
                free: kos.total_rooms.saturating_sub(booked),
            }
        })
        .collect();

    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn default_window_is_thirty_days() {
        let window = window(None, None, date(2025, 5, 1)).unwrap();

        assert_eq!(window.start(), date(2025, 5, 1));
        assert_eq!(window.nights(), DEFAULT_WINDOW_DAYS);
    }

    #[test]
    fn inclusive_end() {
        let window =
            window(Some(date(2025, 5, 1)), Some(date(2025, 5, 3)), date(2025, 1, 1)).unwrap();

        assert_eq!(window.days().count(), 3);
    }

    #[test]
    fn rejects_long_or_reversed_windows() {
        let today = date(2025, 1, 1);

        assert!(window(Some(today), Some(date(2025, 6, 1)), today).is_err());
        assert!(window(Some(date(2025, 2, 1)), Some(today), today).is_err());
    }
}
