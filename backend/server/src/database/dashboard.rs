use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate};
use rooms::{BookingStatus, models::User};
use rusqlite::{Connection, params};
use serde::Serialize;

use super::{
    bookings::{self, BookingFilter, BookingView},
    kos::round_rating,
};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: u32,
    pub accept: u32,
    pub reject: u32,
}

impl StatusCounts {
    fn add(&mut self, status: BookingStatus, count: u32) {
        match status {
            BookingStatus::Pending => self.pending += count,
            BookingStatus::Accept => self.accept += count,
            BookingStatus::Reject => self.reject += count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub month: String,
    pub bookings: u32,
    pub accepted: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerDashboard {
    pub kos: u32,
    pub total_rooms: u32,
    pub occupied_rooms: u32,
    pub available_rooms: u32,
    pub bookings: StatusCounts,
    pub likes: u32,
    pub reviews: u32,
    pub average_rating: Option<f64>,
    pub monthly: Vec<MonthCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SocietyDashboard {
    pub bookings: StatusCounts,
    pub liked: u32,
    pub reviews: u32,
    pub current_stays: Vec<BookingView>,
    pub upcoming_stays: Vec<BookingView>,
}

fn status_counts(conn: &Connection, sql: &str, id: i64) -> Result<StatusCounts, AppError> {
    let mut counts = StatusCounts::default();
    let mut stmt = conn.prepare_cached(sql)?;

    let rows = stmt.query_map([id], |row| {
        Ok((super::parsed::<BookingStatus>(row, 0)?, row.get::<_, u32>(1)?))
    })?;

    for row in rows {
        let (status, count) = row?;
        counts.add(status, count);
    }

    Ok(counts)
}

/// `YYYY-MM` keys of the twelve months ending with the month of `today`, oldest first.
fn last_twelve_months(today: NaiveDate) -> Vec<String> {
    let first = today.with_day0(0).unwrap_or(today);

    (0..12)
        .rev()
        .filter_map(|back| first.checked_sub_months(Months::new(back)))
        .map(|month| month.format("%Y-%m").to_string())
        .collect()
}

pub fn owner(
    conn: &Connection,
    owner_id: i64,
    today: NaiveDate,
) -> Result<OwnerDashboard, AppError> {
    let (kos, total_rooms, available_rooms): (u32, u32, u32) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(total_rooms), 0), COALESCE(SUM(available_rooms), 0)
         FROM kos WHERE owner_id = ?1",
        [owner_id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    let bookings = status_counts(
        conn,
        "SELECT b.status, COUNT(*) FROM bookings b JOIN kos k ON k.id = b.kos_id
         WHERE k.owner_id = ?1 GROUP BY b.status",
        owner_id,
    )?;

    let likes = conn.query_row(
        "SELECT COUNT(*) FROM likes l JOIN kos k ON k.id = l.kos_id WHERE k.owner_id = ?1",
        [owner_id],
        |row| row.get(0),
    )?;

    let (reviews, average_rating): (u32, Option<f64>) = conn.query_row(
        "SELECT COUNT(*), AVG(r.rating) FROM reviews r JOIN kos k ON k.id = r.kos_id
         WHERE k.owner_id = ?1",
        [owner_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    // First day of the month eleven months back, so the current month makes twelve.
    let since = today
        .with_day0(0)
        .and_then(|first| first.checked_sub_months(Months::new(11)))
        .unwrap_or(today);

    let mut stmt = conn.prepare_cached(
        "SELECT substr(b.created_at, 1, 7) AS month, COUNT(*),
                SUM(CASE WHEN b.status = 'accept' THEN 1 ELSE 0 END)
         FROM bookings b JOIN kos k ON k.id = b.kos_id
         WHERE k.owner_id = ?1 AND substr(b.created_at, 1, 10) >= ?2
         GROUP BY month ORDER BY month",
    )?;
    let mut counts = stmt
        .query_map(params![owner_id, since], |row| {
            Ok((row.get::<_, String>(0)?, (row.get(1)?, row.get(2)?)))
        })?
        .collect::<Result<HashMap<String, (u32, u32)>, _>>()?;

    let monthly = last_twelve_months(today)
        .into_iter()
        .map(|month| {
            let (bookings, accepted) = counts.remove(&month).unwrap_or_default();

            MonthCount {
                month,
                bookings,
                accepted,
            }
        })
        .collect();

    Ok(OwnerDashboard {
        kos,
        total_rooms,
        occupied_rooms: total_rooms.saturating_sub(available_rooms),
        available_rooms,
        bookings,
        likes,
        reviews,
        average_rating: average_rating.map(round_rating),
        monthly,
    })
}

pub fn society(
    conn: &Connection,
    user: &User,
    today: NaiveDate,
) -> Result<SocietyDashboard, AppError> {
    let bookings = status_counts(
        conn,
        "SELECT status, COUNT(*) FROM bookings WHERE user_id = ?1 GROUP BY status",
        user.id,
    )?;

    let liked = conn.query_row("SELECT COUNT(*) FROM likes WHERE user_id = ?1", [user.id], |row| {
        row.get(0)
    })?;

    let reviews = conn.query_row(
        "SELECT COUNT(*) FROM reviews WHERE user_id = ?1",
        [user.id],
        |row| row.get(0),
    )?;

    let filter = BookingFilter {
        status: Some(BookingStatus::Accept),
        ..Default::default()
    };
    let (current_stays, upcoming_stays): (Vec<_>, Vec<_>) = bookings::list(conn, user, &filter)?
        .into_iter()
        .filter(|view| view.booking.end_date > today)
        .partition(|view| view.booking.stay().is_ok_and(|stay| stay.contains(today)));

    Ok(SocietyDashboard {
        bookings,
        liked,
        reviews,
        current_stays,
        upcoming_stays,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_status() {
        let mut counts = StatusCounts::default();
        counts.add(BookingStatus::Accept, 2);
        counts.add(BookingStatus::Pending, 1);
        counts.add(BookingStatus::Accept, 1);

        assert_eq!(
            counts,
            StatusCounts {
                pending: 1,
                accept: 3,
                reject: 0
            }
        );
    }

    #[test]
    fn twelve_months_across_a_year_boundary() {
        let months = last_twelve_months(NaiveDate::from_ymd_opt(2026, 2, 17).unwrap());

        assert_eq!(months.len(), 12);
        assert_eq!(months[0], "2025-03");
        assert_eq!(months[10], "2026-01");
        assert_eq!(months[11], "2026-02");
    }
}
