//! Booking lifecycle.
//!
//! Status changes are the only place the room counter moves. Each one runs in
//! a single `IMMEDIATE` transaction: plan the change, check the counter and the
//! calendar, write the counter with a compare-and-set on its old value, write
//! the calendar, then the booking. Any refusal rolls everything back.
use chrono::{NaiveDate, Utc};
use rooms::{
    BookingStatus, RoomChange, Role, Rooms, RoomsError, Stay, plan_transition,
    models::{Booking, User},
};
use rusqlite::{
    Connection, OptionalExtension, Row, TransactionBehavior, params, params_from_iter,
    types::Value,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{calendar, kos, parsed};
use crate::error::AppError;

const VIEW_SELECT: &str = "SELECT b.id, b.kos_id, b.user_id, b.start_date, b.end_date, b.status, \
    b.created_at, b.updated_at, k.name, k.owner_id, u.name \
    FROM bookings b JOIN kos k ON k.id = b.kos_id JOIN users u ON u.id = b.user_id";

fn from_row(row: &Row) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: row.get(0)?,
        kos_id: row.get(1)?,
        user_id: row.get(2)?,
        start_date: row.get(3)?,
        end_date: row.get(4)?,
        status: parsed(row, 5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Booking with the names a history page shows next to it.
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub kos_name: String,
    pub kos_owner_id: i64,
    pub user_name: String,
}

fn view_from_row(row: &Row) -> rusqlite::Result<BookingView> {
    Ok(BookingView {
        booking: from_row(row)?,
        kos_name: row.get(8)?,
        kos_owner_id: row.get(9)?,
        user_name: row.get(10)?,
    })
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NewBooking {
    pub kos_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub kos_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub booking: Booking,
    pub total_rooms: u32,
    pub available_rooms: u32,
}

pub fn find(conn: &Connection, id: i64) -> Result<Option<Booking>, AppError> {
    let booking = conn
        .query_row(
            "SELECT id, kos_id, user_id, start_date, end_date, status, created_at, updated_at
             FROM bookings WHERE id = ?1",
            [id],
            from_row,
        )
        .optional()?;

    Ok(booking)
}

/// Opens a pending booking. Fails early when the kos is already full, though
/// only acceptance actually takes a room.
pub fn create(
    conn: &mut Connection,
    user_id: i64,
    request: &NewBooking,
    max_stay_days: u32,
) -> Result<Booking, AppError> {
    let stay = Stay::new(request.start_date, request.end_date, max_stay_days)?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let kos = kos::require(&tx, request.kos_id)?;
    if Rooms::new(kos.total_rooms, kos.available_rooms)?.is_full() {
        warn!(kos_id = kos.id, user_id, "Booking refused, kos is full");
        return Err(RoomsError::NoRoomsAvailable.into());
    }

    let mut stmt = tx.prepare_cached(
        "SELECT start_date, end_date, status FROM bookings WHERE kos_id = ?1 AND user_id = ?2",
    )?;
    let held = stmt
        .query_map(params![kos.id, user_id], |row| {
            Ok((
                row.get::<_, NaiveDate>(0)?,
                row.get::<_, NaiveDate>(1)?,
                parsed::<BookingStatus>(row, 2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    drop(stmt);

    for (start, end, _) in held.into_iter().filter(|(.., status)| status.is_active()) {
        if Stay::new(start, end, u32::MAX)?.overlaps(&stay) {
            return Err(AppError::Conflict(format!(
                "You already have a booking here from {start} to {end}"
            )));
        }
    }

    let now = Utc::now();
    tx.execute(
        "INSERT INTO bookings
            (kos_id, user_id, start_date, end_date, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            kos.id,
            user_id,
            stay.start(),
            stay.end(),
            BookingStatus::Pending.as_str(),
            now,
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;

    info!(booking_id = id, kos_id = kos.id, user_id, nights = stay.nights(), "Booking requested");

    Ok(Booking {
        id,
        kos_id: kos.id,
        user_id,
        start_date: stay.start(),
        end_date: stay.end(),
        status: BookingStatus::Pending,
        created_at: now,
        updated_at: now,
    })
}

/// Applies an owner's decision, moving the room counter and calendar with it.
pub fn update_status(
    conn: &mut Connection,
    id: i64,
    owner_id: i64,
    to: BookingStatus,
) -> Result<StatusChange, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let booking = find(&tx, id)?.ok_or(AppError::NotFound("Booking"))?;
    let kos = kos::require_owned(&tx, booking.kos_id, owner_id)?;

    let change = plan_transition(booking.status, to)?;
    let mut rooms = Rooms::new(kos.total_rooms, kos.available_rooms)?;
    let stay = booking.stay()?;
    let now = Utc::now();

    if let Err(e) = rooms.apply(change) {
        warn!(booking_id = id, kos_id = kos.id, "Status change refused: {e}");
        return Err(e.into());
    }

    match change {
        RoomChange::Reserve => calendar::reserve(&tx, kos.id, kos.total_rooms, &stay)?,
        RoomChange::Release => calendar::release(&tx, kos.id, &stay)?,
        RoomChange::Keep => {}
    }

    if change != RoomChange::Keep {
        let changed = tx.execute(
            "UPDATE kos SET available_rooms = ?1, updated_at = ?2
             WHERE id = ?3 AND available_rooms = ?4 AND total_rooms = ?5",
            params![
                rooms.available(),
                now,
                kos.id,
                kos.available_rooms,
                kos.total_rooms
            ],
        )?;

        if changed == 0 {
            return Err(AppError::Conflict(
                "Room inventory changed while updating, try again".to_string(),
            ));
        }
    }

    tx.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![to.as_str(), now, id],
    )?;
    tx.commit()?;

    info!(
        booking_id = id,
        kos_id = kos.id,
        from = %booking.status,
        to = %to,
        available = rooms.available(),
        total = rooms.total(),
        "Booking status changed"
    );

    Ok(StatusChange {
        booking: Booking {
            status: to,
            updated_at: now,
            ..booking
        },
        total_rooms: rooms.total(),
        available_rooms: rooms.available(),
    })
}

/// Withdraws a booking that the owner has not decided on yet.
pub fn cancel(conn: &mut Connection, id: i64, user_id: i64) -> Result<(), AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let booking = find(&tx, id)?.ok_or(AppError::NotFound("Booking"))?;
    if booking.user_id != user_id {
        return Err(AppError::Forbidden("This booking belongs to someone else"));
    }

    if booking.status != BookingStatus::Pending {
        return Err(AppError::Conflict(format!(
            "Only pending bookings can be cancelled, this one is {}",
            booking.status
        )));
    }

    tx.execute("DELETE FROM bookings WHERE id = ?1", [id])?;
    tx.commit()?;

    info!(booking_id = id, kos_id = booking.kos_id, user_id, "Booking cancelled");
    Ok(())
}

pub fn view(conn: &Connection, id: i64) -> Result<Option<BookingView>, AppError> {
    let view = conn
        .query_row(&format!("{VIEW_SELECT} WHERE b.id = ?1"), [id], view_from_row)
        .optional()?;

    Ok(view)
}

/// A booking is visible to the society member who made it and the kos owner.
pub fn visible_to(conn: &Connection, id: i64, caller: &User) -> Result<BookingView, AppError> {
    let view = view(conn, id)?.ok_or(AppError::NotFound("Booking"))?;

    let allowed = match caller.role {
        Role::Society => view.booking.user_id == caller.id,
        Role::Owner => view.kos_owner_id == caller.id,
    };

    if !allowed {
        return Err(AppError::Forbidden("This booking belongs to someone else"));
    }

    Ok(view)
}

/// Booking history: a society member's own bookings, or every booking on an owner's kos.
pub fn list(
    conn: &Connection,
    caller: &User,
    filter: &BookingFilter,
) -> Result<Vec<BookingView>, AppError> {
    let mut sql = String::from(VIEW_SELECT);
    let mut params = Vec::new();

    match caller.role {
        Role::Society => sql.push_str(" WHERE b.user_id = ?"),
        Role::Owner => sql.push_str(" WHERE k.owner_id = ?"),
    }
    params.push(Value::Integer(caller.id));

    if let Some(status) = filter.status {
        sql.push_str(" AND b.status = ?");
        params.push(Value::Text(status.as_str().to_string()));
    }

    if let Some(kos_id) = filter.kos_id {
        sql.push_str(" AND b.kos_id = ?");
        params.push(Value::Integer(kos_id));
    }

    if let Some(from) = filter.from {
        sql.push_str(" AND substr(b.created_at, 1, 10) >= ?");
        params.push(Value::Text(from.to_string()));
    }

    if let Some(to) = filter.to {
        sql.push_str(" AND substr(b.created_at, 1, 10) <= ?");
        params.push(Value::Text(to.to_string()));
    }

    sql.push_str(" ORDER BY b.created_at DESC, b.id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let views = stmt
        .query_map(params_from_iter(params.iter()), view_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(views)
}
