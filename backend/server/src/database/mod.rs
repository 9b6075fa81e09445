//! # SQLite
//!
//! Relational store for users, listings, bookings and the booking calendar.
//!
//! ## Requirements
//!
//! - Booking status changes move the room counter and calendar in one step
//! - Counter can never go negative or above the room total, even if a caller races us
//! - Cheap reads for the listing page (likes and ratings are aggregated per query)
//!
//! ## Implementation
//!
//! - One connection behind a mutex, driven from `spawn_blocking`
//! - Writes that touch more than one row run in an `IMMEDIATE` transaction
//! - Room counter updates are compare-and-set on the previous value
//! - `CHECK` constraints mirror the inventory invariants as a last line
//! - `booking_calendar` holds one row per (kos, day) with at least one accepted stay
use std::{path::Path, str::FromStr, sync::Arc};

use parking_lot::Mutex;
use rooms::RoomsError;
use rusqlite::{Connection, ErrorCode, Row, types::Type};

use crate::error::AppError;

pub mod bookings;
pub mod calendar;
pub mod dashboard;
pub mod kos;
pub mod reconcile;
pub mod reviews;
pub mod users;

const PRAGMAS: &str = "PRAGMA foreign_keys=ON; PRAGMA journal_mode=WAL; \
    PRAGMA synchronous=NORMAL; PRAGMA busy_timeout=5000;";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    phone TEXT NOT NULL DEFAULT '',
    role TEXT NOT NULL CHECK (role IN ('owner', 'society')),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS kos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    address TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    search_text TEXT NOT NULL DEFAULT '',
    price_per_month INTEGER NOT NULL CHECK (price_per_month > 0),
    gender TEXT NOT NULL CHECK (gender IN ('male', 'female', 'all')),
    total_rooms INTEGER NOT NULL CHECK (total_rooms > 0),
    available_rooms INTEGER NOT NULL CHECK (available_rooms >= 0 AND available_rooms <= total_rooms),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_kos_owner ON kos(owner_id);
CREATE INDEX IF NOT EXISTS idx_kos_price ON kos(price_per_month);

CREATE TABLE IF NOT EXISTS facilities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kos_id INTEGER NOT NULL REFERENCES kos(id) ON DELETE CASCADE,
    name TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_facilities_kos ON facilities(kos_id);

CREATE TABLE IF NOT EXISTS images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kos_id INTEGER NOT NULL REFERENCES kos(id) ON DELETE CASCADE,
    file TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_images_kos ON images(kos_id);

CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kos_id INTEGER NOT NULL REFERENCES kos(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    comment TEXT NOT NULL DEFAULT '',
    reply TEXT,
    created_at TEXT NOT NULL,
    UNIQUE (kos_id, user_id)
);

CREATE TABLE IF NOT EXISTS likes (
    kos_id INTEGER NOT NULL REFERENCES kos(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    PRIMARY KEY (kos_id, user_id)
);

CREATE TABLE IF NOT EXISTS bookings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kos_id INTEGER NOT NULL REFERENCES kos(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'accept', 'reject')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK (end_date > start_date)
);
CREATE INDEX IF NOT EXISTS idx_bookings_kos_status ON bookings(kos_id, status);
CREATE INDEX IF NOT EXISTS idx_bookings_user ON bookings(user_id);

CREATE TABLE IF NOT EXISTS booking_calendar (
    kos_id INTEGER NOT NULL REFERENCES kos(id) ON DELETE CASCADE,
    day TEXT NOT NULL,
    booked INTEGER NOT NULL CHECK (booked > 0),
    PRIMARY KEY (kos_id, day)
);
";

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        Self::prepare(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, AppError> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self, AppError> {
        conn.execute_batch(PRAGMAS)?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` on the blocking pool with the connection locked.
    pub async fn run<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Connection) -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || f(&mut *conn.lock()))
            .await
            .map_err(|e| AppError::InternalError(Box::new(e)))?
    }

    /// Same as [`Database::run`] for callers outside the runtime.
    pub fn blocking<F, T>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Connection) -> Result<T, AppError>,
    {
        f(&mut *self.conn.lock())
    }
}

/// Reads a text column into one of the domain enums.
pub(crate) fn parsed<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = RoomsError>,
{
    let text: String = row.get(idx)?;

    text.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
            && (err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let db = Database::open_in_memory().unwrap();

        db.blocking(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn available_rooms_check_holds() {
        let db = Database::open_in_memory().unwrap();

        let result = db.blocking(|conn| {
            conn.execute(
                "INSERT INTO users (name, email, role, created_at) VALUES ('o', 'o@x.id', 'owner', '2025-01-01')",
                [],
            )?;
            conn.execute(
                "INSERT INTO kos (owner_id, name, address, price_per_month, gender, total_rooms, available_rooms, created_at, updated_at)
                 VALUES (1, 'k', 'a', 1, 'all', 2, 3, '2025-01-01', '2025-01-01')",
                [],
            )?;
            Ok(())
        });

        assert!(result.is_err());
    }

    #[test]
    fn detects_unique_violations() {
        let db = Database::open_in_memory().unwrap();

        db.blocking(|conn| {
            let insert = "INSERT INTO users (name, email, role, created_at) VALUES ('a', 'a@x.id', 'society', '2025-01-01')";
            conn.execute(insert, [])?;

            let err = conn.execute(insert, []).unwrap_err();
            assert!(is_unique_violation(&err));
            Ok(())
        })
        .unwrap();
    }
}
