use chrono::Utc;
use rooms::models::{User, UserDraft};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{is_unique_violation, parsed};
use crate::error::AppError;

const COLUMNS: &str = "id, name, email, phone, role, created_at";

fn from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        role: parsed(row, 4)?,
        created_at: row.get(5)?,
    })
}

pub fn insert(conn: &Connection, draft: &UserDraft) -> Result<User, AppError> {
    let draft = draft.validated()?;
    let now = Utc::now();

    conn.execute(
        "INSERT INTO users (name, email, phone, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![draft.name, draft.email, draft.phone, draft.role.as_str(), now],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("Email {} is already registered", draft.email))
        } else {
            e.into()
        }
    })?;

    Ok(User {
        id: conn.last_insert_rowid(),
        name: draft.name,
        email: draft.email,
        phone: draft.phone,
        role: draft.role,
        created_at: now,
    })
}

pub fn find(conn: &Connection, id: i64) -> Result<Option<User>, AppError> {
    let user = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
            [id],
            from_row,
        )
        .optional()?;

    Ok(user)
}

pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<User>, AppError> {
    let user = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM users WHERE email = ?1"),
            [email.trim().to_lowercase()],
            from_row,
        )
        .optional()?;

    Ok(user)
}
