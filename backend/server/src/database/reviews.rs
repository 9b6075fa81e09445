use chrono::Utc;
use rooms::{
    models::{Review, ReviewDraft},
    validate::{self, MAX_TEXT_LEN},
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use tracing::info;

use super::{is_unique_violation, kos};
use crate::error::AppError;

const SELECT: &str = "SELECT r.id, r.kos_id, r.user_id, r.rating, r.comment, r.reply, \
    r.created_at, u.name FROM reviews r JOIN users u ON u.id = r.user_id";

#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: Review,
    pub user_name: String,
}

fn from_row(row: &Row) -> rusqlite::Result<ReviewView> {
    Ok(ReviewView {
        review: Review {
            id: row.get(0)?,
            kos_id: row.get(1)?,
            user_id: row.get(2)?,
            rating: row.get(3)?,
            comment: row.get(4)?,
            reply: row.get(5)?,
            created_at: row.get(6)?,
        },
        user_name: row.get(7)?,
    })
}

pub fn create(
    conn: &Connection,
    kos_id: i64,
    user_id: i64,
    draft: &ReviewDraft,
) -> Result<Review, AppError> {
    let draft = draft.validated()?;
    kos::require(conn, kos_id)?;
    let now = Utc::now();

    conn.execute(
        "INSERT INTO reviews (kos_id, user_id, rating, comment, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![kos_id, user_id, draft.rating, draft.comment, now],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("You already reviewed this kos".to_string())
        } else {
            e.into()
        }
    })?;

    let id = conn.last_insert_rowid();
    info!(review_id = id, kos_id, user_id, rating = draft.rating, "Review posted");

    Ok(Review {
        id,
        kos_id,
        user_id,
        rating: draft.rating,
        comment: draft.comment,
        reply: None,
        created_at: now,
    })
}

pub fn list(conn: &Connection, kos_id: i64) -> Result<Vec<ReviewView>, AppError> {
    kos::require(conn, kos_id)?;

    let mut stmt = conn.prepare_cached(&format!(
        "{SELECT} WHERE r.kos_id = ?1 ORDER BY r.created_at DESC, r.id DESC"
    ))?;
    let reviews = stmt
        .query_map([kos_id], from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(reviews)
}

fn require(conn: &Connection, id: i64) -> Result<ReviewView, AppError> {
    conn.query_row(&format!("{SELECT} WHERE r.id = ?1"), [id], from_row)
        .optional()?
        .ok_or(AppError::NotFound("Review"))
}

/// Sets or replaces the owner's reply on a review of their kos.
pub fn reply(conn: &Connection, id: i64, owner_id: i64, text: &str) -> Result<Review, AppError> {
    let view = require(conn, id)?;
    kos::require_owned(conn, view.review.kos_id, owner_id)?;
    let text = validate::required("reply", text, MAX_TEXT_LEN)?;

    conn.execute(
        "UPDATE reviews SET reply = ?1 WHERE id = ?2",
        params![text, id],
    )?;

    Ok(Review {
        reply: Some(text),
        ..view.review
    })
}

pub fn delete(conn: &Connection, id: i64, user_id: i64) -> Result<(), AppError> {
    let view = require(conn, id)?;

    if view.review.user_id != user_id {
        return Err(AppError::Forbidden("Only the author can delete a review"));
    }

    conn.execute("DELETE FROM reviews WHERE id = ?1", [id])?;
    Ok(())
}
