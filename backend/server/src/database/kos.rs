use chrono::Utc;
use rooms::{
    Rooms,
    models::{Facility, Image, Kos, KosDraft},
    validate::{self, MAX_FILE_LEN, MAX_NAME_LEN},
};
use rusqlite::{
    Connection, OptionalExtension, Row, TransactionBehavior, params, params_from_iter,
};
use serde::Serialize;
use tracing::info;

use super::parsed;
use crate::{
    error::AppError,
    search::{ListingQuery, search_text},
    utils::{Page, Pagination},
};

pub(crate) const COLUMNS: &str = "k.id, k.owner_id, k.name, k.address, k.description, \
    k.price_per_month, k.gender, k.total_rooms, k.available_rooms, k.created_at, k.updated_at";

const STATS: &str = "(SELECT COUNT(*) FROM likes l WHERE l.kos_id = k.id) AS likes, \
    (SELECT COUNT(*) FROM reviews r WHERE r.kos_id = k.id) AS reviews, \
    (SELECT AVG(r.rating) FROM reviews r WHERE r.kos_id = k.id) AS rating";

pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Kos> {
    Ok(Kos {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        address: row.get(3)?,
        description: row.get(4)?,
        price_per_month: row.get(5)?,
        gender: parsed(row, 6)?,
        total_rooms: row.get(7)?,
        available_rooms: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Kos card for listing pages.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    #[serde(flatten)]
    pub kos: Kos,
    pub likes: u32,
    pub reviews: u32,
    pub rating: Option<f64>,
}

fn listing_from_row(row: &Row) -> rusqlite::Result<Listing> {
    Ok(Listing {
        kos: from_row(row)?,
        likes: row.get(11)?,
        reviews: row.get(12)?,
        rating: row.get::<_, Option<f64>>(13)?.map(round_rating),
    })
}

pub(crate) fn round_rating(rating: f64) -> f64 {
    (rating * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Serialize)]
pub struct Detail {
    #[serde(flatten)]
    pub listing: Listing,
    pub facilities: Vec<Facility>,
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub likes: u32,
}

pub fn find(conn: &Connection, id: i64) -> Result<Option<Kos>, AppError> {
    let kos = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM kos k WHERE k.id = ?1"),
            [id],
            from_row,
        )
        .optional()?;

    Ok(kos)
}

pub fn require(conn: &Connection, id: i64) -> Result<Kos, AppError> {
    find(conn, id)?.ok_or(AppError::NotFound("Kos"))
}

pub fn require_owned(conn: &Connection, id: i64, owner_id: i64) -> Result<Kos, AppError> {
    let kos = require(conn, id)?;

    if kos.owner_id != owner_id {
        return Err(AppError::Forbidden("This kos belongs to another owner"));
    }

    Ok(kos)
}

pub fn insert(conn: &Connection, owner_id: i64, draft: &KosDraft) -> Result<Kos, AppError> {
    let draft = draft.validated()?;
    let rooms = Rooms::empty(draft.total_rooms);
    let now = Utc::now();

    conn.execute(
        "INSERT INTO kos (owner_id, name, address, description, search_text, price_per_month,
                          gender, total_rooms, available_rooms, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        params![
            owner_id,
            draft.name,
            draft.address,
            draft.description,
            search_text(&draft.name, &draft.address, &draft.description),
            draft.price_per_month,
            draft.gender.as_str(),
            rooms.total(),
            rooms.available(),
            now,
        ],
    )?;

    let id = conn.last_insert_rowid();
    info!(kos_id = id, owner_id, rooms = rooms.total(), "Kos listed");

    Ok(Kos {
        id,
        owner_id,
        name: draft.name,
        address: draft.address,
        description: draft.description,
        price_per_month: draft.price_per_month,
        gender: draft.gender,
        total_rooms: rooms.total(),
        available_rooms: rooms.available(),
        created_at: now,
        updated_at: now,
    })
}

/// Updates listing fields. A new room total keeps occupied rooms occupied.
pub fn update(
    conn: &mut Connection,
    id: i64,
    owner_id: i64,
    draft: &KosDraft,
) -> Result<Kos, AppError> {
    let draft = draft.validated()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let kos = require_owned(&tx, id, owner_id)?;
    let rooms = Rooms::new(kos.total_rooms, kos.available_rooms)?.resize(draft.total_rooms)?;
    let now = Utc::now();

    tx.execute(
        "UPDATE kos SET name = ?1, address = ?2, description = ?3, search_text = ?4,
                        price_per_month = ?5, gender = ?6, total_rooms = ?7,
                        available_rooms = ?8, updated_at = ?9
         WHERE id = ?10",
        params![
            draft.name,
            draft.address,
            draft.description,
            search_text(&draft.name, &draft.address, &draft.description),
            draft.price_per_month,
            draft.gender.as_str(),
            rooms.total(),
            rooms.available(),
            now,
            id,
        ],
    )?;
    tx.commit()?;

    if rooms.total() != kos.total_rooms {
        info!(
            kos_id = id,
            from = kos.total_rooms,
            to = rooms.total(),
            available = rooms.available(),
            "Kos resized"
        );
    }

    Ok(Kos {
        name: draft.name,
        address: draft.address,
        description: draft.description,
        price_per_month: draft.price_per_month,
        gender: draft.gender,
        total_rooms: rooms.total(),
        available_rooms: rooms.available(),
        updated_at: now,
        ..kos
    })
}

/// Deletes a kos and everything hanging off it, unless someone is staying.
pub fn delete(conn: &mut Connection, id: i64, owner_id: i64) -> Result<(), AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    require_owned(&tx, id, owner_id)?;

    let accepted: u32 = tx.query_row(
        "SELECT COUNT(*) FROM bookings WHERE kos_id = ?1 AND status = 'accept'",
        [id],
        |row| row.get(0),
    )?;

    if accepted > 0 {
        return Err(AppError::Conflict(format!(
            "Kos still has {accepted} accepted booking(s)"
        )));
    }

    tx.execute("DELETE FROM kos WHERE id = ?1", [id])?;
    tx.commit()?;

    info!(kos_id = id, owner_id, "Kos deleted");
    Ok(())
}

pub fn search(
    conn: &Connection,
    query: &ListingQuery,
    pagination: Pagination,
) -> Result<Page<Listing>, AppError> {
    let filter = query.filter();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM kos k{}", filter.clause),
        params_from_iter(filter.params.iter()),
        |row| row.get(0),
    )?;

    let sql = format!(
        "SELECT {COLUMNS}, {STATS} FROM kos k{} ORDER BY {} LIMIT {} OFFSET {}",
        filter.clause,
        query.sort.order_by(),
        pagination.limit(),
        pagination.offset(),
    );

    let mut stmt = conn.prepare(&sql)?;
    let items = stmt
        .query_map(params_from_iter(filter.params.iter()), listing_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page {
        items,
        page: pagination.page,
        per_page: pagination.per_page,
        total,
    })
}

pub fn listing(conn: &Connection, id: i64) -> Result<Listing, AppError> {
    conn.query_row(
        &format!("SELECT {COLUMNS}, {STATS} FROM kos k WHERE k.id = ?1"),
        [id],
        listing_from_row,
    )
    .optional()?
    .ok_or(AppError::NotFound("Kos"))
}

pub fn detail(conn: &Connection, id: i64) -> Result<Detail, AppError> {
    let listing = listing(conn, id)?;

    let facilities = conn
        .prepare_cached("SELECT id, kos_id, name FROM facilities WHERE kos_id = ?1 ORDER BY id")?
        .query_map([id], |row| {
            Ok(Facility {
                id: row.get(0)?,
                kos_id: row.get(1)?,
                name: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let images = conn
        .prepare_cached("SELECT id, kos_id, file FROM images WHERE kos_id = ?1 ORDER BY id")?
        .query_map([id], |row| {
            Ok(Image {
                id: row.get(0)?,
                kos_id: row.get(1)?,
                file: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Detail {
        listing,
        facilities,
        images,
    })
}

pub fn add_facility(
    conn: &Connection,
    kos_id: i64,
    owner_id: i64,
    name: &str,
) -> Result<Facility, AppError> {
    require_owned(conn, kos_id, owner_id)?;
    let name = validate::required("facility", name, MAX_NAME_LEN)?;

    conn.execute(
        "INSERT INTO facilities (kos_id, name) VALUES (?1, ?2)",
        params![kos_id, name],
    )?;

    Ok(Facility {
        id: conn.last_insert_rowid(),
        kos_id,
        name,
    })
}

pub fn rename_facility(
    conn: &Connection,
    kos_id: i64,
    facility_id: i64,
    owner_id: i64,
    name: &str,
) -> Result<Facility, AppError> {
    require_owned(conn, kos_id, owner_id)?;
    let name = validate::required("facility", name, MAX_NAME_LEN)?;

    let changed = conn.execute(
        "UPDATE facilities SET name = ?1 WHERE id = ?2 AND kos_id = ?3",
        params![name, facility_id, kos_id],
    )?;

    if changed == 0 {
        return Err(AppError::NotFound("Facility"));
    }

    Ok(Facility {
        id: facility_id,
        kos_id,
        name,
    })
}

pub fn remove_facility(
    conn: &Connection,
    kos_id: i64,
    facility_id: i64,
    owner_id: i64,
) -> Result<(), AppError> {
    require_owned(conn, kos_id, owner_id)?;

    let removed = conn.execute(
        "DELETE FROM facilities WHERE id = ?1 AND kos_id = ?2",
        params![facility_id, kos_id],
    )?;

    if removed == 0 {
        return Err(AppError::NotFound("Facility"));
    }

    Ok(())
}

pub fn add_image(
    conn: &Connection,
    kos_id: i64,
    owner_id: i64,
    file: &str,
) -> Result<Image, AppError> {
    require_owned(conn, kos_id, owner_id)?;
    let file = validate::required("file", file, MAX_FILE_LEN)?;

    conn.execute(
        "INSERT INTO images (kos_id, file) VALUES (?1, ?2)",
        params![kos_id, file],
    )?;

    Ok(Image {
        id: conn.last_insert_rowid(),
        kos_id,
        file,
    })
}

pub fn remove_image(
    conn: &Connection,
    kos_id: i64,
    image_id: i64,
    owner_id: i64,
) -> Result<(), AppError> {
    require_owned(conn, kos_id, owner_id)?;

    let removed = conn.execute(
        "DELETE FROM images WHERE id = ?1 AND kos_id = ?2",
        params![image_id, kos_id],
    )?;

    if removed == 0 {
        return Err(AppError::NotFound("Image"));
    }

    Ok(())
}

/// Likes the kos, or takes the like back if it was already there.
pub fn toggle_like(
    conn: &mut Connection,
    kos_id: i64,
    user_id: i64,
) -> Result<LikeState, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    require(&tx, kos_id)?;

    let unliked = tx.execute(
        "DELETE FROM likes WHERE kos_id = ?1 AND user_id = ?2",
        params![kos_id, user_id],
    )? > 0;

    if !unliked {
        tx.execute(
            "INSERT INTO likes (kos_id, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![kos_id, user_id, Utc::now()],
        )?;
    }

    let likes = tx.query_row(
        "SELECT COUNT(*) FROM likes WHERE kos_id = ?1",
        [kos_id],
        |row| row.get(0),
    )?;
    tx.commit()?;

    Ok(LikeState {
        liked: !unliked,
        likes,
    })
}

pub fn liked_by(conn: &Connection, user_id: i64) -> Result<Vec<Listing>, AppError> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {COLUMNS}, {STATS} FROM kos k
         JOIN likes mine ON mine.kos_id = k.id AND mine.user_id = ?1
         ORDER BY mine.created_at DESC, k.id DESC"
    ))?;

    let listings = stmt
        .query_map([user_id], listing_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(listings)
}

