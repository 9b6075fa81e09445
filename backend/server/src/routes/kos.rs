use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State as AxumState,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    response::Response,
};
use chrono::NaiveDate;
use rooms::{Role, models::KosDraft};
use serde::{Deserialize, Serialize};

use crate::{
    database::{calendar, kos},
    error::AppError,
    search::ListingQuery,
    state::State,
    utils::{Caller, created, done, ok, today, updated},
};

#[derive(Deserialize)]
pub struct NamePayload {
    name: String,
}

#[derive(Deserialize)]
pub struct ImagePayload {
    file: String,
}

#[derive(Deserialize)]
pub struct CalendarQuery {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

#[derive(Serialize)]
struct CalendarView {
    kos_id: i64,
    total_rooms: u32,
    available_rooms: u32,
    days: Vec<rooms::models::CalendarDay>,
}

pub async fn search_handler(
    AxumState(state): AxumState<Arc<State>>,
    query: Result<Query<ListingQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;
    let pagination = query.pagination(state.config.max_page_size);

    let page = state
        .database
        .run(move |conn| kos::search(conn, &query, pagination))
        .await?;

    Ok(ok(page))
}

pub async fn detail_handler(
    AxumState(state): AxumState<Arc<State>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;

    let detail = state.database.run(move |conn| kos::detail(conn, id)).await?;

    Ok(ok(detail))
}

pub async fn create_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: Caller,
    payload: Result<Json<KosDraft>, JsonRejection>,
) -> Result<Response, AppError> {
    let owner_id = caller.require(Role::Owner)?.id;
    let Json(draft) = payload?;

    let kos = state
        .database
        .run(move |conn| kos::insert(conn, owner_id, &draft))
        .await?;

    Ok(created("Kos created", kos))
}

pub async fn update_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: Caller,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<KosDraft>, JsonRejection>,
) -> Result<Response, AppError> {
    let owner_id = caller.require(Role::Owner)?.id;
    let Path(id) = id?;
    let Json(draft) = payload?;

    let kos = state
        .database
        .run(move |conn| kos::update(conn, id, owner_id, &draft))
        .await?;

    Ok(updated("Kos updated", kos))
}

pub async fn delete_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: Caller,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let owner_id = caller.require(Role::Owner)?.id;
    let Path(id) = id?;

    state
        .database
        .run(move |conn| kos::delete(conn, id, owner_id))
        .await?;

    Ok(done("Kos deleted"))
}

pub async fn add_facility_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: Caller,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<NamePayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let owner_id = caller.require(Role::Owner)?.id;
    let Path(id) = id?;
    let Json(payload) = payload?;

    let facility = state
        .database
        .run(move |conn| kos::add_facility(conn, id, owner_id, &payload.name))
        .await?;

    Ok(created("Facility added", facility))
}

pub async fn rename_facility_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: Caller,
    ids: Result<Path<(i64, i64)>, PathRejection>,
    payload: Result<Json<NamePayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let owner_id = caller.require(Role::Owner)?.id;
    let Path((id, facility_id)) = ids?;
    let Json(payload) = payload?;

    let facility = state
        .database
        .run(move |conn| kos::rename_facility(conn, id, facility_id, owner_id, &payload.name))
        .await?;

    Ok(updated("Facility updated", facility))
}

pub async fn remove_facility_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: Caller,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<Response, AppError> {
    let owner_id = caller.require(Role::Owner)?.id;
    let Path((id, facility_id)) = ids?;

    state
        .database
        .run(move |conn| kos::remove_facility(conn, id, facility_id, owner_id))
        .await?;

    Ok(done("Facility removed"))
}

pub async fn add_image_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: Caller,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ImagePayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let owner_id = caller.require(Role::Owner)?.id;
    let Path(id) = id?;
    let Json(payload) = payload?;

    let image = state
        .database
        .run(move |conn| kos::add_image(conn, id, owner_id, &payload.file))
        .await?;

    Ok(created("Image added", image))
}

pub async fn remove_image_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: Caller,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<Response, AppError> {
    let owner_id = caller.require(Role::Owner)?.id;
    let Path((id, image_id)) = ids?;

    state
        .database
        .run(move |conn| kos::remove_image(conn, id, image_id, owner_id))
        .await?;

    Ok(done("Image removed"))
}

pub async fn like_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: Caller,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    let user_id = caller.id();

    let like = state
        .database
        .run(move |conn| kos::toggle_like(conn, id, user_id))
        .await?;

    Ok(ok(like))
}

pub async fn likes_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: Caller,
) -> Result<Response, AppError> {
    let user_id = caller.id();

    let liked = state
        .database
        .run(move |conn| kos::liked_by(conn, user_id))
        .await?;

    Ok(ok(liked))
}

pub async fn calendar_handler(
    AxumState(state): AxumState<Arc<State>>,
    id: Result<Path<i64>, PathRejection>,
    query: Result<Query<CalendarQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    let Query(query) = query?;
    let window = calendar::window(query.from, query.to, today())?;

    let view = state
        .database
        .run(move |conn| {
            let kos = kos::require(conn, id)?;
            let days = calendar::view(conn, &kos, &window)?;

            Ok(CalendarView {
                kos_id: kos.id,
                total_rooms: kos.total_rooms,
                available_rooms: kos.available_rooms,
                days,
            })
        })
        .await?;

    Ok(ok(view))
}
