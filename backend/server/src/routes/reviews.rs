use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, State as AxumState,
        rejection::{JsonRejection, PathRejection},
    },
    response::Response,
};
use rooms::{Role, models::ReviewDraft};
use serde::Deserialize;

use crate::{
    database::reviews,
    error::AppError,
    state::State,
    utils::{Caller, created, done, ok, updated},
};

#[derive(Deserialize)]
pub struct ReplyPayload {
    reply: String,
}

pub async fn list_handler(
    AxumState(state): AxumState<Arc<State>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(kos_id) = id?;

    let reviews = state
        .database
        .run(move |conn| reviews::list(conn, kos_id))
        .await?;

    Ok(ok(reviews))
}

pub async fn create_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: Caller,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ReviewDraft>, JsonRejection>,
) -> Result<Response, AppError> {
    let user_id = caller.require(Role::Society)?.id;
    let Path(kos_id) = id?;
    let Json(draft) = payload?;

    let review = state
        .database
        .run(move |conn| reviews::create(conn, kos_id, user_id, &draft))
        .await?;

    Ok(created("Review posted", review))
}

pub async fn reply_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: Caller,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ReplyPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let owner_id = caller.require(Role::Owner)?.id;
    let Path(id) = id?;
    let Json(payload) = payload?;

    let review = state
        .database
        .run(move |conn| reviews::reply(conn, id, owner_id, &payload.reply))
        .await?;

    Ok(updated("Reply saved", review))
}

pub async fn delete_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: Caller,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;
    let user_id = caller.id();

    state
        .database
        .run(move |conn| reviews::delete(conn, id, user_id))
        .await?;

    Ok(done("Review deleted"))
}
