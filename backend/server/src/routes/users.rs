use std::sync::Arc;

use axum::{
    Json,
    extract::{State as AxumState, rejection::JsonRejection},
    response::Response,
};
use rooms::models::UserDraft;

use crate::{
    database::users,
    error::AppError,
    state::State,
    utils::{Caller, created, ok},
};

pub async fn register_handler(
    AxumState(state): AxumState<Arc<State>>,
    payload: Result<Json<UserDraft>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(draft) = payload?;

    let user = state
        .database
        .run(move |conn| users::insert(conn, &draft))
        .await?;

    Ok(created("User registered", user))
}

pub async fn me_handler(caller: Caller) -> Response {
    ok(caller.0)
}
