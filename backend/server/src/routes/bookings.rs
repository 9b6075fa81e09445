use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State as AxumState,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    response::Response,
};
use rooms::{BookingStatus, Role};
use serde::Deserialize;

use crate::{
    database::bookings::{self, BookingFilter, NewBooking},
    error::AppError,
    state::State,
    utils::{Caller, created, done, ok, updated},
};

#[derive(Deserialize)]
pub struct StatusPayload {
    status: BookingStatus,
}

pub async fn create_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: Caller,
    payload: Result<Json<NewBooking>, JsonRejection>,
) -> Result<Response, AppError> {
    let user_id = caller.require(Role::Society)?.id;
    let Json(request) = payload?;
    let max_stay_days = state.config.max_stay_days;

    let booking = state
        .database
        .run(move |conn| bookings::create(conn, user_id, &request, max_stay_days))
        .await?;

    Ok(created("Booking requested", booking))
}

pub async fn list_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: Caller,
    filter: Result<Query<BookingFilter>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(filter) = filter?;

    let history = state
        .database
        .run(move |conn| bookings::list(conn, &caller.0, &filter))
        .await?;

    Ok(ok(history))
}

pub async fn get_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: Caller,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let Path(id) = id?;

    let view = state
        .database
        .run(move |conn| bookings::visible_to(conn, id, &caller.0))
        .await?;

    Ok(ok(view))
}

pub async fn status_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: Caller,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<StatusPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let owner_id = caller.require(Role::Owner)?.id;
    let Path(id) = id?;
    let Json(payload) = payload?;

    let change = state
        .database
        .run(move |conn| bookings::update_status(conn, id, owner_id, payload.status))
        .await?;

    Ok(updated("Booking status updated", change))
}

pub async fn cancel_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: Caller,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Response, AppError> {
    let user_id = caller.require(Role::Society)?.id;
    let Path(id) = id?;

    state
        .database
        .run(move |conn| bookings::cancel(conn, id, user_id))
        .await?;

    Ok(done("Booking cancelled"))
}
