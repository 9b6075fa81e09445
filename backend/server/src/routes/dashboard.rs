use std::sync::Arc;

use axum::{extract::State as AxumState, response::Response};
use rooms::Role;

use crate::{
    database::dashboard,
    error::AppError,
    state::State,
    utils::{Caller, ok, today},
};

pub async fn dashboard_handler(
    AxumState(state): AxumState<Arc<State>>,
    caller: Caller,
) -> Result<Response, AppError> {
    let today = today();

    match caller.role() {
        Role::Owner => {
            let owner_id = caller.id();
            let summary = state
                .database
                .run(move |conn| dashboard::owner(conn, owner_id, today))
                .await?;

            Ok(ok(summary))
        }
        Role::Society => {
            let summary = state
                .database
                .run(move |conn| dashboard::society(conn, &caller.0, today))
                .await?;

            Ok(ok(summary))
        }
    }
}
