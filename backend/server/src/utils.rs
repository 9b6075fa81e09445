use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};
use rooms::{Role, models::User};
use serde::Serialize;

use crate::{database::users, error::AppError, state::State};

pub const USER_HEADER: &str = "x-user-id";

/// Registered user making the request, resolved from [`USER_HEADER`].
#[derive(Debug, Clone)]
pub struct Caller(pub User);

impl Caller {
    pub fn id(&self) -> i64 {
        self.0.id
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    pub fn require(&self, role: Role) -> Result<&User, AppError> {
        if self.0.role != role {
            return Err(AppError::Forbidden(match role {
                Role::Owner => "Only kos owners can do this",
                Role::Society => "Only society members can do this",
            }));
        }

        Ok(&self.0)
    }
}

impl FromRequestParts<Arc<State>> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<State>) -> Result<Self, AppError> {
        let id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
            .ok_or(AppError::Unauthorized)?;

        let user = state
            .database
            .run(move |conn| users::find(conn, id))
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(Caller(user))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub const DEFAULT_PER_PAGE: u32 = 10;

    pub fn new(page: Option<u32>, per_page: Option<u32>, max_per_page: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(Self::DEFAULT_PER_PAGE)
                .clamp(1, max_per_page.max(1)),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

#[derive(Serialize)]
struct Envelope<T> {
    status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

pub fn ok<T: Serialize>(data: T) -> Response {
    respond(StatusCode::OK, None, Some(data))
}

pub fn created<T: Serialize>(message: &'static str, data: T) -> Response {
    respond(StatusCode::CREATED, Some(message), Some(data))
}

pub fn updated<T: Serialize>(message: &'static str, data: T) -> Response {
    respond(StatusCode::OK, Some(message), Some(data))
}

pub fn done(message: &'static str) -> Response {
    respond::<()>(StatusCode::OK, Some(message), None)
}

fn respond<T: Serialize>(
    status: StatusCode,
    message: Option<&'static str>,
    data: Option<T>,
) -> Response {
    let body = Envelope {
        status: true,
        message,
        data,
    };

    (status, Json(body)).into_response()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
