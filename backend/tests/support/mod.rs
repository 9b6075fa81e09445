#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use kos::{build_router, config::Config, state::State};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config {
            database_path: dir.path().join("kos.db"),
            ..Config::default()
        };
        let state = State::new(config).expect("open state");

        Self {
            router: build_router(state),
            dir,
        }
    }

    pub fn database_path(&self) -> std::path::PathBuf {
        self.dir.path().join("kos.db")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        user: Option<i64>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(user) = user {
            builder = builder.header("x-user-id", user.to_string());
        }

        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, user: Option<i64>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, user, None).await
    }

    pub async fn post(&self, uri: &str, user: Option<i64>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, user, Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: Option<i64>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, user, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: Option<i64>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, user, None).await
    }

    pub async fn register(&self, name: &str, role: &str) -> i64 {
        let (status, body) = self
            .post(
                "/users",
                None,
                json!({
                    "name": name,
                    "email": format!("{}@mail.test", name.to_lowercase()),
                    "phone": "0812",
                    "role": role,
                }),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_i64().expect("user id")
    }

    pub async fn create_kos(&self, owner: i64, name: &str, price: i64, rooms: u32) -> i64 {
        let (status, body) = self
            .post(
                "/kos",
                Some(owner),
                json!({
                    "name": name,
                    "address": "Jl. Veteran, Malang",
                    "description": "dekat kampus",
                    "price_per_month": price,
                    "gender": "all",
                    "total_rooms": rooms,
                }),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_i64().expect("kos id")
    }

    pub async fn book(&self, user: i64, kos: i64, start: &str, end: &str) -> (StatusCode, Value) {
        self.post(
            "/bookings",
            Some(user),
            json!({ "kos_id": kos, "start_date": start, "end_date": end }),
        )
        .await
    }

    pub async fn book_ok(&self, user: i64, kos: i64, start: &str, end: &str) -> i64 {
        let (status, body) = self.book(user, kos, start, end).await;

        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_i64().expect("booking id")
    }

    pub async fn set_status(&self, owner: i64, booking: i64, status: &str) -> (StatusCode, Value) {
        self.put(
            &format!("/bookings/{booking}/status"),
            Some(owner),
            json!({ "status": status }),
        )
        .await
    }

    pub async fn set_status_ok(&self, owner: i64, booking: i64, status: &str) {
        let (code, body) = self.set_status(owner, booking, status).await;

        assert_eq!(code, StatusCode::OK, "{body}");
    }

    pub async fn calendar(&self, kos: i64, from: &str, to: &str) -> Vec<i64> {
        let uri = format!("/kos/{kos}/calendar?from={from}&to={to}");
        let (status, body) = self.get(&uri, None).await;

        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["days"]
            .as_array()
            .expect("calendar days")
            .iter()
            .map(|day| day["booked"].as_i64().expect("booked"))
            .collect()
    }

    pub async fn available_rooms(&self, kos: i64) -> i64 {
        let (status, body) = self.get(&format!("/kos/{kos}"), None).await;

        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["available_rooms"].as_i64().expect("available rooms")
    }
}
