//! Stub case-management API for integration tests.
//!
//! Serves fixed JSON payloads plus a handful of behaviors tests need to
//! provoke: a guaranteed failure (`/fail`), a delayed response (`/slow`),
//! a query echo (`/search`), and a write endpoint that mints receipt ids
//! (`POST /payments`). Every request is counted per path in shared state;
//! `GET /hits` exposes the counts so tests can assert exactly how many
//! round trips a batch performed, and `DELETE /hits` resets them.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::RwLock;

/// Per-path request counts, excluding `/hits` itself.
pub type Hits = Arc<RwLock<HashMap<String, u64>>>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Greeting {
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: u64,
    pub title: String,
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentInput {
    pub case_id: u64,
    pub amount_cents: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Payment {
    pub receipt: u64,
    pub case_id: u64,
    pub amount_cents: i64,
}

static NEXT_RECEIPT: AtomicU64 = AtomicU64::new(1);

pub fn app() -> Router {
    let hits: Hits = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/", get(root))
        .route("/hello", get(hello))
        .route("/goodbye", get(goodbye))
        .route("/cases/{id}", get(get_case))
        .route("/search", get(search))
        .route("/payments", post(create_payment))
        .route("/fail", get(fail))
        .route("/slow", get(slow))
        .route("/hits", get(read_hits).delete(reset_hits))
        .layer(middleware::from_fn_with_state(hits.clone(), count_hits))
        .with_state(hits)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn count_hits(State(hits): State<Hits>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if path != "/hits" {
        *hits.write().await.entry(path).or_insert(0) += 1;
    }
    next.run(request).await
}

async fn root() -> Json<Greeting> {
    Json(Greeting {
        message: "home".to_string(),
    })
}

async fn hello() -> Json<Greeting> {
    Json(Greeting {
        message: "hello".to_string(),
    })
}

async fn goodbye() -> Json<Greeting> {
    Json(Greeting {
        message: "goodbye".to_string(),
    })
}

async fn get_case(Path(id): Path<u64>) -> Json<CaseRecord> {
    Json(CaseRecord {
        id,
        title: format!("Case #{id}"),
        status: "open".to_string(),
    })
}

async fn search(Query(params): Query<HashMap<String, String>>) -> Json<HashMap<String, String>> {
    Json(params)
}

async fn create_payment(Json(input): Json<PaymentInput>) -> (StatusCode, Json<Payment>) {
    let receipt = NEXT_RECEIPT.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(receipt, case_id = input.case_id, "payment recorded");
    (
        StatusCode::CREATED,
        Json(Payment {
            receipt,
            case_id: input.case_id,
            amount_cents: input.amount_cents,
        }),
    )
}

async fn fail() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn slow() -> Json<Greeting> {
    tokio::time::sleep(Duration::from_millis(50)).await;
    Json(Greeting {
        message: "slow".to_string(),
    })
}

async fn read_hits(State(hits): State<Hits>) -> Json<HashMap<String, u64>> {
    Json(hits.read().await.clone())
}

async fn reset_hits(State(hits): State<Hits>) -> StatusCode {
    hits.write().await.clear();
    StatusCode::NO_CONTENT
}
