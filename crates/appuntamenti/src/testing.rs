//! In-process stand-in for the dates service, shared by the async tests.

use axum::extract::{Path, RawQuery, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub type Records = Arc<Mutex<Vec<Value>>>;

pub fn seed_records() -> Records {
    Arc::new(Mutex::new(vec![
        json!({"id": 1, "activity_name": "Picnic", "location": "Park", "date_day": "2024-03-10", "rating": 4}),
        json!({"id": 2, "activity_name": "Dinner", "location": "Home", "date_day": "2024-03-11"}),
    ]))
}

fn find(records: &Records, id: i64) -> Option<Value> {
    records
        .lock()
        .unwrap()
        .iter()
        .find(|r| r["id"] == json!(id))
        .cloned()
}

fn not_found() -> axum::response::Response {
    (StatusCode::NOT_FOUND, Json(json!({"error": "Date not found"}))).into_response()
}

/// Serve an in-memory dates API on an ephemeral port and return its base URL.
///
/// Only the `activity_name` filter is honored.
pub async fn spawn_fake_service(records: Records) -> String {
    spawn_switchable_service(records, Arc::new(AtomicBool::new(false))).await
}

/// Like [`spawn_fake_service`], answering 503 to everything while `down` is set.
pub async fn spawn_switchable_service(records: Records, down: Arc<AtomicBool>) -> String {
    let unavailable = middleware::from_fn(move |request: Request, next: Next| {
        let down = down.clone();
        async move {
            if down.load(Ordering::SeqCst) {
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({"error": "Service unavailable"})),
                )
                    .into_response();
            }
            next.run(request).await
        }
    });

    let app = Router::new()
        .route(
            "/api/dates",
            get(
                |State(records): State<Records>, RawQuery(query): RawQuery| async move {
                    let needle = query
                        .unwrap_or_default()
                        .strip_prefix("activity_name=")
                        .map(|s| s.to_lowercase());
                    let all = records.lock().unwrap().clone();
                    let filtered: Vec<Value> = all
                        .into_iter()
                        .filter(|r| match &needle {
                            Some(n) => r["activity_name"]
                                .as_str()
                                .unwrap_or_default()
                                .to_lowercase()
                                .contains(n.as_str()),
                            None => true,
                        })
                        .collect();
                    Json(Value::Array(filtered))
                },
            )
            .post(
                |State(records): State<Records>, Json(mut body): Json<Value>| async move {
                    let mut all = records.lock().unwrap();
                    body["id"] = json!(all.len() as i64 + 100);
                    all.push(body.clone());
                    (StatusCode::CREATED, Json(body))
                },
            ),
        )
        .route(
            "/api/dates/count",
            get(|State(records): State<Records>| async move {
                Json(json!({"count": records.lock().unwrap().len()}))
            }),
        )
        .route(
            "/api/dates/{id}",
            get(
                |State(records): State<Records>, Path(id): Path<i64>| async move {
                    match find(&records, id) {
                        Some(record) => Json(record).into_response(),
                        None => not_found(),
                    }
                },
            )
            .put(
                |State(records): State<Records>,
                 Path(id): Path<i64>,
                 Json(mut body): Json<Value>| async move {
                    let mut all = records.lock().unwrap();
                    match all.iter_mut().find(|r| r["id"] == json!(id)) {
                        Some(slot) => {
                            body["id"] = json!(id);
                            *slot = body.clone();
                            Json(body).into_response()
                        }
                        None => not_found(),
                    }
                },
            )
            .delete(
                |State(records): State<Records>, Path(id): Path<i64>| async move {
                    if find(&records, id).is_none() {
                        return not_found();
                    }
                    records.lock().unwrap().retain(|r| r["id"] != json!(id));
                    Json(json!({"message": "Date deleted successfully"})).into_response()
                },
            ),
        )
        .with_state(records)
        .layer(unavailable);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
