//! HTTP calls against the dates API.
//!
//! Every non-2xx answer becomes [`ClientError::Server`] carrying the `error`
//! field of the JSON body, or a fallback message naming the operation.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, Credentials};
use crate::error::ClientError;
use crate::types::{DateFilter, DateInput, DateRecord, Photo};

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Deserialize)]
struct CountBody {
    count: u64,
}

/// Client for the dates API. Cheap to clone; clones share the session.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client without logging in.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    /// Build a client and open a session when credentials are configured.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = Self::new(config)?;
        if let Some(credentials) = &config.credentials {
            client.login(credentials).await?;
        }
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of an uploaded photo.
    pub fn photo_url(&self, photo: &Photo) -> String {
        format!("{}/{}", self.base_url, photo.filepath.trim_start_matches('/'))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Log in; the session cookie is kept for every later call.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), ClientError> {
        debug!(user = %credentials.username, "Logging in");
        let response = self
            .http
            .post(self.url("/api/login"))
            .json(&LoginRequest {
                username: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(ClientError::Network)?;

        check(response, "Login failed").await?;
        info!(user = %credentials.username, "Logged in to dates service");
        Ok(())
    }

    /// `GET /api/dates` with the filter's query parameters.
    pub async fn list_dates(&self, filter: &DateFilter) -> Result<Vec<DateRecord>, ClientError> {
        let response = self
            .http
            .get(self.url("/api/dates"))
            .query(&filter.query_pairs())
            .send()
            .await
            .map_err(ClientError::Network)?;

        let records: Vec<DateRecord> = decode(response, "Failed to load dates").await?;
        debug!(count = records.len(), "Fetched dates");
        Ok(records)
    }

    /// Total number of records, ignoring any filter.
    pub async fn count_dates(&self) -> Result<u64, ClientError> {
        let response = self
            .http
            .get(self.url("/api/dates/count"))
            .send()
            .await
            .map_err(ClientError::Network)?;

        let body: CountBody = decode(response, "Failed to load count").await?;
        Ok(body.count)
    }

    /// A single record, photos included.
    pub async fn get_date(&self, id: i64) -> Result<DateRecord, ClientError> {
        let response = self
            .http
            .get(self.url(&format!("/api/dates/{}", id)))
            .send()
            .await
            .map_err(ClientError::Network)?;

        decode(response, "Failed to load date").await
    }

    pub async fn create_date(&self, input: &DateInput) -> Result<DateRecord, ClientError> {
        input.validate()?;
        let response = self
            .http
            .post(self.url("/api/dates"))
            .json(input)
            .send()
            .await
            .map_err(ClientError::Network)?;

        let record: DateRecord = decode(response, "Create failed").await?;
        info!(id = record.id, activity = %record.activity_name, "Created date");
        Ok(record)
    }

    pub async fn update_date(&self, id: i64, input: &DateInput) -> Result<DateRecord, ClientError> {
        input.validate()?;
        let response = self
            .http
            .put(self.url(&format!("/api/dates/{}", id)))
            .json(input)
            .send()
            .await
            .map_err(ClientError::Network)?;

        let record: DateRecord = decode(response, "Update failed").await?;
        info!(id = record.id, "Updated date");
        Ok(record)
    }

    pub async fn delete_date(&self, id: i64) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/api/dates/{}", id)))
            .send()
            .await
            .map_err(ClientError::Network)?;

        check(response, "Error deleting date").await?;
        info!(id, "Deleted date");
        Ok(())
    }
}

/// Turn a non-2xx response into [`ClientError::Server`].
async fn check(response: Response, fallback: &str) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());

    warn!(status = status.as_u16(), error = %message, "Dates service returned an error");
    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T, ClientError> {
    check(response, fallback)
        .await?
        .json::<T>()
        .await
        .map_err(ClientError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, RawQuery, State};
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::NaiveDate;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Serve `app` on an ephemeral port and return its base URL.
    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(base_url: &str) -> ApiClient {
        ApiClient::new(&ClientConfig::default().with_base_url(base_url)).unwrap()
    }

    fn record_json(id: i64, activity: &str, day: &str) -> Value {
        json!({
            "id": id,
            "activity_name": activity,
            "location": "Park",
            "date_day": day,
            "rating": null,
            "notes": "",
            "photos": []
        })
    }

    type Seen = Arc<Mutex<Vec<String>>>;

    fn fake_service(seen: Seen) -> Router {
        Router::new()
            .route(
                "/api/dates",
                get(
                    |State(seen): State<Seen>, RawQuery(query): RawQuery| async move {
                        seen.lock().unwrap().push(query.unwrap_or_default());
                        Json(json!([
                            record_json(1, "Picnic", "Sun, 10 Mar 2024 00:00:00 GMT"),
                            record_json(2, "Dinner", "2024-03-11"),
                        ]))
                    },
                )
                .post(|Json(body): Json<Value>| async move {
                    let mut created = body.clone();
                    created["id"] = json!(10);
                    (StatusCode::CREATED, Json(created))
                }),
            )
            .route("/api/dates/count", get(|| async { Json(json!({"count": 3})) }))
            .route(
                "/api/dates/{id}",
                get(|Path(id): Path<i64>| async move {
                    if id == 1 {
                        Json(record_json(1, "Picnic", "2024-03-10")).into_response()
                    } else {
                        (StatusCode::NOT_FOUND, Json(json!({"error": "Date not found"})))
                            .into_response()
                    }
                })
                .put(|| async { (StatusCode::BAD_GATEWAY, "<html>upstream down</html>") })
                .delete(|| async { Json(json!({"message": "Date deleted successfully"})) }),
            )
            .with_state(seen)
    }

    #[tokio::test]
    async fn test_list_dates_sends_filter_and_parses_records() {
        let seen: Seen = Arc::default();
        let base = spawn(fake_service(seen.clone())).await;
        let client = client_for(&base);

        let filter = DateFilter {
            activity_name: Some("pic nic".into()),
            rating: Some(4),
            ..Default::default()
        };
        let records = client.list_dates(&filter).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].day(),
            Some(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
        );
        let queries = seen.lock().unwrap().clone();
        assert_eq!(queries, vec!["activity_name=pic+nic&rating=4".to_string()]);
    }

    #[tokio::test]
    async fn test_list_dates_without_filter_sends_no_query() {
        let seen: Seen = Arc::default();
        let base = spawn(fake_service(seen.clone())).await;

        client_for(&base)
            .list_dates(&DateFilter::default())
            .await
            .unwrap();

        assert_eq!(seen.lock().unwrap().clone(), vec![String::new()]);
    }

    #[tokio::test]
    async fn test_count_dates() {
        let base = spawn(fake_service(Arc::default())).await;
        assert_eq!(client_for(&base).count_dates().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_get_date_not_found_uses_error_body() {
        let base = spawn(fake_service(Arc::default())).await;
        let client = client_for(&base);

        assert_eq!(client.get_date(1).await.unwrap().activity_name, "Picnic");

        let err = client.get_date(99).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.user_message(), "Date not found");
    }

    #[tokio::test]
    async fn test_create_date_posts_payload() {
        let base = spawn(fake_service(Arc::default())).await;
        let mut input = DateInput::new(
            "Museum".into(),
            "Downtown".into(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        );
        input.rating = Some(5);

        let created = client_for(&base).create_date(&input).await.unwrap();

        assert_eq!(created.id, 10);
        assert_eq!(created.activity_name, "Museum");
        assert_eq!(created.rating, Some(5));
        assert_eq!(created.date_day, "2024-06-01");
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_service() {
        // Nothing listens here: a request would fail with a network error
        let client = client_for("http://127.0.0.1:9");
        let input = DateInput::new(
            String::new(),
            "Downtown".into(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        );

        let err = client.create_date(&input).await.unwrap_err();
        assert!(err.is_validation());
        let err = client.update_date(1, &input).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_non_json_error_body_falls_back() {
        let base = spawn(fake_service(Arc::default())).await;
        let input = DateInput::new(
            "Museum".into(),
            "Downtown".into(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        );

        let err = client_for(&base).update_date(1, &input).await.unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.user_message(), "Update failed");
    }

    #[tokio::test]
    async fn test_delete_date() {
        let base = spawn(fake_service(Arc::default())).await;
        assert!(client_for(&base).delete_date(1).await.is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(&format!("http://{}", addr))
            .list_dates(&DateFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }

    #[tokio::test]
    async fn test_request_deadline() {
        let app = Router::new().route(
            "/api/dates",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!([]))
            }),
        );
        let base = spawn(app).await;
        let config = ClientConfig {
            timeout: Duration::from_millis(200),
            ..ClientConfig::default().with_base_url(&base)
        };

        let err = ApiClient::new(&config)
            .unwrap()
            .list_dates(&DateFilter::default())
            .await
            .unwrap_err();
        match err {
            ClientError::Network(e) => assert!(e.is_timeout()),
            other => panic!("expected network failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_keeps_session_cookie() {
        let app = Router::new()
            .route(
                "/api/login",
                axum::routing::post(|Json(body): Json<Value>| async move {
                    if body["username"] == "ada" && body["password"] == "secret" {
                        (
                            [(header::SET_COOKIE, "session=abc; Path=/")],
                            Json(json!({"message": "Login successful"})),
                        )
                            .into_response()
                    } else {
                        (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({"error": "Invalid username or password"})),
                        )
                            .into_response()
                    }
                }),
            )
            .route(
                "/api/dates/count",
                get(|headers: HeaderMap| async move {
                    let authed = headers
                        .get(header::COOKIE)
                        .and_then(|v| v.to_str().ok())
                        .map(|v| v.contains("session=abc"))
                        .unwrap_or(false);
                    if authed {
                        Json(json!({"count": 1})).into_response()
                    } else {
                        (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"})))
                            .into_response()
                    }
                }),
            );
        let base = spawn(app).await;

        let anonymous = client_for(&base);
        assert_eq!(anonymous.count_dates().await.unwrap_err().status(), Some(401));

        let config = ClientConfig {
            credentials: Some(Credentials {
                username: "ada".into(),
                password: "secret".into(),
            }),
            ..ClientConfig::default().with_base_url(&base)
        };
        let client = ApiClient::connect(&config).await.unwrap();
        assert_eq!(client.count_dates().await.unwrap(), 1);

        let wrong = ClientConfig {
            credentials: Some(Credentials {
                username: "ada".into(),
                password: "nope".into(),
            }),
            ..ClientConfig::default().with_base_url(&base)
        };
        let err = ApiClient::connect(&wrong).await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid username or password");
    }

    #[test]
    fn test_photo_url() {
        let client = client_for("http://dates.local");
        let photo = Photo {
            id: Some(1),
            filename: "a.jpg".into(),
            filepath: "uploads/a.jpg".into(),
        };
        assert_eq!(client.photo_url(&photo), "http://dates.local/uploads/a.jpg");
    }
}
