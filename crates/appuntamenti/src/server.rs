use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use chrono::NaiveDate;
use postino::{parse_date_day, DateFilter, DateRecord};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::grid::{build_month_grid, MonthView};
use crate::html::{self, CalendarPage, DashboardPage, FormPage, PageOptions};
use crate::partition::{matches_search, partition_by_day};
use crate::view::{today, RecordForm, ViewController};

/// Application state shared across requests
pub struct AppState {
    pub controller: ViewController,
    pub page: PageOptions,
}

/// Load both views, start the poller and serve until interrupted
pub async fn serve(port: u16, state: Arc<AppState>, poll_every: Duration) -> anyhow::Result<()> {
    info!("Loading dates...");
    if let Err(e) = state.controller.reload_all().await {
        // Start anyway; the poller keeps trying
        warn!(error = %e, "Initial load failed");
    }

    start_poller(state.clone(), poll_every);

    let app = router(state);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!(url = %format!("http://{}", addr), "Server running");
    info!(secs = poll_every.as_secs(), "Polling the dates service");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/calendar", get(calendar_handler))
        .route("/dates", post(create_handler))
        .route("/dates/new", get(new_form_handler))
        .route("/dates/{id}", get(edit_form_handler).post(update_handler))
        .route("/dates/{id}/delete", post(delete_handler))
        .route("/api/dates", get(dates_handler))
        .route("/api/refresh", get(refresh_handler))
        .with_state(state)
}

/// Reload every view on a fixed period so changes made elsewhere show up
fn start_poller(state: Arc<AppState>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // First tick fires immediately and the initial load already ran
        ticker.tick().await;
        loop {
            ticker.tick().await;
            debug!("Polling dates service");
            if let Err(e) = state.controller.reload_all().await {
                warn!(error = %e, "Poll failed, showing previous data");
            }
        }
    })
}

/// Dashboard query string, every field as typed
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    activity_name: Option<String>,
    location: Option<String>,
    rating: Option<String>,
    date_day: Option<String>,
    /// Free-text search over the fetched cards, applied locally
    q: Option<String>,
}

impl FilterParams {
    /// Blank or unparseable fields are dropped.
    fn to_filter(&self) -> DateFilter {
        let text = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        DateFilter {
            activity_name: text(&self.activity_name),
            location: text(&self.location),
            rating: self
                .rating
                .as_deref()
                .and_then(|r| r.trim().parse().ok())
                .filter(|r| (1..=5).contains(r)),
            date_day: self.date_day.as_deref().and_then(parse_date_day),
        }
    }

    fn search(&self) -> &str {
        self.q.as_deref().map(str::trim).unwrap_or_default()
    }

    /// Message for a non-blank `date_day` that was dropped from the filter.
    fn date_problem(&self) -> Option<String> {
        let raw = self.date_day.as_deref().map(str::trim).unwrap_or_default();
        (!raw.is_empty() && parse_date_day(raw).is_none())
            .then(|| format!("Ignored date filter \"{}\": expected YYYY-MM-DD", raw))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CalendarParams {
    year: Option<i32>,
    /// 0-based
    month: Option<u32>,
}

impl CalendarParams {
    /// Requested month, or the one containing `today`.
    fn month_view(&self, today: NaiveDate) -> MonthView {
        match (self.year, self.month) {
            (Some(year), Some(month)) => {
                MonthView::new(year, month).unwrap_or_else(|| MonthView::containing(today))
            }
            _ => MonthView::containing(today),
        }
    }
}

async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> Html<String> {
    let filter = params.to_filter();
    let failure = state.controller.ensure_filter(filter).await.err();

    let dashboard = state.controller.dashboard_snapshot().await;
    let snapshot = &dashboard.snapshot;
    let search = params.search();
    let mut parts = partition_by_day(&snapshot.records, today());
    if !search.is_empty() {
        parts.retain(|r| matches_search(r, search));
    }

    let notices: Vec<String> = [
        failure
            .map(|e| e.user_message())
            .or_else(|| snapshot.last_error.clone()),
        params.date_problem(),
    ]
    .into_iter()
    .flatten()
    .collect();
    let notice = notices.join(". ");

    let markup = html::render_dashboard(
        &DashboardPage {
            parts: &parts,
            // Filter the shown records were fetched with
            filter: &snapshot.filter,
            search,
            total: dashboard.total,
            notice: (!notice.is_empty()).then_some(notice.as_str()),
        },
        state.page,
    );
    Html(markup.into_string())
}

async fn calendar_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CalendarParams>,
) -> Html<String> {
    let today = today();
    let month = params.month_view(today);
    let snapshot = state.controller.calendar_snapshot().await;
    let grid = build_month_grid(month, &snapshot.records, today);
    debug!(month = %grid.label, events = grid.event_count(), "Rendering calendar");

    let markup = html::render_calendar(
        &CalendarPage {
            grid: &grid,
            notice: snapshot.last_error.as_deref(),
        },
        state.page,
    );
    Html(markup.into_string())
}

fn render_form_page(
    state: &AppState,
    id: Option<i64>,
    form: &RecordForm,
    record: Option<&DateRecord>,
    error: Option<&str>,
) -> Html<String> {
    let photos = record
        .map(|r| {
            r.photos
                .iter()
                .map(|p| (state.controller.api().photo_url(p), p.filename.clone()))
                .collect()
        })
        .unwrap_or_default();

    let markup = html::render_form(
        &FormPage {
            id,
            form,
            notes_edited_by: record.and_then(|r| r.notes_edited_by_name.as_deref()),
            photos,
            error,
        },
        state.page,
    );
    Html(markup.into_string())
}

async fn new_form_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    render_form_page(&state, None, &RecordForm::default(), None, None)
}

async fn edit_form_handler(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    match state.controller.load_record(id).await {
        Ok(record) => {
            let form = RecordForm::from_record(&record);
            render_form_page(&state, Some(id), &form, Some(&record), None).into_response()
        }
        Err(e) => {
            let message = e.user_message();
            render_form_page(&state, Some(id), &RecordForm::default(), None, Some(&message))
                .into_response()
        }
    }
}

async fn create_handler(State(state): State<Arc<AppState>>, Form(form): Form<RecordForm>) -> Response {
    save(&state, None, form).await
}

async fn update_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(form): Form<RecordForm>,
) -> Response {
    save(&state, Some(id), form).await
}

async fn save(state: &AppState, id: Option<i64>, form: RecordForm) -> Response {
    let result = match form.to_input() {
        Ok(input) => state.controller.save(id, &input).await.map(|_| ()),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => {
            debug!(error = %e, "Save rejected");
            let message = e.user_message();
            // Keep what was typed, but show the stored photos and notes author
            let record = match id {
                Some(id) => state.controller.load_record(id).await.ok(),
                None => None,
            };
            render_form_page(state, id, &form, record.as_ref(), Some(&message)).into_response()
        }
    }
}

async fn delete_handler(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    match state.controller.delete(id).await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => {
            let message = format!("Error deleting date: {}", e.user_message());
            let record = state.controller.load_record(id).await.ok();
            let form = record.as_ref().map(RecordForm::from_record).unwrap_or_default();
            render_form_page(&state, Some(id), &form, record.as_ref(), Some(&message))
                .into_response()
        }
    }
}

/// Return the dashboard's current records as JSON
async fn dates_handler(State(state): State<Arc<AppState>>) -> Json<Vec<DateRecord>> {
    let dashboard = state.controller.dashboard_snapshot().await;
    Json(dashboard.snapshot.records.to_vec())
}

/// Reload from the dates service (manual trigger)
async fn refresh_handler(State(state): State<Arc<AppState>>) -> &'static str {
    info!("Manual refresh triggered");

    match state.controller.reload_all().await {
        Ok(()) => "OK",
        Err(e) => {
            warn!(error = %e, "Refresh failed");
            "ERROR"
        }
    }
}
