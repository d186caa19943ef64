//! Ties the dates API, the record stores and the pure transforms together.
//!
//! The calendar works on the full record set and the dashboard on a filtered
//! one, so each gets its own store. Both are refreshed after every write and
//! on every poll tick.

use chrono::{Local, NaiveDate};
use postino::{parse_date_day, ApiClient, ClientError, DateFilter, DateInput, DateRecord};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::store::{DateRecordStore, RefreshOutcome, Snapshot};

/// Current local day.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Dashboard data: the filtered snapshot plus the unfiltered total.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub snapshot: Snapshot,
    pub total: Option<u64>,
}

pub struct ViewController {
    api: ApiClient,
    calendar: DateRecordStore,
    dashboard: DateRecordStore,
    total: RwLock<Option<u64>>,
}

impl ViewController {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            calendar: DateRecordStore::new("calendar", DateFilter::default()),
            dashboard: DateRecordStore::new("dashboard", DateFilter::default()),
            total: RwLock::new(None),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Refresh both stores with their current filters.
    ///
    /// Both refreshes run even if one fails; the first error is returned.
    pub async fn reload_all(&self) -> Result<(), ClientError> {
        let (calendar, dashboard, _) = tokio::join!(
            self.calendar.reload(&self.api),
            self.dashboard.reload(&self.api),
            self.refresh_total(),
        );
        calendar?;
        dashboard?;
        Ok(())
    }

    /// Refresh the dashboard for a new filter.
    pub async fn apply_filter(&self, filter: DateFilter) -> Result<RefreshOutcome, ClientError> {
        debug!(?filter, "Applying dashboard filter");
        let (outcome, _) = tokio::join!(
            self.dashboard.refresh(&self.api, filter),
            self.refresh_total()
        );
        outcome
    }

    /// Refresh the dashboard only when `filter` differs from the last request.
    pub async fn ensure_filter(&self, filter: DateFilter) -> Result<(), ClientError> {
        let loaded = self.dashboard.snapshot().await.is_loaded();
        if !loaded || self.dashboard.requested_filter().await != filter {
            self.apply_filter(filter).await?;
        }
        Ok(())
    }

    pub async fn calendar_snapshot(&self) -> Snapshot {
        self.calendar.snapshot().await
    }

    pub async fn dashboard_snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            snapshot: self.dashboard.snapshot().await,
            total: *self.total.read().await,
        }
    }

    /// One record with its photos, straight from the service.
    pub async fn load_record(&self, id: i64) -> Result<DateRecord, ClientError> {
        self.api.get_date(id).await
    }

    /// Create (`id == None`) or update a record, then reload the views.
    pub async fn save(&self, id: Option<i64>, input: &DateInput) -> Result<DateRecord, ClientError> {
        let record = match id {
            Some(id) => self.api.update_date(id, input).await?,
            None => self.api.create_date(input).await?,
        };
        self.after_write().await;
        Ok(record)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        self.api.delete_date(id).await?;
        self.after_write().await;
        Ok(())
    }

    async fn after_write(&self) {
        // The write went through; a failed reload only leaves stale lists
        if let Err(e) = self.reload_all().await {
            warn!(error = %e, "Reload after write failed");
        }
    }

    async fn refresh_total(&self) {
        match self.api.count_dates().await {
            Ok(count) => *self.total.write().await = Some(count),
            Err(e) => warn!(error = %e, "Failed to load record count"),
        }
    }
}

/// The create/edit form as submitted, every field as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RecordForm {
    pub activity_name: String,
    pub location: String,
    /// `YYYY-MM-DD`
    pub date_day: String,
    /// Empty for no rating
    pub rating: String,
    pub notes: String,
}

impl RecordForm {
    pub fn from_record(record: &DateRecord) -> Self {
        Self {
            activity_name: record.activity_name.clone(),
            location: record.location.clone(),
            date_day: record
                .day()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            rating: record.rating.map(|r| r.to_string()).unwrap_or_default(),
            notes: record.notes.clone(),
        }
    }

    pub fn to_input(&self) -> Result<DateInput, ClientError> {
        if self.date_day.trim().is_empty() {
            return Err(ClientError::Validation(
                "Activity name, location, and date are required".to_string(),
            ));
        }
        let date_day = parse_date_day(&self.date_day).ok_or_else(|| {
            ClientError::Validation(format!("Invalid date: {}", self.date_day.trim()))
        })?;

        let rating = match self.rating.trim() {
            "" => None,
            raw => Some(raw.parse::<u8>().map_err(|_| {
                ClientError::Validation(format!("Rating must be between 1 and 5, got {}", raw))
            })?),
        };

        let input = DateInput {
            activity_name: self.activity_name.clone(),
            location: self.location.clone(),
            date_day,
            rating,
            notes: self.notes.clone(),
        };
        input.validate()?;
        Ok(input)
    }
}
