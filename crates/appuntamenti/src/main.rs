use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use postino::{ApiClient, ClientConfig, DateFilter, DateInput};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

mod grid;
mod html;
mod partition;
mod report;
mod server;
mod store;
mod view;

#[cfg(test)]
mod testing;

use grid::{build_month_grid, MonthView};
use html::{PageOptions, Theme};
use partition::partition_by_day;
use server::AppState;
use view::{today, ViewController};

#[derive(Parser, Debug)]
#[command(name = "appuntamenti")]
#[command(about = "Calendar and dashboard views for the dates tracker")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Base URL of the dates service (overrides DATES_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Per-request timeout in seconds (overrides DATES_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Stylesheet for the web views
    #[arg(long, value_enum, default_value_t = Theme::Material, global = true)]
    theme: Theme,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server (default)
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Seconds between background reloads
        #[arg(long, default_value = "30")]
        poll_secs: u64,
    },

    /// Print a month grid
    Calendar {
        /// Month to show (YYYY-MM). Default: the current month
        #[arg(long)]
        month: Option<String>,
    },

    /// Print upcoming and past dates
    List {
        #[arg(long)]
        activity: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        rating: Option<u8>,
        /// Exact day (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Print a single date with its notes and photos
    Show { id: i64 },

    /// Record a new date
    Add {
        #[arg(long)]
        activity: String,
        #[arg(long)]
        location: String,
        /// Day of the date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// 1 to 5
        #[arg(long)]
        rating: Option<u8>,
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Change fields of an existing date; omitted fields keep their value
    Edit {
        id: i64,
        #[command(flatten)]
        changes: EditChanges,
    },

    /// Delete a date
    Delete { id: i64 },
}

#[derive(clap::Args, Debug, Default)]
struct EditChanges {
    #[arg(long)]
    activity: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    rating: Option<u8>,
    /// Remove the rating
    #[arg(long, conflicts_with = "rating")]
    no_rating: bool,
    #[arg(long)]
    notes: Option<String>,
}

impl EditChanges {
    fn apply(self, input: &mut DateInput) {
        if let Some(activity) = self.activity {
            input.activity_name = activity;
        }
        if let Some(location) = self.location {
            input.location = location;
        }
        if let Some(date) = self.date {
            input.date_day = date;
        }
        if self.no_rating {
            input.rating = None;
        } else if self.rating.is_some() {
            input.rating = self.rating;
        }
        if let Some(notes) = self.notes {
            input.notes = notes;
        }
    }
}

fn init_tracing(log_level: &str) {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    for directive in ["hyper=warn", "reqwest=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_max_level(Level::TRACE)
        .init();
}

fn client_config(args: &Args) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("Failed to load configuration")?;
    if let Some(url) = &args.api_url {
        config = config.with_base_url(url);
    }
    if let Some(secs) = args.timeout_secs {
        if secs == 0 {
            bail!("--timeout-secs must be greater than zero");
        }
        config.timeout = Duration::from_secs(secs);
    }
    Ok(config)
}

/// `YYYY-MM`, with a 1-based month.
fn parse_month_arg(raw: &str) -> Result<MonthView> {
    let (year, month) = raw
        .trim()
        .split_once('-')
        .with_context(|| format!("Expected YYYY-MM, got {}", raw))?;
    let year: i32 = year
        .parse()
        .with_context(|| format!("Invalid year in {}", raw))?;
    let month: u32 = month
        .parse()
        .with_context(|| format!("Invalid month in {}", raw))?;
    month
        .checked_sub(1)
        .and_then(|m| MonthView::new(year, m))
        .with_context(|| format!("No such month: {}", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args.log_level);

    let config = client_config(&args)?;
    info!(url = %config.base_url, "Using dates service");
    let api = ApiClient::connect(&config)
        .await
        .context("Failed to open a session with the dates service")?;

    match args.command {
        // Default to serve if no command specified
        None => serve(api, args.theme, 8080, 30).await?,
        Some(Commands::Serve { port, poll_secs }) => {
            serve(api, args.theme, port, poll_secs).await?
        }
        Some(Commands::Calendar { month }) => {
            let today = today();
            let month = match month {
                Some(raw) => parse_month_arg(&raw)?,
                None => MonthView::containing(today),
            };
            let records = api
                .list_dates(&DateFilter::default())
                .await
                .context("Failed to load dates")?;
            let grid = build_month_grid(month, &records, today);
            println!("{}", report::render_month(&grid));
        }
        Some(Commands::List {
            activity,
            location,
            rating,
            date,
        }) => {
            let filter = DateFilter {
                activity_name: activity,
                location,
                rating,
                date_day: date,
            };
            let records = api.list_dates(&filter).await.context("Failed to load dates")?;
            let parts = partition_by_day(&records, today());
            if parts.is_empty() && !filter.is_empty() {
                info!(?filter, "No dates match the filter");
            }
            println!("{}", report::render_partition(&parts));
        }
        Some(Commands::Show { id }) => {
            let record = api
                .get_date(id)
                .await
                .with_context(|| format!("Failed to load date {}", id))?;
            let urls: Vec<String> = record.photos.iter().map(|p| api.photo_url(p)).collect();
            println!("{}", report::render_record(&record, &urls));
        }
        Some(Commands::Add {
            activity,
            location,
            date,
            rating,
            notes,
        }) => {
            let input = DateInput {
                rating,
                notes,
                ..DateInput::new(activity, location, date)
            };
            let created = api.create_date(&input).await.context("Failed to add date")?;
            info!(id = created.id, activity = %created.activity_name, "Date added");
        }
        Some(Commands::Edit { id, changes }) => {
            let current = api
                .get_date(id)
                .await
                .with_context(|| format!("Failed to load date {}", id))?;
            let mut input = DateInput::from_record(&current)?;
            changes.apply(&mut input);
            let updated = api
                .update_date(id, &input)
                .await
                .context("Failed to update date")?;
            info!(id = updated.id, activity = %updated.activity_name, "Date updated");
        }
        Some(Commands::Delete { id }) => {
            api.delete_date(id)
                .await
                .with_context(|| format!("Failed to delete date {}", id))?;
            info!(id, "Date deleted");
        }
    }

    Ok(())
}

async fn serve(api: ApiClient, theme: Theme, port: u16, poll_secs: u64) -> Result<()> {
    if poll_secs == 0 {
        bail!("--poll-secs must be greater than zero");
    }
    let state = Arc::new(AppState {
        controller: ViewController::new(api),
        page: PageOptions {
            theme,
            refresh_secs: Some(poll_secs),
        },
    });
    server::serve(port, state, Duration::from_secs(poll_secs)).await
}
