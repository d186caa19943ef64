use maud::{html, Markup, PreEscaped, DOCTYPE};
use postino::{DateFilter, DateRecord};

use crate::grid::{MonthGrid, MonthView, WEEKDAY_HEADERS};
use crate::partition::Partitioned;
use crate::view::RecordForm;

/// Stylesheet choice. Markup is the same for every theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Theme {
    /// Rounded cards and gradients
    #[default]
    Material,
    /// Flat, high-contrast
    Minimal,
}

impl Theme {
    fn css(self) -> &'static str {
        match self {
            Theme::Material => MATERIAL_CSS,
            Theme::Minimal => MINIMAL_CSS,
        }
    }

    fn body_class(self) -> &'static str {
        match self {
            Theme::Material => "theme-material",
            Theme::Minimal => "theme-minimal",
        }
    }
}

/// Options shared by every page
#[derive(Debug, Clone, Copy)]
pub struct PageOptions {
    pub theme: Theme,
    /// Reload list pages in the browser this often
    pub refresh_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nav {
    Dashboard,
    Calendar,
    Form,
}

pub struct DashboardPage<'a> {
    pub parts: &'a Partitioned<'a>,
    pub filter: &'a DateFilter,
    /// Local free-text search, empty for none
    pub search: &'a str,
    /// Records in the service, ignoring the filter
    pub total: Option<u64>,
    pub notice: Option<&'a str>,
}

pub struct CalendarPage<'a> {
    pub grid: &'a MonthGrid<'a>,
    pub notice: Option<&'a str>,
}

pub struct FormPage<'a> {
    /// `None` when creating
    pub id: Option<i64>,
    pub form: &'a RecordForm,
    pub notes_edited_by: Option<&'a str>,
    /// (url, filename)
    pub photos: Vec<(String, String)>,
    pub error: Option<&'a str>,
}

fn layout(options: PageOptions, title: &str, active: Nav, content: Markup) -> Markup {
    let refresh = options.refresh_secs.filter(|_| active != Nav::Form);
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                @if let Some(secs) = refresh {
                    meta http-equiv="refresh" content=(secs);
                }
                title { (title) " · Dates" }
                style { (PreEscaped(BASE_CSS)) (PreEscaped(options.theme.css())) }
            }
            body class=(options.theme.body_class()) {
                nav.topbar {
                    a.brand href="/" { "Dates" }
                    a.active[active == Nav::Dashboard] href="/" { "Dashboard" }
                    a.active[active == Nav::Calendar] href="/calendar" { "Calendar" }
                    a.button href="/dates/new" { "Add date" }
                }
                main.container { (content) }
            }
        }
    }
}

fn render_notice(notice: Option<&str>) -> Markup {
    html! {
        @if let Some(message) = notice {
            div.notice role="alert" { (message) }
        }
    }
}

fn record_href(record: &DateRecord) -> String {
    format!("/dates/{}", record.id)
}

fn month_href(month: MonthView) -> String {
    format!("/calendar?year={}&month={}", month.year(), month.month())
}

pub fn render_dashboard(page: &DashboardPage, options: PageOptions) -> Markup {
    let shown = page.parts.len();
    let filter = page.filter;
    let rating = filter.rating.map(|r| r.to_string()).unwrap_or_default();
    let date_day = filter
        .date_day
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();

    let content = html! {
        h1 { "Our dates" }
        div.stats {
            "Showing " span #"shown-count" { (shown) }
            @if let Some(total) = page.total {
                " of " span #"total-count" { (total) }
            }
            " dates"
        }
        (render_notice(page.notice))
        form.filters method="get" action="/" {
            input type="search" name="q" placeholder="Search"
                value=(page.search);
            input type="text" name="activity_name" placeholder="Activity"
                value=(filter.activity_name.as_deref().unwrap_or_default());
            input type="text" name="location" placeholder="Location"
                value=(filter.location.as_deref().unwrap_or_default());
            select name="rating" {
                option value="" selected[rating.is_empty()] { "Any rating" }
                @for n in 1..=5u8 {
                    option value=(n) selected[rating == n.to_string()] { (n) " ★" }
                }
            }
            input type="date" name="date_day" value=(date_day);
            button type="submit" { "Filter" }
            a.clear href="/" { "Clear" }
        }
        div.lists {
            section.date-list #"future-dates" {
                h2 { "Upcoming" }
                @if page.parts.future.is_empty() {
                    div.empty-state { "No future dates" }
                } @else {
                    @for record in &page.parts.future {
                        (render_card(record))
                    }
                }
            }
            section.date-list #"past-dates" {
                h2 { "Past" }
                @if page.parts.past.is_empty() {
                    div.empty-state { "No past dates" }
                } @else {
                    @for record in &page.parts.past {
                        (render_card(record))
                    }
                }
            }
        }
    };

    layout(options, "Dashboard", Nav::Dashboard, content)
}

fn render_card(record: &DateRecord) -> Markup {
    let when = record
        .day()
        .map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| record.date_day.clone());

    html! {
        a.date-card href=(record_href(record)) {
            div.card-head {
                h3 { (record.activity_name) }
                small.when { (when) }
            }
            p.card-meta {
                span.location { (record.location) }
                @if let Some(stars) = record.stars() {
                    " | " span.stars { (stars) }
                }
                @if !record.photos.is_empty() {
                    " | " span.photos { (record.photos.len()) " 📷" }
                }
            }
            @if let Some(name) = &record.created_by_name {
                small.added-by { "Added by " (name) }
            }
        }
    }
}

pub fn render_calendar(page: &CalendarPage, options: PageOptions) -> Markup {
    let grid = page.grid;
    let content = html! {
        div.calendar-head {
            @if let Some(prev) = grid.month.prev() {
                a.nav-arrow #"prev-month" href=(month_href(prev)) { "‹" }
            }
            h1 #"current-month-year" { (grid.label) }
            @if let Some(next) = grid.month.next() {
                a.nav-arrow #"next-month" href=(month_href(next)) { "›" }
            }
            a.today-link href="/calendar" { "Today" }
        }
        (render_notice(page.notice))
        div.calendar #"calendar" {
            @for header in WEEKDAY_HEADERS {
                div.weekday { (header) }
            }
            @for cell in &grid.cells {
                @if let Some(day) = cell.day {
                    div.calendar-day.today[cell.is_today] {
                        div.day-number { (day) }
                        @for event in &cell.events {
                            a.event href=(record_href(event))
                                title={ (event.activity_name) " - " (event.location) } {
                                (event.activity_name)
                            }
                        }
                    }
                } @else {
                    div.calendar-day.padding {}
                }
            }
        }
    };

    layout(options, &grid.label, Nav::Calendar, content)
}

pub fn render_form(page: &FormPage, options: PageOptions) -> Markup {
    let form = page.form;
    let (title, action) = match page.id {
        Some(id) => ("Edit Date", format!("/dates/{}", id)),
        None => ("Add New Date", "/dates".to_string()),
    };
    let show_notes_meta = !form.notes.trim().is_empty();

    let content = html! {
        h1 #"modal-title" { (title) }
        (render_notice(page.error))
        form.record-form #"date-form" method="post" action=(action) {
            label for="activity-name" { "Activity" }
            input #"activity-name" type="text" name="activity_name" required
                value=(form.activity_name);
            label for="location" { "Location" }
            input #"location" type="text" name="location" required value=(form.location);
            label for="date-day" { "Date" }
            input #"date-day" type="date" name="date_day" required value=(form.date_day);
            label for="rating" { "Rating" }
            select #"rating" name="rating" {
                option value="" selected[form.rating.is_empty()] { "No rating" }
                @for n in 1..=5u8 {
                    option value=(n) selected[form.rating == n.to_string()] { (n) " ★" }
                }
            }
            label for="notes" { "Notes" }
            textarea #"notes" name="notes" rows="4" { (form.notes) }
            @if let (true, Some(name)) = (show_notes_meta, page.notes_edited_by) {
                small #"notes-meta" { "Notes edited by " (name) }
            }
            div.form-actions {
                button type="submit" { "Save" }
                a href="/" { "Cancel" }
            }
        }
        @if let Some(id) = page.id {
            section #"photos-section" {
                h2 { "Photos" }
                @if page.photos.is_empty() {
                    div.empty-state { "No photos yet" }
                } @else {
                    div.photos #"photos-container" {
                        @for (url, filename) in &page.photos {
                            img src=(url) alt=(filename);
                        }
                    }
                }
            }
            form.delete-form method="post" action={ "/dates/" (id) "/delete" }
                onsubmit="return confirm('Are you sure you want to delete this date?');" {
                button.danger #"delete-date-btn" type="submit" { "Delete" }
            }
        }
    };

    layout(options, title, Nav::Form, content)
}

const BASE_CSS: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body { min-height: 100vh; line-height: 1.4; }
.topbar { display: flex; gap: 16px; align-items: center; padding: 12px 24px; }
.topbar .brand { font-weight: 900; margin-right: auto; }
.container { max-width: 1100px; margin: 0 auto; padding: 32px 24px 60px; }
.stats { margin: 4px 0 24px; font-size: 0.85em; text-transform: uppercase; letter-spacing: 0.08em; }
.notice { padding: 12px 16px; margin-bottom: 20px; }
.filters { display: flex; flex-wrap: wrap; gap: 8px; margin-bottom: 28px; }
.lists { display: grid; grid-template-columns: 1fr 1fr; gap: 32px; }
.date-card { display: block; padding: 14px 16px; margin-bottom: 10px; text-decoration: none; }
.card-head { display: flex; justify-content: space-between; gap: 12px; }
.card-meta { margin-top: 4px; font-size: 0.9em; }
.added-by { font-size: 0.75em; }
.empty-state { padding: 24px; text-align: center; }
.calendar-head { display: flex; align-items: center; gap: 16px; margin-bottom: 20px; }
.calendar { display: grid; grid-template-columns: repeat(7, 1fr); gap: 8px; }
.weekday { text-align: center; font-weight: 700; padding: 8px; }
.calendar-day { min-height: 100px; padding: 8px; }
.calendar-day.padding { opacity: 0.3; }
.day-number { font-weight: 700; margin-bottom: 4px; }
.event { display: block; font-size: 0.75em; padding: 2px 4px; margin-bottom: 2px; text-decoration: none; overflow: hidden; white-space: nowrap; text-overflow: ellipsis; }
.record-form { display: grid; gap: 8px; max-width: 520px; }
.form-actions { display: flex; gap: 12px; margin-top: 12px; }
.photos { display: grid; grid-template-columns: repeat(3, 1fr); gap: 12px; }
.photos img { width: 100%; }
#photos-section, .delete-form { margin-top: 32px; }
@media (max-width: 768px) { .lists { grid-template-columns: 1fr; } }
"#;

const MATERIAL_CSS: &str = r#"
body { font-family: 'Roboto', -apple-system, BlinkMacSystemFont, sans-serif; background: #f0f2f5; color: #344767; }
.topbar { background: #fff; box-shadow: 0 2px 12px rgba(0,0,0,0.08); }
.topbar a { color: #344767; text-decoration: none; }
.topbar a.active { font-weight: 700; color: #7b4ce0; }
.button, button { background: linear-gradient(195deg, #667eea, #764ba2); color: #fff; border: 0; border-radius: 8px; padding: 8px 16px; cursor: pointer; }
.topbar a.button { color: #fff; }
input, select, textarea { border: 1px solid #d2d6da; border-radius: 8px; padding: 8px 12px; font: inherit; }
.notice { background: #fde8e8; color: #b42318; border-radius: 8px; }
.date-card { background: #fff; border-radius: 12px; color: inherit; box-shadow: 0 2px 8px rgba(0,0,0,0.06); }
.date-card:hover { transform: translateY(-1px); }
.stars { color: #fb8c00; }
.weekday { background: #e9ecef; border-radius: 8px; }
.calendar-day { background: #fff; border: 1px solid #e9ecef; border-radius: 12px; }
.calendar-day.today { background: linear-gradient(195deg, #667eea, #764ba2); color: #fff; border: 2px solid #667eea; }
.event { background: linear-gradient(195deg, #42424a, #191919); color: #fff; border-radius: 4px; }
.photos img { border-radius: 12px; }
button.danger { background: linear-gradient(195deg, #ef5350, #e53935); }
"#;

const MINIMAL_CSS: &str = r#"
body { font-family: system-ui, sans-serif; background: #fff; color: #111; }
.topbar { border-bottom: 2px solid #111; }
.topbar a { color: #111; }
.topbar a.active { text-decoration: underline; }
.button, button { background: #111; color: #fff; border: 0; padding: 8px 14px; cursor: pointer; }
.topbar a.button { color: #fff; text-decoration: none; }
input, select, textarea { border: 1px solid #111; padding: 6px 10px; font: inherit; }
.notice { border: 2px solid #c00; color: #c00; }
.date-card { border: 1px solid #111; color: inherit; }
.date-card:hover { background: #f4f4f4; }
.weekday { border-bottom: 1px solid #111; }
.calendar-day { border: 1px solid #ccc; }
.calendar-day.today { border: 2px solid #111; background: #ffd; }
.event { background: #111; color: #fff; }
button.danger { background: #c00; }
"#;
