//! Plain-text rendering for the terminal.

use postino::DateRecord;

use crate::grid::{MonthGrid, WEEKDAY_HEADERS};
use crate::partition::Partitioned;

const CELL_WIDTH: usize = 5;

/// Month grid followed by the events of each day.
///
/// Days with events carry a `*`; today is bracketed.
pub fn render_month(grid: &MonthGrid) -> String {
    let width = CELL_WIDTH * WEEKDAY_HEADERS.len();
    let mut lines = vec![format!("{:^width$}", grid.label, width = width)];

    lines.push(
        WEEKDAY_HEADERS
            .iter()
            .map(|h| format!("{:^w$}", h, w = CELL_WIDTH))
            .collect(),
    );

    for week in grid.weeks() {
        let row: String = week
            .iter()
            .map(|cell| match cell.day {
                Some(day) => {
                    let marker = if cell.events.is_empty() { ' ' } else { '*' };
                    let body = format!("{:>2}{}", day, marker);
                    if cell.is_today {
                        format!("[{}]", body)
                    } else {
                        format!(" {} ", body)
                    }
                }
                None => " ".repeat(CELL_WIDTH),
            })
            .collect();
        lines.push(row.trim_end().to_string());
    }

    let events: Vec<String> = grid
        .cells
        .iter()
        .filter_map(|cell| cell.day.map(|day| (day, &cell.events)))
        .flat_map(|(day, events)| {
            events
                .iter()
                .map(move |r| format!("{:>4}  {}", day, describe(r)))
        })
        .collect();

    if !events.is_empty() {
        lines.push(String::new());
        lines.extend(events);
    }

    lines.join("\n")
}

/// Upcoming and past sections, as on the dashboard.
pub fn render_partition(parts: &Partitioned) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Upcoming ({})", parts.future.len()));
    if parts.future.is_empty() {
        lines.push("  No future dates".to_string());
    }
    lines.extend(parts.future.iter().map(|r| list_line(r)));

    lines.push(String::new());
    lines.push(format!("Past ({})", parts.past.len()));
    if parts.past.is_empty() {
        lines.push("  No past dates".to_string());
    }
    lines.extend(parts.past.iter().map(|r| list_line(r)));

    lines.join("\n")
}

/// Every field of one record; `photo_urls` pairs with `record.photos`.
pub fn render_record(record: &DateRecord, photo_urls: &[String]) -> String {
    let mut lines = vec![
        format!("#{} {}", record.id, record.activity_name),
        format!("  Date:      {}", display_day(record)),
        format!("  Location:  {}", record.location),
        format!(
            "  Rating:    {}",
            record.stars().unwrap_or_else(|| "No rating".to_string())
        ),
    ];
    if let Some(name) = &record.created_by_name {
        lines.push(format!("  Added by:  {}", name));
    }
    if !record.notes.trim().is_empty() {
        lines.push(format!("  Notes:     {}", record.notes.trim()));
        if let Some(name) = &record.notes_edited_by_name {
            lines.push(format!("             (edited by {})", name));
        }
    }
    for (photo, url) in record.photos.iter().zip(photo_urls) {
        lines.push(format!("  Photo:     {} <{}>", photo.filename, url));
    }
    lines.join("\n")
}

fn display_day(record: &DateRecord) -> String {
    record
        .day()
        .map(|d| d.format("%a %b %-d, %Y").to_string())
        .unwrap_or_else(|| record.date_day.clone())
}

fn describe(record: &DateRecord) -> String {
    let mut text = format!("{} @ {}", record.activity_name, record.location);
    if let Some(stars) = record.stars() {
        text.push_str("  ");
        text.push_str(&stars);
    }
    text
}

fn list_line(record: &DateRecord) -> String {
    let day = record
        .day()
        .map(|d| d.format("%b %e, %Y").to_string())
        .unwrap_or_default();
    format!("  {:<13} {}  [#{}]", day, describe(record), record.id)
}
