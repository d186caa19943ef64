//! Month grid: six rows of seven days, Sunday first.

use chrono::{Datelike, Months, NaiveDate};
use postino::DateRecord;

/// Cells in every rendered month (6 rows x 7 columns)
pub const GRID_CELLS: usize = 42;

pub const WEEKDAY_HEADERS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A displayable month. Months are 0-based (0 = January).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonthView {
    first: NaiveDate,
}

impl MonthView {
    /// `None` when `month > 11` or the year is outside chrono's range.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if month > 11 {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month + 1, 1).map(|first| Self { first })
    }

    /// The month a given day falls in.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date - chrono::Duration::days(i64::from(date.day0())),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    /// 0-based month
    pub fn month(&self) -> u32 {
        self.first.month0()
    }

    /// Column of day 1, 0 = Sunday.
    pub fn first_weekday(&self) -> u32 {
        self.first.weekday().num_days_from_sunday()
    }

    /// Last day of the month, found as the day before the first of the next month.
    pub fn days_in_month(&self) -> u32 {
        self.first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .map(|last| last.day())
            // Only December of chrono's last representable year has no successor
            .unwrap_or(31)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month0() == self.month()
    }

    /// "<MonthName> <Year>"
    pub fn label(&self) -> String {
        format!("{} {}", MONTH_NAMES[self.month() as usize], self.year())
    }

    pub fn prev(&self) -> Option<Self> {
        self.first
            .checked_sub_months(Months::new(1))
            .map(|first| Self { first })
    }

    pub fn next(&self) -> Option<Self> {
        self.first
            .checked_add_months(Months::new(1))
            .map(|first| Self { first })
    }
}

/// One square of the grid. `day` is `None` for padding cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCell<'a> {
    pub day: Option<u32>,
    pub is_today: bool,
    pub events: Vec<&'a DateRecord>,
}

impl CalendarCell<'_> {
    fn padding() -> Self {
        Self {
            day: None,
            is_today: false,
            events: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid<'a> {
    pub month: MonthView,
    pub label: String,
    pub cells: Vec<CalendarCell<'a>>,
}

impl<'a> MonthGrid<'a> {
    /// Rows of seven cells.
    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarCell<'a>]> {
        self.cells.chunks(WEEKDAY_HEADERS.len())
    }

    pub fn event_count(&self) -> usize {
        self.cells.iter().map(|c| c.events.len()).sum()
    }
}

/// Lay out `records` on the 42-cell grid of `month`.
///
/// Records outside the month, or whose `date_day` does not parse, are left
/// out. Records on the same day keep their relative input order.
pub fn build_month_grid<'a>(
    month: MonthView,
    records: &'a [DateRecord],
    today: NaiveDate,
) -> MonthGrid<'a> {
    let leading = month.first_weekday() as usize;
    let days = month.days_in_month() as usize;
    assert!(
        leading + days <= GRID_CELLS,
        "{} starts at column {} with {} days, which does not fit {} cells",
        month.label(),
        leading,
        days,
        GRID_CELLS
    );

    let mut by_day: Vec<Vec<&DateRecord>> = vec![Vec::new(); days];
    for record in records {
        if let Some(date) = record.day() {
            if month.contains(date) {
                by_day[date.day0() as usize].push(record);
            }
        }
    }

    let today_in_month = month.contains(today).then(|| today.day());

    let mut cells = Vec::with_capacity(GRID_CELLS);
    cells.extend((0..leading).map(|_| CalendarCell::padding()));
    for (idx, events) in by_day.into_iter().enumerate() {
        let day = idx as u32 + 1;
        cells.push(CalendarCell {
            day: Some(day),
            is_today: today_in_month == Some(day),
            events,
        });
    }
    cells.resize_with(GRID_CELLS, CalendarCell::padding);

    MonthGrid {
        month,
        label: month.label(),
        cells,
    }
}
