use chrono::NaiveDate;
use postino::DateRecord;

/// Records split around today.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partitioned<'a> {
    /// `date_day >= today`, earliest first
    pub future: Vec<&'a DateRecord>,
    /// `date_day < today`, most recent first
    pub past: Vec<&'a DateRecord>,
}

impl Partitioned<'_> {
    pub fn len(&self) -> usize {
        self.future.len() + self.past.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep only the records `keep` accepts, in their current order.
    pub fn retain(&mut self, mut keep: impl FnMut(&DateRecord) -> bool) {
        self.future.retain(|r| keep(*r));
        self.past.retain(|r| keep(*r));
    }
}

/// Case-insensitive match of `term` against the text shown on a dashboard
/// card: activity, location, who added it and the day.
pub fn matches_search(record: &DateRecord, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    let day = record
        .day()
        .map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_default();
    [
        record.activity_name.as_str(),
        record.location.as_str(),
        record.created_by_name.as_deref().unwrap_or_default(),
        record.date_day.as_str(),
        day.as_str(),
    ]
    .iter()
    .any(|text| text.to_lowercase().contains(&term))
}

/// Split records into upcoming and past dates. Today counts as upcoming.
///
/// Sorting is stable, so records on the same day keep their input order in
/// both lists. Records with an unparseable `date_day` are dropped.
pub fn partition_by_day(records: &[DateRecord], today: NaiveDate) -> Partitioned<'_> {
    let mut future: Vec<(NaiveDate, &DateRecord)> = Vec::new();
    let mut past: Vec<(NaiveDate, &DateRecord)> = Vec::new();

    for record in records {
        match record.day() {
            Some(day) if day >= today => future.push((day, record)),
            Some(day) => past.push((day, record)),
            None => {}
        }
    }

    future.sort_by_key(|(day, _)| *day);
    past.sort_by(|a, b| b.0.cmp(&a.0));

    Partitioned {
        future: future.into_iter().map(|(_, r)| r).collect(),
        past: past.into_iter().map(|(_, r)| r).collect(),
    }
}
