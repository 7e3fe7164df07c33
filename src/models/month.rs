use chrono::{Datelike, Months, NaiveDate};

/// Calendar month used as the partition key for all aggregation.
/// Displays and parses as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub(crate) fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub(crate) fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Accepts `YYYY-MM` or a full `YYYY-MM-DD` (only the first 7 characters count).
    pub(crate) fn parse(s: &str) -> Option<Self> {
        let (year, month) = s.trim().get(..7)?.split_once('-')?;
        if year.len() != 4 || month.len() != 2 {
            return None;
        }
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }

    pub(crate) fn current() -> Self {
        Self::from_date(chrono::Local::now().date_naive())
    }

    pub(crate) fn month(&self) -> u32 {
        self.month
    }

    pub(crate) fn first_day(&self) -> NaiveDate {
        // Constructors only admit valid months
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub(crate) fn days_in_month(&self) -> u32 {
        let first = self.first_day();
        first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .map_or(31, |last| last.day())
    }

    pub(crate) fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub(crate) fn next(&self) -> Self {
        self.first_day()
            .checked_add_months(Months::new(1))
            .map_or(*self, Self::from_date)
    }

    pub(crate) fn prev(&self) -> Self {
        self.first_day()
            .checked_sub_months(Months::new(1))
            .map_or(*self, Self::from_date)
    }

    /// The `count` months strictly before this one, oldest first.
    pub(crate) fn preceding(&self, count: usize) -> Vec<MonthKey> {
        let mut months = Vec::with_capacity(count);
        let mut cursor = *self;
        for _ in 0..count {
            cursor = cursor.prev();
            months.push(cursor);
        }
        months.reverse();
        months
    }

    /// Long display form, e.g. "October 2026".
    pub(crate) fn long_name(&self) -> String {
        self.first_day().format("%B %Y").to_string()
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for MonthKey {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::error::ValidationError::InvalidMonth(s.to_string()))
    }
}
