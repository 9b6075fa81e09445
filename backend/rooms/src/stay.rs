use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::error::RoomsError;

/// Half-open day range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stay {
    start: NaiveDate,
    end: NaiveDate,
}

impl Stay {
    pub fn new(start: NaiveDate, end: NaiveDate, max_days: u32) -> Result<Self, RoomsError> {
        if end <= start {
            return Err(RoomsError::invalid(
                "end_date",
                format!("{end} must be after {start}"),
            ));
        }

        let stay = Self { start, end };
        if stay.nights() > max_days {
            return Err(RoomsError::invalid(
                "end_date",
                format!("stay of {} days exceeds the {max_days} day limit", stay.nights()),
            ));
        }

        Ok(stay)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn nights(&self) -> u32 {
        (self.end - self.start).num_days() as u32
    }

    pub fn overlaps(&self, other: &Stay) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day < self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day < end)
    }

    /// Window of `days` days starting at `start`, used for calendar views.
    pub fn window(start: NaiveDate, days: u32) -> Result<Self, RoomsError> {
        let end = start
            .checked_add_days(Days::new(u64::from(days.max(1))))
            .ok_or_else(|| RoomsError::invalid("to", "date out of range"))?;

        Ok(Self { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn checkout_day_is_excluded() {
        let stay = Stay::new(date(2025, 1, 30), date(2025, 2, 2), 366).unwrap();
        let days: Vec<_> = stay.days().collect();

        assert_eq!(days, vec![date(2025, 1, 30), date(2025, 1, 31), date(2025, 2, 1)]);
        assert_eq!(stay.nights(), 3);
        assert!(!stay.contains(date(2025, 2, 2)));
    }

    #[test]
    fn rejects_empty_and_reversed_ranges() {
        assert!(Stay::new(date(2025, 1, 1), date(2025, 1, 1), 366).is_err());
        assert!(Stay::new(date(2025, 1, 5), date(2025, 1, 1), 366).is_err());
    }

    #[test]
    fn enforces_length_limit() {
        assert!(Stay::new(date(2025, 1, 1), date(2025, 1, 31), 30).is_ok());

        let err = Stay::new(date(2025, 1, 1), date(2025, 2, 1), 30).unwrap_err();
        assert!(err.to_string().contains("31 days"));
    }

    #[test]
    fn back_to_back_stays_do_not_overlap() {
        let first = Stay::new(date(2025, 1, 1), date(2025, 2, 1), 366).unwrap();
        let second = Stay::new(date(2025, 2, 1), date(2025, 3, 1), 366).unwrap();
        let inside = Stay::new(date(2025, 1, 15), date(2025, 1, 20), 366).unwrap();

        assert!(!first.overlaps(&second));
        assert!(first.overlaps(&inside));
        assert!(inside.overlaps(&first));
    }

    #[test]
    fn window_covers_whole_days() {
        let window = Stay::window(date(2025, 2, 27), 3).unwrap();

        assert!(window.contains(date(2025, 3, 1)));
        assert!(!window.contains(date(2025, 3, 2)));
    }
}
