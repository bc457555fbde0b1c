use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Raised when calendar arithmetic cannot make progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// Every weekday slot is non-working; no date stepping can terminate.
    NoWorkingDays { calendar_id: i32 },
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarError::NoWorkingDays { calendar_id } => {
                write!(f, "calendar {calendar_id} has no working weekday")
            }
        }
    }
}

impl std::error::Error for CalendarError {}

/// A named work-time definition: one working flag and one hours-per-day value
/// per weekday, plus explicit non-work exception dates. Activities reference
/// calendars by id; exactly one calendar per project carries the default flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCalendar {
    pub id: i32,
    pub name: String,
    /// Monday-first weekday slots.
    working: [bool; 7],
    hours_per_day: [f64; 7],
    exceptions: HashSet<NaiveDate>,
    pub is_default: bool,
}

impl WorkCalendar {
    pub const ALL_WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    const DEFAULT_HOURS: f64 = 8.0;

    /// Standard five-day calendar, Monday through Friday, eight hours per day.
    pub fn standard(id: i32, name: impl Into<String>) -> Self {
        let mut working = [false; 7];
        let mut hours = [0.0; 7];
        for slot in 0..5 {
            working[slot] = true;
            hours[slot] = Self::DEFAULT_HOURS;
        }
        Self {
            id,
            name: name.into(),
            working,
            hours_per_day: hours,
            exceptions: HashSet::new(),
            is_default: false,
        }
    }

    /// Calendar with an explicit set of working weekdays, eight hours each.
    pub fn custom<I>(id: i32, name: impl Into<String>, working_days: I) -> Self
    where
        I: IntoIterator<Item = Weekday>,
    {
        let mut working = [false; 7];
        let mut hours = [0.0; 7];
        for day in working_days {
            let slot = day.num_days_from_monday() as usize;
            working[slot] = true;
            hours[slot] = Self::DEFAULT_HOURS;
        }
        Self {
            id,
            name: name.into(),
            working,
            hours_per_day: hours,
            exceptions: HashSet::new(),
            is_default: false,
        }
    }

    /// Seven-day calendar with no non-working weekdays. Useful for networks
    /// expressed in plain day offsets.
    pub fn continuous(id: i32, name: impl Into<String>) -> Self {
        Self::custom(id, name, Self::ALL_WEEKDAYS)
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn set_weekday(&mut self, day: Weekday, working: bool, hours: f64) {
        let slot = day.num_days_from_monday() as usize;
        self.working[slot] = working;
        self.hours_per_day[slot] = if working { hours } else { 0.0 };
    }

    pub fn add_exception(&mut self, date: NaiveDate) {
        self.exceptions.insert(date);
    }

    pub fn add_exceptions(&mut self, dates: &[NaiveDate]) {
        self.exceptions.extend(dates);
    }

    pub fn working_weekdays(&self) -> Vec<Weekday> {
        Self::ALL_WEEKDAYS
            .into_iter()
            .filter(|day| self.working[day.num_days_from_monday() as usize])
            .collect()
    }

    pub fn hours_for(&self, day: Weekday) -> f64 {
        self.hours_per_day[day.num_days_from_monday() as usize]
    }

    /// A calendar every weekday of which is non-working can never terminate a
    /// date-stepping loop; reject it up front.
    pub fn validate(&self) -> Result<(), CalendarError> {
        if self.working.iter().any(|w| *w) {
            Ok(())
        } else {
            Err(CalendarError::NoWorkingDays {
                calendar_id: self.id,
            })
        }
    }

    /// Is `date` a work day under this calendar?
    pub fn is_work_day(&self, date: NaiveDate) -> bool {
        self.working[date.weekday().num_days_from_monday() as usize]
            && !self.exceptions.contains(&date)
    }

    /// Normalize `date` to itself or the next work day.
    pub fn roll_forward(&self, date: NaiveDate) -> Result<NaiveDate, CalendarError> {
        self.validate()?;
        let mut current = date;
        while !self.is_work_day(current) {
            current += Duration::days(1);
        }
        Ok(current)
    }

    /// Normalize `date` to itself or the previous work day.
    pub fn roll_backward(&self, date: NaiveDate) -> Result<NaiveDate, CalendarError> {
        self.validate()?;
        let mut current = date;
        while !self.is_work_day(current) {
            current -= Duration::days(1);
        }
        Ok(current)
    }

    /// Advance (or retreat, for negative offsets) a signed number of work
    /// days. A zero offset returns the input normalized to the next work day.
    pub fn add_work_days(&self, date: NaiveDate, offset: i64) -> Result<NaiveDate, CalendarError> {
        let mut current = self.roll_forward(date)?;
        if offset >= 0 {
            for _ in 0..offset {
                current += Duration::days(1);
                while !self.is_work_day(current) {
                    current += Duration::days(1);
                }
            }
        } else {
            for _ in 0..offset.abs() {
                current -= Duration::days(1);
                while !self.is_work_day(current) {
                    current -= Duration::days(1);
                }
            }
        }
        Ok(current)
    }

    /// Signed count of work days in the half-open interval between two dates:
    /// `[from, to)` when `from <= to`, otherwise minus the count of `[to, from)`.
    pub fn work_days_between(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        if from > to {
            return -self.work_days_between(to, from);
        }
        let mut count = 0;
        let mut current = from;
        while current < to {
            if self.is_work_day(current) {
                count += 1;
            }
            current += Duration::days(1);
        }
        count
    }

    /// Total work hours in `[from, to)` using the per-weekday hours values.
    /// Hours affect work-quantity bookkeeping only, never date stepping.
    pub fn work_hours_between(&self, from: NaiveDate, to: NaiveDate) -> f64 {
        if from > to {
            return -self.work_hours_between(to, from);
        }
        let mut hours = 0.0;
        let mut current = from;
        while current < to {
            if self.is_work_day(current) {
                hours += self.hours_per_day[current.weekday().num_days_from_monday() as usize];
            }
            current += Duration::days(1);
        }
        hours
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn all_non_work_calendar_is_rejected() {
        let cal = WorkCalendar::custom(1, "empty", []);
        assert!(matches!(
            cal.roll_forward(d(2025, 1, 6)),
            Err(CalendarError::NoWorkingDays { calendar_id: 1 })
        ));
        assert!(cal.add_work_days(d(2025, 1, 6), 3).is_err());
    }

    #[test]
    fn zero_offset_normalizes_to_next_work_day() {
        let cal = WorkCalendar::standard(1, "std");
        // Saturday rolls to Monday
        assert_eq!(cal.add_work_days(d(2025, 1, 4), 0).unwrap(), d(2025, 1, 6));
        // Monday is returned unchanged
        assert_eq!(cal.add_work_days(d(2025, 1, 6), 0).unwrap(), d(2025, 1, 6));
    }

    #[test]
    fn negative_offsets_retreat_symmetrically() {
        let cal = WorkCalendar::standard(1, "std");
        let forward = cal.add_work_days(d(2025, 1, 6), 5).unwrap();
        assert_eq!(forward, d(2025, 1, 13));
        assert_eq!(cal.add_work_days(forward, -5).unwrap(), d(2025, 1, 6));
    }

    #[test]
    fn exceptions_are_skipped() {
        let mut cal = WorkCalendar::standard(1, "std");
        cal.add_exception(d(2025, 1, 7));
        assert_eq!(cal.add_work_days(d(2025, 1, 6), 1).unwrap(), d(2025, 1, 8));
        assert_eq!(cal.work_days_between(d(2025, 1, 6), d(2025, 1, 13)), 4);
    }

    #[test]
    fn fractional_hours_affect_bookkeeping_not_stepping() {
        let mut cal = WorkCalendar::standard(1, "half-fridays");
        cal.set_weekday(Weekday::Fri, true, 4.5);
        assert_eq!(cal.add_work_days(d(2025, 1, 6), 5).unwrap(), d(2025, 1, 13));
        let hours = cal.work_hours_between(d(2025, 1, 6), d(2025, 1, 13));
        assert!((hours - (4.0 * 8.0 + 4.5)).abs() < 1e-9);
    }
}
