//! Service calendars: which days a trip's service runs.
//!
//! Feeds describe service days with a weekly pattern over a date range
//! (`calendar.txt`) plus per-date exceptions (`calendar_dates.txt`). Either
//! file may be absent. A feed with neither is treated as running every
//! service on every day.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};

use crate::domain::ServiceId;

use super::error::CatalogError;

/// Weekly pattern for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyPattern {
    /// Monday first.
    pub days: [bool; 7],
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeeklyPattern {
    fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start
            && date <= self.end
            && self.days[date.weekday().num_days_from_monday() as usize]
    }
}

/// A `calendar_dates.txt` exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceException {
    Added,
    Removed,
}

impl ServiceException {
    /// Parse the GTFS `exception_type` column.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Added),
            2 => Some(Self::Removed),
            _ => None,
        }
    }
}

/// Service activity lookup.
#[derive(Debug, Clone, Default)]
pub enum ServiceCalendar {
    /// No calendar data: every service runs every day.
    #[default]
    Unrestricted,
    Scheduled {
        weekly: HashMap<ServiceId, WeeklyPattern>,
        exceptions: HashMap<(ServiceId, NaiveDate), ServiceException>,
        services: HashSet<ServiceId>,
    },
}

impl ServiceCalendar {
    /// Start collecting calendar entries.
    pub fn builder() -> ServiceCalendarBuilder {
        ServiceCalendarBuilder::default()
    }

    /// Whether `service` runs on `date`.
    pub fn is_active(&self, service: &ServiceId, date: NaiveDate) -> bool {
        match self {
            ServiceCalendar::Unrestricted => true,
            ServiceCalendar::Scheduled {
                weekly, exceptions, ..
            } => {
                match exceptions.get(&(service.clone(), date)) {
                    Some(ServiceException::Added) => true,
                    Some(ServiceException::Removed) => false,
                    None => weekly.get(service).is_some_and(|w| w.covers(date)),
                }
            }
        }
    }

    /// Whether trips may reference `service`.
    pub fn knows(&self, service: &ServiceId) -> bool {
        match self {
            ServiceCalendar::Unrestricted => true,
            ServiceCalendar::Scheduled { services, .. } => services.contains(service),
        }
    }
}

/// Collects calendar rows, rejecting duplicates.
#[derive(Debug, Default)]
pub struct ServiceCalendarBuilder {
    weekly: HashMap<ServiceId, WeeklyPattern>,
    exceptions: HashMap<(ServiceId, NaiveDate), ServiceException>,
    services: HashSet<ServiceId>,
    any_rows: bool,
}

impl ServiceCalendarBuilder {
    /// Add a `calendar.txt` row.
    pub fn add_weekly(
        &mut self,
        service: ServiceId,
        pattern: WeeklyPattern,
    ) -> Result<(), CatalogError> {
        self.any_rows = true;
        if self.weekly.contains_key(&service) {
            return Err(CatalogError::DuplicateService(service));
        }
        self.services.insert(service.clone());
        self.weekly.insert(service, pattern);
        Ok(())
    }

    /// Add a `calendar_dates.txt` row.
    ///
    /// Each (service, date) pair may appear once.
    pub fn add_exception(
        &mut self,
        service: ServiceId,
        date: NaiveDate,
        exception: ServiceException,
    ) -> Result<(), CatalogError> {
        self.any_rows = true;
        match self.exceptions.entry((service, date)) {
            Entry::Occupied(entry) => {
                let (service, date) = entry.key().clone();
                Err(CatalogError::DuplicateException { service, date })
            }
            Entry::Vacant(entry) => {
                self.services.insert(entry.key().0.clone());
                entry.insert(exception);
                Ok(())
            }
        }
    }

    /// Mark that calendar files were present, even if they held no rows.
    pub fn mark_present(&mut self) {
        self.any_rows = true;
    }

    pub fn build(self) -> ServiceCalendar {
        if !self.any_rows {
            return ServiceCalendar::Unrestricted;
        }
        ServiceCalendar::Scheduled {
            weekly: self.weekly,
            exceptions: self.exceptions,
            services: self.services,
        }
    }
}

/// Parse a GTFS `YYYYMMDD` date.
pub fn parse_gtfs_date(s: &str) -> Result<NaiveDate, CatalogError> {
    NaiveDate::parse_from_str(s.trim(), "%Y%m%d")
        .map_err(|_| CatalogError::InvalidDate(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn weekdays() -> WeeklyPattern {
        WeeklyPattern {
            days: [true, true, true, true, true, false, false],
            start: date(2025, 1, 1),
            end: date(2025, 12, 31),
        }
    }

    #[test]
    fn unrestricted_runs_everything() {
        let calendar = ServiceCalendar::Unrestricted;
        assert!(calendar.is_active(&ServiceId::new("any"), date(2025, 4, 2)));
        assert!(calendar.knows(&ServiceId::new("any")));
    }

    #[test]
    fn empty_builder_is_unrestricted() {
        let calendar = ServiceCalendar::builder().build();
        assert!(matches!(calendar, ServiceCalendar::Unrestricted));
    }

    #[test]
    fn present_but_empty_files_restrict() {
        let mut builder = ServiceCalendar::builder();
        builder.mark_present();
        let calendar = builder.build();
        assert!(!calendar.knows(&ServiceId::new("any")));
        assert!(!calendar.is_active(&ServiceId::new("any"), date(2025, 4, 2)));
    }

    #[test]
    fn weekly_pattern_respects_weekday_and_range() {
        let mut builder = ServiceCalendar::builder();
        builder.add_weekly(ServiceId::new("WD"), weekdays()).unwrap();
        let calendar = builder.build();
        let wd = ServiceId::new("WD");

        assert!(calendar.is_active(&wd, date(2025, 4, 2))); // Wednesday
        assert!(!calendar.is_active(&wd, date(2025, 4, 5))); // Saturday
        assert!(!calendar.is_active(&wd, date(2026, 1, 7))); // after end
        assert!(!calendar.is_active(&ServiceId::new("other"), date(2025, 4, 2)));
    }

    #[test]
    fn exceptions_override_pattern() {
        let mut builder = ServiceCalendar::builder();
        let wd = ServiceId::new("WD");
        builder.add_weekly(wd.clone(), weekdays()).unwrap();
        builder
            .add_exception(wd.clone(), date(2025, 4, 2), ServiceException::Removed)
            .unwrap();
        builder
            .add_exception(wd.clone(), date(2025, 4, 5), ServiceException::Added)
            .unwrap();
        let calendar = builder.build();

        assert!(!calendar.is_active(&wd, date(2025, 4, 2)));
        assert!(calendar.is_active(&wd, date(2025, 4, 5)));
        assert!(calendar.is_active(&wd, date(2025, 4, 3)));
    }

    #[test]
    fn repeated_exception_is_rejected() {
        let mut builder = ServiceCalendar::builder();
        let wd = ServiceId::new("WD");
        builder
            .add_exception(wd.clone(), date(2025, 4, 2), ServiceException::Added)
            .unwrap();
        let err = builder
            .add_exception(wd.clone(), date(2025, 4, 2), ServiceException::Removed)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "duplicate calendar_dates entry for service WD on 2025-04-02"
        );

        // The first row stands
        let calendar = builder.build();
        assert!(calendar.is_active(&wd, date(2025, 4, 2)));
    }

    #[test]
    fn exception_only_service_is_known() {
        let mut builder = ServiceCalendar::builder();
        let holiday = ServiceId::new("HOL");
        builder
            .add_exception(holiday.clone(), date(2025, 5, 1), ServiceException::Added)
            .unwrap();
        let calendar = builder.build();

        assert!(calendar.knows(&holiday));
        assert!(calendar.is_active(&holiday, date(2025, 5, 1)));
        assert!(!calendar.is_active(&holiday, date(2025, 5, 2)));
    }

    #[test]
    fn duplicate_weekly_rejected() {
        let mut builder = ServiceCalendar::builder();
        builder.add_weekly(ServiceId::new("WD"), weekdays()).unwrap();
        let err = builder
            .add_weekly(ServiceId::new("WD"), weekdays())
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateService(_)));
    }

    #[test]
    fn exception_codes() {
        assert_eq!(ServiceException::from_code(1), Some(ServiceException::Added));
        assert_eq!(ServiceException::from_code(2), Some(ServiceException::Removed));
        assert_eq!(ServiceException::from_code(3), None);
    }

    #[test]
    fn gtfs_dates() {
        assert_eq!(parse_gtfs_date("20250402").unwrap(), date(2025, 4, 2));
        assert!(parse_gtfs_date("2025-04-02").is_err());
        assert!(parse_gtfs_date("20251340").is_err());
    }
}
