//! GTFS directory import.
//!
//! Reads a static GTFS feed from an unpacked directory into a validated
//! [`Catalog`]. `stops.txt`, `trips.txt` and `stop_times.txt` are required;
//! `agency.txt`, `routes.txt`, `calendar.txt` and `calendar_dates.txt` are
//! used when present. Any malformed row rejects the whole feed.

use std::fs::File;
use std::path::Path;

use chrono_tz::Tz;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::domain::{RouteId, ScheduleTime, ServiceId, StopId, TripId};

use super::calendar::{parse_gtfs_date, ServiceCalendar, ServiceException, WeeklyPattern};
use super::error::CatalogError;
use super::model::{Route, StopTime};
use super::{Catalog, CatalogBuilder};

#[derive(Deserialize)]
struct AgencyRecord {
    agency_timezone: String,
}

#[derive(Deserialize)]
struct StopRecord {
    stop_id: String,
    stop_name: Option<String>,
    stop_lat: f64,
    stop_lon: f64,
    location_type: Option<u8>,
}

#[derive(Deserialize)]
struct RouteRecord {
    route_id: String,
    route_short_name: Option<String>,
    route_long_name: Option<String>,
}

#[derive(Deserialize)]
struct TripRecord {
    route_id: String,
    service_id: String,
    trip_id: String,
    trip_headsign: Option<String>,
}

#[derive(Deserialize)]
struct StopTimeRecord {
    trip_id: String,
    arrival_time: Option<String>,
    departure_time: Option<String>,
    stop_id: String,
    stop_sequence: u32,
}

#[derive(Deserialize)]
struct CalendarRecord {
    service_id: String,
    monday: u8,
    tuesday: u8,
    wednesday: u8,
    thursday: u8,
    friday: u8,
    saturday: u8,
    sunday: u8,
    start_date: String,
    end_date: String,
}

#[derive(Deserialize)]
struct CalendarDateRecord {
    service_id: String,
    date: String,
    exception_type: u8,
}

/// Load a GTFS feed from `dir`.
///
/// `default_timezone` applies when the feed has no `agency.txt`.
pub fn load_gtfs_dir(dir: &Path, default_timezone: Tz) -> Result<Catalog, CatalogError> {
    let timezone = read_timezone(dir)?.unwrap_or(default_timezone);
    let mut builder = Catalog::builder(timezone);
    builder.set_calendar(read_calendar(dir)?);

    for_each_row(dir, "stops.txt", true, |rec: StopRecord| {
        // Stations, entrances and other non-boarding locations
        if rec.location_type.unwrap_or(0) != 0 {
            return Ok(());
        }
        builder.add_stop(
            StopId::new(&rec.stop_id),
            rec.stop_name.unwrap_or_default(),
            rec.stop_lat,
            rec.stop_lon,
        )
    })?;

    let has_routes = for_each_row(dir, "routes.txt", false, |rec: RouteRecord| {
        builder.add_route(Route {
            id: RouteId::new(&rec.route_id),
            short_name: rec.route_short_name,
            long_name: rec.route_long_name,
        })
    })?;
    if has_routes {
        builder.expect_routes();
    }

    for_each_row(dir, "trips.txt", true, |rec: TripRecord| {
        builder.add_trip(
            TripId::new(&rec.trip_id),
            RouteId::new(&rec.route_id),
            ServiceId::new(&rec.service_id),
            rec.trip_headsign.unwrap_or_default(),
        )
    })?;

    // stop_times.txt is usually grouped by trip; reuse the id while it repeats.
    let mut current: Option<TripId> = None;
    for_each_row(dir, "stop_times.txt", true, |rec: StopTimeRecord| {
        let trip = match current.take() {
            Some(trip) if trip.as_str() == rec.trip_id => trip,
            _ => TripId::new(&rec.trip_id),
        };
        let (arrival, departure) = stop_times(rec.arrival_time, rec.departure_time)?;
        let result = builder.add_stop_time(
            &trip,
            StopTime {
                stop: StopId::new(&rec.stop_id),
                sequence: rec.stop_sequence,
                arrival,
                departure,
            },
        );
        current = Some(trip);
        result
    })?;

    let catalog = builder.build()?;
    info!(
        path = %dir.display(),
        timezone = %catalog.timezone(),
        stops = catalog.stop_count(),
        routes = catalog.route_count(),
        trips = catalog.trip_count(),
        "Loaded GTFS feed"
    );
    Ok(catalog)
}

/// Feed timezone from `agency.txt`, if the file exists.
fn read_timezone(dir: &Path) -> Result<Option<Tz>, CatalogError> {
    let mut found: Option<String> = None;
    for_each_row(dir, "agency.txt", false, |rec: AgencyRecord| {
        match &found {
            Some(tz) if *tz != rec.agency_timezone => Err(CatalogError::ConflictingTimezones(
                tz.clone(),
                rec.agency_timezone,
            )),
            Some(_) => Ok(()),
            None => {
                found = Some(rec.agency_timezone);
                Ok(())
            }
        }
    })?;
    found
        .map(|name| {
            name.parse::<Tz>()
                .map_err(|_| CatalogError::InvalidTimezone(name))
        })
        .transpose()
}

fn read_calendar(dir: &Path) -> Result<ServiceCalendar, CatalogError> {
    let mut calendar = ServiceCalendar::builder();

    let weekly = for_each_row(dir, "calendar.txt", false, |rec: CalendarRecord| {
        let mut days = [false; 7];
        for (day, (field, value)) in days.iter_mut().zip([
            ("monday", rec.monday),
            ("tuesday", rec.tuesday),
            ("wednesday", rec.wednesday),
            ("thursday", rec.thursday),
            ("friday", rec.friday),
            ("saturday", rec.saturday),
            ("sunday", rec.sunday),
        ]) {
            *day = match value {
                0 => false,
                1 => true,
                other => {
                    return Err(CatalogError::InvalidField {
                        field,
                        value: other.to_string(),
                    });
                }
            };
        }
        calendar.add_weekly(
            ServiceId::new(&rec.service_id),
            WeeklyPattern {
                days,
                start: parse_gtfs_date(&rec.start_date)?,
                end: parse_gtfs_date(&rec.end_date)?,
            },
        )
    })?;

    let dates = for_each_row(dir, "calendar_dates.txt", false, |rec: CalendarDateRecord| {
        let exception = ServiceException::from_code(rec.exception_type).ok_or_else(|| {
            CatalogError::InvalidField {
                field: "exception_type",
                value: rec.exception_type.to_string(),
            }
        })?;
        calendar.add_exception(
            ServiceId::new(&rec.service_id),
            parse_gtfs_date(&rec.date)?,
            exception,
        )
    })?;

    if weekly || dates {
        calendar.mark_present();
    }
    Ok(calendar.build())
}

/// Resolve a stop time's arrival and departure.
///
/// Either may be blank; the other is used in its place.
fn stop_times(
    arrival: Option<String>,
    departure: Option<String>,
) -> Result<(ScheduleTime, ScheduleTime), CatalogError> {
    let parse = |value: String| {
        ScheduleTime::parse(&value).map_err(|source| CatalogError::InvalidTime { value, source })
    };
    match (arrival, departure) {
        (Some(a), Some(d)) => Ok((parse(a)?, parse(d)?)),
        (Some(t), None) | (None, Some(t)) => {
            let t = parse(t)?;
            Ok((t, t))
        }
        (None, None) => Err(CatalogError::InvalidField {
            field: "arrival_time",
            value: String::new(),
        }),
    }
}

/// Deserialize every row of `file`, handing each to `row`.
///
/// Returns `false` without calling `row` when an optional file is absent.
/// Rejections from `row` are tagged with the file and line.
fn for_each_row<T, F>(
    dir: &Path,
    file: &'static str,
    required: bool,
    mut row: F,
) -> Result<bool, CatalogError>
where
    T: DeserializeOwned,
    F: FnMut(T) -> Result<(), CatalogError>,
{
    let path = dir.join(file);
    if !path.is_file() {
        if required {
            return Err(CatalogError::MissingFile(path));
        }
        return Ok(false);
    }
    let handle = File::open(&path).map_err(|source| CatalogError::Io {
        path: path.clone(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(handle);
    let headers = reader
        .headers()
        .map_err(|source| CatalogError::Csv { file, source })?
        .clone();

    let mut record = csv::StringRecord::new();
    let mut rows = 0usize;
    while reader
        .read_record(&mut record)
        .map_err(|source| CatalogError::Csv { file, source })?
    {
        let line = record.position().map_or(0, |p| p.line());
        let rec: T = record
            .deserialize(Some(&headers))
            .map_err(|source| CatalogError::Csv { file, source })?;
        row(rec).map_err(|e| e.at_row(file, line))?;
        rows += 1;
    }
    debug!(file, rows, "Read feed file");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    const STOPS: &str = "\
stop_id,stop_code,stop_name,stop_lat,stop_lon,location_type
GRUNWALDZKI,1,Plac Grunwaldzki,51.1092,17.0415,
RENOMA,2,Renoma,51.1040,17.0280,0
STATION,3,Dworzec,51.0990,17.0360,1
";

    const ROUTES: &str = "\
route_id,agency_id,route_short_name,route_long_name,route_type
A,1,A,KRZYKI - BISKUPIN,3
";

    const TRIPS: &str = "\
route_id,service_id,trip_id,trip_headsign,direction_id
A,WD,3_14613060,KRZYKI,0
";

    const STOP_TIMES: &str = "\
trip_id,arrival_time,departure_time,stop_id,stop_sequence
3_14613060,08:34:00,08:35:00,GRUNWALDZKI,1
3_14613060,08:39:00,,RENOMA,2
";

    const CALENDAR: &str = "\
service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date
WD,1,1,1,1,1,0,0,20250101,20251231
";

    fn feed(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, contents) in files {
            fs::write(dir.path().join(name), contents).unwrap();
        }
        dir
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("stops.txt", STOPS),
            ("trips.txt", TRIPS),
            ("stop_times.txt", STOP_TIMES),
        ]
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn loads_minimal_feed() {
        let dir = feed(&minimal());
        let catalog = load_gtfs_dir(dir.path(), chrono_tz::Europe::Warsaw).unwrap();

        assert_eq!(catalog.timezone(), chrono_tz::Europe::Warsaw);
        // Station rows are not boarding stops
        assert_eq!(catalog.stop_count(), 2);
        assert!(catalog.stop("STATION").is_none());

        let trip = catalog.trip("3_14613060").unwrap();
        assert_eq!(trip.headsign, "KRZYKI");
        assert_eq!(trip.stop_times.len(), 2);
        // Blank departure falls back to arrival
        assert_eq!(trip.stop_times[1].departure, ScheduleTime::parse("08:39:00").unwrap());

        // No routes.txt: route synthesised without names
        let route = catalog.route("A").unwrap();
        assert_eq!(route.short_name, None);

        // No calendar: runs every day
        assert!(catalog
            .calendar()
            .is_active(&ServiceId::new("WD"), date(2025, 4, 6)));
    }

    #[test]
    fn loads_optional_files() {
        let mut files = minimal();
        files.push(("routes.txt", ROUTES));
        files.push(("calendar.txt", CALENDAR));
        files.push((
            "calendar_dates.txt",
            "service_id,date,exception_type\nWD,20250406,1\nWD,20250402,2\n",
        ));
        files.push((
            "agency.txt",
            "agency_id,agency_name,agency_url,agency_timezone\n1,MPK,https://mpk.wroc.pl,Europe/Berlin\n",
        ));
        let dir = feed(&files);
        let catalog = load_gtfs_dir(dir.path(), chrono_tz::Europe::Warsaw).unwrap();

        assert_eq!(catalog.timezone(), chrono_tz::Europe::Berlin);
        let route = catalog.route("A").unwrap();
        assert_eq!(route.short_name.as_deref(), Some("A"));
        assert_eq!(route.long_name.as_deref(), Some("KRZYKI - BISKUPIN"));

        let wd = ServiceId::new("WD");
        assert!(catalog.calendar().is_active(&wd, date(2025, 4, 3)));
        assert!(!catalog.calendar().is_active(&wd, date(2025, 4, 2)));
        assert!(catalog.calendar().is_active(&wd, date(2025, 4, 6)));
        assert!(!catalog.calendar().is_active(&wd, date(2025, 4, 5)));
    }

    #[test]
    fn missing_required_file() {
        let dir = feed(&[("stops.txt", STOPS), ("trips.txt", TRIPS)]);
        let err = load_gtfs_dir(dir.path(), chrono_tz::Europe::Warsaw).unwrap_err();
        assert!(matches!(err, CatalogError::MissingFile(p) if p.ends_with("stop_times.txt")));
    }

    #[test]
    fn row_errors_name_file_and_line() {
        let mut files = minimal();
        files[2] = (
            "stop_times.txt",
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
             3_14613060,08:34:00,08:35:00,GRUNWALDZKI,1\n\
             3_14613060,08:39:00,08:39:00,NOWHERE,2\n",
        );
        let dir = feed(&files);
        let err = load_gtfs_dir(dir.path(), chrono_tz::Europe::Warsaw).unwrap_err();
        match err {
            CatalogError::AtRow { file, line, source } => {
                assert_eq!(file, "stop_times.txt");
                assert_eq!(line, 3);
                assert!(matches!(*source, CatalogError::UnknownStop { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_bad_time() {
        let mut files = minimal();
        files[2] = (
            "stop_times.txt",
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
             3_14613060,8:99:00,08:35:00,GRUNWALDZKI,1\n",
        );
        let dir = feed(&files);
        let err = load_gtfs_dir(dir.path(), chrono_tz::Europe::Warsaw).unwrap_err();
        assert!(err.to_string().contains("stop_times.txt line 2"));
    }

    #[test]
    fn rejects_bad_coordinates() {
        let mut files = minimal();
        files[0] = (
            "stops.txt",
            "stop_id,stop_name,stop_lat,stop_lon\nGRUNWALDZKI,Plac Grunwaldzki,151.1,17.0\n",
        );
        let dir = feed(&files);
        let err = load_gtfs_dir(dir.path(), chrono_tz::Europe::Warsaw).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::AtRow { ref source, .. }
                if matches!(**source, CatalogError::InvalidStopCoordinates { .. })
        ));
    }

    #[test]
    fn rejects_unparseable_number() {
        let mut files = minimal();
        files[0] = (
            "stops.txt",
            "stop_id,stop_name,stop_lat,stop_lon\nGRUNWALDZKI,Plac Grunwaldzki,north,17.0\n",
        );
        let dir = feed(&files);
        let err = load_gtfs_dir(dir.path(), chrono_tz::Europe::Warsaw).unwrap_err();
        assert!(matches!(err, CatalogError::Csv { file: "stops.txt", .. }));
    }

    #[test]
    fn rejects_conflicting_agency_timezones() {
        let mut files = minimal();
        files.push((
            "agency.txt",
            "agency_id,agency_timezone\n1,Europe/Warsaw\n2,Europe/London\n",
        ));
        let dir = feed(&files);
        let err = load_gtfs_dir(dir.path(), chrono_tz::Europe::Warsaw).unwrap_err();
        assert!(err.to_string().contains("agencies disagree"));
    }

    #[test]
    fn rejects_unknown_timezone() {
        let mut files = minimal();
        files.push(("agency.txt", "agency_id,agency_timezone\n1,Mars/Olympus\n"));
        let dir = feed(&files);
        let err = load_gtfs_dir(dir.path(), chrono_tz::Europe::Warsaw).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidTimezone(name) if name == "Mars/Olympus"));
    }

    #[test]
    fn rejects_trip_with_unknown_service() {
        let mut files = minimal();
        files.push((
            "calendar.txt",
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
             SAT,0,0,0,0,0,1,0,20250101,20251231\n",
        ));
        let dir = feed(&files);
        let err = load_gtfs_dir(dir.path(), chrono_tz::Europe::Warsaw).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownService { .. }));
    }

    #[test]
    fn rejects_repeated_calendar_date() {
        let mut files = minimal();
        files.push(("calendar.txt", CALENDAR));
        files.push((
            "calendar_dates.txt",
            "service_id,date,exception_type\nWD,20250402,1\nWD,20250403,2\nWD,20250402,2\n",
        ));
        let dir = feed(&files);
        let err = load_gtfs_dir(dir.path(), chrono_tz::Europe::Warsaw).unwrap_err();
        match err {
            CatalogError::AtRow { file, line, source } => {
                assert_eq!(file, "calendar_dates.txt");
                assert_eq!(line, 4);
                assert!(matches!(
                    *source,
                    CatalogError::DuplicateException { ref service, date: d }
                        if service.as_str() == "WD" && d == date(2025, 4, 2)
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_bad_calendar_flag() {
        let mut files = minimal();
        files.push((
            "calendar.txt",
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
             WD,1,1,1,1,2,0,0,20250101,20251231\n",
        ));
        let dir = feed(&files);
        let err = load_gtfs_dir(dir.path(), chrono_tz::Europe::Warsaw).unwrap_err();
        assert!(err.to_string().contains("invalid friday value"));
    }
}
