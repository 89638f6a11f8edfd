//! Small synthetic Wrocław catalog shared by unit tests.
//!
//! Schedule times are in UTC so expected instants read the same as the
//! schedule. Layout, relative to `origin()` (Rynek area) and `destination()`
//! (north-west, near the university):
//!
//! | stop          | from origin | to destination |
//! |---------------|-------------|----------------|
//! | DOMINIKANSKI  | ~30 m       | ~900 m         |
//! | OPERA         | ~235 m      | ~1020 m        |
//! | RYNEK         | ~450 m      | ~500 m         |
//! | UNIWERSYTET   | ~815 m      | ~90 m          |
//! | RENOMA        | ~850 m      | ~1130 m        |
//! | GRUNWALDZKI   | ~1550 m     | ~2100 m        |
//! | NADODRZE      | ~1720 m     | ~1010 m        |
//! | KRZYKI        | ~4 km       | ~4.5 km        |

use chrono::{DateTime, Utc};

use crate::domain::{Coordinates, RouteId, ScheduleTime, ServiceId, StopId, TripId};

use super::{Catalog, CatalogBuilder, Route, StopTime};

pub(crate) fn origin() -> Coordinates {
    Coordinates::new(51.1079, 17.0385).unwrap()
}

pub(crate) fn destination() -> Coordinates {
    Coordinates::new(51.1141, 17.0301).unwrap()
}

pub(crate) fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

/// Add a trip whose stops are sequenced 10, 20, 30... in the order given.
pub(crate) fn add_trip(
    builder: &mut CatalogBuilder,
    id: &str,
    route: &str,
    service: &str,
    headsign: &str,
    stops: &[(&str, &str, &str)],
) {
    let trip = TripId::new(id);
    builder
        .add_trip(
            trip.clone(),
            RouteId::new(route),
            ServiceId::new(service),
            headsign,
        )
        .unwrap();
    for (i, (stop, arr, dep)) in stops.iter().enumerate() {
        builder
            .add_stop_time(
                &trip,
                StopTime {
                    stop: StopId::new(*stop),
                    sequence: (i as u32 + 1) * 10,
                    arrival: ScheduleTime::parse(arr).unwrap(),
                    departure: ScheduleTime::parse(dep).unwrap(),
                },
            )
            .unwrap();
    }
}

pub(crate) fn add_stops(builder: &mut CatalogBuilder) {
    for (id, name, lat, lon) in [
        ("DOMINIKANSKI", "Galeria Dominikańska", 51.1081, 17.0388),
        ("OPERA", "Opera", 51.1060, 17.0370),
        ("RYNEK", "Rynek", 51.1100, 17.0330),
        ("UNIWERSYTET", "Uniwersytet", 51.1135, 17.0310),
        ("RENOMA", "Renoma", 51.1040, 17.0280),
        ("NADODRZE", "Nadodrze", 51.1230, 17.0330),
        ("GRUNWALDZKI", "Plac Grunwaldzki", 51.1115, 17.0600),
        ("KRZYKI", "Krzyki", 51.0750, 17.0100),
    ] {
        builder.add_stop(StopId::new(id), name, lat, lon).unwrap();
    }
}

fn add_routes(builder: &mut CatalogBuilder) {
    for id in ["A", "8", "9", "12", "K", "N"] {
        builder
            .add_route(Route {
                id: RouteId::new(id),
                short_name: Some(id.to_string()),
                long_name: None,
            })
            .unwrap();
    }
}

/// Builder pre-loaded with the fixture stops, routes and trips.
pub(crate) fn wroclaw_builder() -> CatalogBuilder {
    let mut b = Catalog::builder(chrono_tz::UTC);
    add_stops(&mut b);
    add_routes(&mut b);

    // Heads south, away from the destination, despite serving the nearest stop.
    add_trip(
        &mut b,
        "3_14613060",
        "A",
        "ALL",
        "KRZYKI",
        &[
            ("GRUNWALDZKI", "08:34:00", "08:35:00"),
            ("RENOMA", "08:39:00", "08:40:00"),
            ("DOMINIKANSKI", "08:44:00", "08:45:00"),
            ("KRZYKI", "09:00:00", "09:00:00"),
        ],
    );

    // Toward the destination via Rynek and Uniwersytet.
    for (id, route, start) in [
        ("8_099", "8", 20),
        ("8_100", "8", 40),
        ("12_500", "12", 40),
        ("8_101", "8", 50),
    ] {
        let t = |minutes: u32, seconds: u32| format!("08:{:02}:{seconds:02}", start + minutes);
        add_trip(
            &mut b,
            id,
            route,
            "ALL",
            "NADODRZE",
            &[
                ("DOMINIKANSKI", &t(0, 0), &t(0, 0)),
                ("RYNEK", &t(4, 0), &t(5, 0)),
                ("UNIWERSYTET", &t(8, 0), &t(9, 0)),
                ("NADODRZE", &t(9, 30), &t(9, 30)),
            ],
        );
    }

    // Same line, outside the two-hour look-ahead of an 08:30 query.
    add_trip(
        &mut b,
        "8_102",
        "8",
        "ALL",
        "NADODRZE",
        &[
            ("DOMINIKANSKI", "10:45:00", "10:45:00"),
            ("RYNEK", "10:49:00", "10:50:00"),
            ("NADODRZE", "10:58:00", "10:58:00"),
        ],
    );

    add_trip(
        &mut b,
        "9_300",
        "9",
        "ALL",
        "UNIWERSYTET",
        &[
            ("OPERA", "08:33:00", "08:33:00"),
            ("RYNEK", "08:37:00", "08:38:00"),
            ("UNIWERSYTET", "08:42:00", "08:42:00"),
        ],
    );

    // Away from the destination from Opera.
    add_trip(
        &mut b,
        "K_200",
        "K",
        "ALL",
        "KRZYKI",
        &[
            ("OPERA", "08:35:00", "08:35:00"),
            ("RENOMA", "08:40:00", "08:40:00"),
            ("KRZYKI", "08:55:00", "08:55:00"),
        ],
    );

    // Night line running past midnight of its service day.
    add_trip(
        &mut b,
        "N_900",
        "N",
        "ALL",
        "NADODRZE",
        &[
            ("DOMINIKANSKI", "24:10:00", "24:10:00"),
            ("RYNEK", "24:14:00", "24:14:00"),
            ("NADODRZE", "24:20:00", "24:20:00"),
        ],
    );

    b
}

pub(crate) fn wroclaw() -> Catalog {
    wroclaw_builder().build().unwrap()
}
