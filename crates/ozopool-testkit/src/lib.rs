// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::path::PathBuf;
use time::{Date, Month};

use ozopool_app::{
    CustomerType, Device, DeviceThresholds, MqttTopics, Organization, PoolStatus, SensorSnapshot,
    User, UserRole, UserStatus, location_cities, location_countries, location_states,
};

const ORG_ADJECTIVES: [&str; 12] = [
    "Clear", "Blue", "Crystal", "Coastal", "Summit", "Harbor", "Laguna", "Cascade", "Pacific",
    "Marina", "Azure", "Lakeside",
];
const ORG_NOUNS: [&str; 8] = [
    "Pools",
    "Aquatics",
    "Waterworks",
    "Pool Care",
    "Springs",
    "Resorts",
    "Leisure",
    "Wellness",
];

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];

const EMAIL_DOMAINS: [&str; 5] = [
    "example-pools.com",
    "poolcare.local",
    "aquatics-group.net",
    "swimteam.io",
    "bluewater.org",
];

const ORG_STATUSES: [&str; 2] = ["Active", "Inactive"];
const USER_STATUSES: [UserStatus; 3] = [UserStatus::Active, UserStatus::Inactive, UserStatus::Pending];

const REFERENCE_YEAR: i32 = 2026;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Deterministic record generator for demo mode and tests. Same seed,
/// same fleet.
#[derive(Debug, Clone)]
pub struct PoolFaker {
    rng: DeterministicRng,
}

impl PoolFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn device(&mut self) -> Device {
        let (_, state, city) = self.place();
        let pool_status = PoolStatus::ALL[self.rng.int_n(PoolStatus::ALL.len())];
        Device {
            device_id: format!("OZ-{:04}", self.int_range_i32(100, 9_999)).into(),
            customer: self.organization_name(),
            city,
            state,
            pool_status: pool_status.as_str().to_owned(),
            mqtt_topic: MqttTopics::default().read,
            created_on: self.date_string(),
        }
    }

    pub fn organization(&mut self) -> Organization {
        let (country, state, city) = self.place();
        let customer_type = CustomerType::ALL[self.rng.int_n(CustomerType::ALL.len())];
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        let domain = self.pick(&EMAIL_DOMAINS);
        Organization {
            id: format!("org-{:06}", self.int_range_i32(0, 999_999)).into(),
            organization_name: self.organization_name(),
            contact_name: format!("{first} {last}"),
            email: format!(
                "{}.{}@{domain}",
                first.to_ascii_lowercase(),
                last.to_ascii_lowercase()
            ),
            phone_no: format!(
                "({:03}) {:03}-{:04}",
                self.int_range_i32(200, 999),
                self.int_range_i32(200, 999),
                self.int_range_i32(0, 9_999),
            ),
            customer_type: customer_type.as_str().to_owned(),
            status: self.pick(&ORG_STATUSES).to_owned(),
            address: format!("{} Dock St", self.int_range_i32(1, 999)),
            country: country.to_owned(),
            state,
            city,
        }
    }

    pub fn user(&mut self) -> User {
        let role = UserRole::ALL[self.rng.int_n(UserRole::ALL.len())];
        let status = USER_STATUSES[self.rng.int_n(USER_STATUSES.len())];
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        let domain = self.pick(&EMAIL_DOMAINS);
        User {
            id: format!("usr-{:06}", self.int_range_i32(0, 999_999)).into(),
            username: format!("{}{}", first.to_ascii_lowercase(), last.to_ascii_lowercase()),
            email: format!(
                "{}.{}@{domain}",
                first.to_ascii_lowercase(),
                last.to_ascii_lowercase()
            ),
            user_role: role.as_str().to_owned(),
            status: status.as_str().to_owned(),
            created_on: self.date_string(),
        }
    }

    /// Readings comfortably inside every range.
    pub fn healthy_snapshot(&mut self, thresholds: &DeviceThresholds) -> SensorSnapshot {
        SensorSnapshot {
            ph: self.inner_value(thresholds.ph.min, thresholds.ph.max),
            orp: self.inner_value(thresholds.orp.min, thresholds.orp.max),
            temperature: self.inner_value(thresholds.temperature.min, thresholds.temperature.max),
            ozone_level: self.f64_range(150.0, 250.0),
            power: true,
        }
    }

    /// Readings that may drift outside the ranges, for exercising the
    /// warning and alert paths.
    pub fn snapshot(&mut self, thresholds: &DeviceThresholds) -> SensorSnapshot {
        let mut snapshot = self.healthy_snapshot(thresholds);
        match self.rng.int_n(4) {
            0 => snapshot.ph = thresholds.ph.max + 0.5,
            1 => snapshot.orp = thresholds.orp.min - 50.0,
            2 => snapshot.temperature = thresholds.temperature.max + 2.0,
            _ => {}
        }
        snapshot
    }

    fn organization_name(&mut self) -> String {
        format!("{} {}", self.pick(&ORG_ADJECTIVES), self.pick(&ORG_NOUNS))
    }

    // Drawn from the same tables the device form offers, so generated
    // rows always pass the form's location cascade.
    fn place(&mut self) -> (&'static str, String, String) {
        let countries = location_countries();
        let country = countries[self.rng.int_n(countries.len())];
        let states = location_states(country);
        let state = states[self.rng.int_n(states.len())];
        let cities = location_cities(country, state);
        let city = cities[self.rng.int_n(cities.len())];
        (country, state.to_owned(), city.to_owned())
    }

    fn date_string(&mut self) -> String {
        let day_of_year = self.int_range_i32(1, 365) as u16;
        let date = Date::from_ordinal_date(REFERENCE_YEAR, day_of_year)
            .unwrap_or_else(|_| {
                Date::from_calendar_date(REFERENCE_YEAR, Month::January, 1)
                    .expect("valid calendar date")
            });
        date.format(&time::macros::format_description!("[year]-[month]-[day]"))
            .unwrap_or_else(|_| date.to_string())
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range_i32(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = i64::from(max) - i64::from(min) + 1;
        let offset = (self.rng.next_u64() % (span as u64)) as i64;
        (i64::from(min) + offset) as i32
    }

    fn f64_range(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        let fraction = (self.rng.next_u64() % 1_000) as f64 / 1_000.0;
        min + (max - min) * fraction
    }

    // A third of the way in from each bound, clear of the warning band.
    fn inner_value(&mut self, min: f64, max: f64) -> f64 {
        let span = max - min;
        self.f64_range(min + span / 3.0, max - span / 3.0)
    }
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let config_path = dir.path().join("ozopool.toml");
    Ok((dir, config_path))
}
