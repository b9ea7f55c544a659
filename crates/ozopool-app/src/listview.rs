// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Shared state machine behind the devices, organizations, and users
//! screens: free-text search, a single-select category filter, status
//! tabs with live counts, and per-column visibility.
//!
//! Filtering is a pure projection over an unmodified record slice.
//! Records keep their fetch order; nothing here sorts, mutates, or
//! performs I/O.

use std::collections::BTreeMap;

use crate::{Device, Organization, ScreenKind, User};

/// Sentinel accepted for both the category filter and the status tab.
/// Matched case-insensitively ("all" and "All" are equivalent).
pub const ALL_FILTER: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub key: &'static str,
    pub label: &'static str,
}

/// Per-screen descriptor: which columns exist, which fields the search
/// box scans, which status values get tabs, and which values the
/// category dropdown offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSchema {
    pub screen: ScreenKind,
    pub columns: &'static [ColumnSpec],
    pub search_fields: &'static [&'static str],
    /// Status values counted by [`ListViewState::status_counts`]. Must
    /// cover every value the backend can report for the counts to sum
    /// to the record total.
    pub statuses: &'static [&'static str],
    /// Status values offered as tabs, in addition to the "All" tab.
    /// A subset of `statuses` (the users screen counts Pending but has
    /// no Pending tab).
    pub status_tabs: &'static [&'static str],
    pub categories: &'static [&'static str],
    pub initial_status_tab: &'static str,
}

/// A record the list view can project. `field` returns the value for a
/// column or search key, and MUST return `""` for unknown keys rather
/// than failing; backend rows with missing fields filter as if empty.
pub trait ListRow {
    fn field(&self, key: &str) -> &str;
    fn category(&self) -> &str;
    fn status(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListViewState {
    schema: &'static ListSchema,
    search_term: String,
    category_filter: String,
    status_tab: String,
    visible_columns: BTreeMap<&'static str, bool>,
}

impl ListViewState {
    pub fn new(schema: &'static ListSchema) -> Self {
        let visible_columns = schema
            .columns
            .iter()
            .map(|column| (column.key, true))
            .collect();
        Self {
            schema,
            search_term: String::new(),
            category_filter: ALL_FILTER.to_owned(),
            status_tab: schema.initial_status_tab.to_owned(),
            visible_columns,
        }
    }

    pub fn schema(&self) -> &'static ListSchema {
        self.schema
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Replaces the search term verbatim. No trimming: a whitespace-only
    /// term is a real term and filters toward zero matches.
    pub fn set_search_term(&mut self, term: &str) {
        self.search_term = term.to_owned();
    }

    pub fn category_filter(&self) -> &str {
        &self.category_filter
    }

    /// Accepts any string. A value outside the schema's category set is
    /// kept and simply matches nothing; it is not an error.
    pub fn set_category_filter(&mut self, value: &str) {
        self.category_filter = value.to_owned();
    }

    pub fn status_tab(&self) -> &str {
        &self.status_tab
    }

    pub fn set_status_tab(&mut self, value: &str) {
        self.status_tab = value.to_owned();
    }

    /// Flips a column's visibility. Unknown keys are a no-op so a stale
    /// saved key from an older column set cannot fail.
    pub fn toggle_column(&mut self, key: &str) {
        if let Some(visible) = self.visible_columns.get_mut(key) {
            *visible = !*visible;
        }
    }

    /// Columns default to visible, including keys the schema does not
    /// know about.
    pub fn is_column_visible(&self, key: &str) -> bool {
        self.visible_columns.get(key).copied().unwrap_or(true)
    }

    pub fn visible_columns(&self) -> Vec<&'static ColumnSpec> {
        self.schema
            .columns
            .iter()
            .filter(|column| self.is_column_visible(column.key))
            .collect()
    }

    /// Projects the records through search AND category AND status, in
    /// their original order. Never fails.
    pub fn filtered<'a, R: ListRow>(&self, records: &'a [R]) -> Vec<&'a R> {
        records
            .iter()
            .filter(|record| {
                self.search_matches(*record)
                    && self.category_matches(*record)
                    && self.status_matches(*record)
            })
            .collect()
    }

    /// Counts per status value over the UNFILTERED set, so tab badges
    /// stay stable while the user types a search term.
    pub fn status_counts<R: ListRow>(&self, records: &[R]) -> Vec<(&'static str, usize)> {
        self.schema
            .statuses
            .iter()
            .map(|status| {
                let count = records
                    .iter()
                    .filter(|record| record.status() == *status)
                    .count();
                (*status, count)
            })
            .collect()
    }

    fn search_matches<R: ListRow>(&self, record: &R) -> bool {
        if self.search_term.is_empty() {
            return true;
        }
        let needle = self.search_term.to_lowercase();
        self.schema
            .search_fields
            .iter()
            .any(|field| record.field(field).to_lowercase().contains(&needle))
    }

    fn category_matches<R: ListRow>(&self, record: &R) -> bool {
        if self.category_filter.eq_ignore_ascii_case(ALL_FILTER) {
            return true;
        }
        record.category() == self.category_filter
    }

    fn status_matches<R: ListRow>(&self, record: &R) -> bool {
        if self.status_tab.eq_ignore_ascii_case(ALL_FILTER) {
            return true;
        }
        record.status() == self.status_tab
    }
}

pub const DEVICE_SCHEMA: ListSchema = ListSchema {
    screen: ScreenKind::Devices,
    columns: &[
        ColumnSpec {
            key: "deviceId",
            label: "Device ID",
        },
        ColumnSpec {
            key: "customer",
            label: "Customer",
        },
        ColumnSpec {
            key: "city",
            label: "City",
        },
        ColumnSpec {
            key: "state",
            label: "State",
        },
        ColumnSpec {
            key: "poolStatus",
            label: "Pool Status",
        },
        ColumnSpec {
            key: "createdOn",
            label: "Created On",
        },
    ],
    search_fields: &["deviceId", "customer", "city", "state", "poolStatus"],
    statuses: &["Excellent", "Good", "Need Attention", "Not Recommended"],
    status_tabs: &["Excellent", "Good", "Need Attention", "Not Recommended"],
    categories: &["Excellent", "Good", "Need Attention", "Not Recommended"],
    initial_status_tab: "All",
};

pub const ORGANIZATION_SCHEMA: ListSchema = ListSchema {
    screen: ScreenKind::Organizations,
    columns: &[
        ColumnSpec {
            key: "organizationName",
            label: "Organization",
        },
        ColumnSpec {
            key: "contactName",
            label: "Contact",
        },
        ColumnSpec {
            key: "email",
            label: "Email",
        },
        ColumnSpec {
            key: "phoneNo",
            label: "Phone",
        },
        ColumnSpec {
            key: "customerType",
            label: "Customer Type",
        },
        ColumnSpec {
            key: "status",
            label: "Status",
        },
        ColumnSpec {
            key: "city",
            label: "City",
        },
        ColumnSpec {
            key: "country",
            label: "Country",
        },
    ],
    search_fields: &[
        "organizationName",
        "contactName",
        "email",
        "phoneNo",
        "address",
        "city",
        "country",
    ],
    statuses: &["Active", "Inactive"],
    status_tabs: &["Active", "Inactive"],
    categories: &["Partner", "End Customer"],
    initial_status_tab: "Active",
};

pub const USER_SCHEMA: ListSchema = ListSchema {
    screen: ScreenKind::Users,
    columns: &[
        ColumnSpec {
            key: "username",
            label: "Username",
        },
        ColumnSpec {
            key: "email",
            label: "Email",
        },
        ColumnSpec {
            key: "userRole",
            label: "Role",
        },
        ColumnSpec {
            key: "status",
            label: "Status",
        },
        ColumnSpec {
            key: "createdOn",
            label: "Created On",
        },
    ],
    search_fields: &["username", "email", "userRole"],
    // Pending rows count and show under the All tab only.
    statuses: &["Active", "Inactive", "Pending"],
    status_tabs: &["Active", "Inactive"],
    categories: &["Executive", "Engineer", "Admin"],
    initial_status_tab: "Active",
};

pub const fn schema_for(screen: ScreenKind) -> &'static ListSchema {
    match screen {
        ScreenKind::Devices => &DEVICE_SCHEMA,
        ScreenKind::Organizations => &ORGANIZATION_SCHEMA,
        ScreenKind::Users => &USER_SCHEMA,
    }
}

impl ListRow for Device {
    fn field(&self, key: &str) -> &str {
        match key {
            "deviceId" => self.device_id.as_str(),
            "customer" => &self.customer,
            "city" => &self.city,
            "state" => &self.state,
            "poolStatus" => &self.pool_status,
            "createdOn" => &self.created_on,
            _ => "",
        }
    }

    fn category(&self) -> &str {
        &self.pool_status
    }

    fn status(&self) -> &str {
        &self.pool_status
    }
}

impl ListRow for Organization {
    fn field(&self, key: &str) -> &str {
        match key {
            "organizationName" => &self.organization_name,
            "contactName" => &self.contact_name,
            "email" => &self.email,
            "phoneNo" => &self.phone_no,
            "customerType" => &self.customer_type,
            "status" => &self.status,
            "address" => &self.address,
            "country" => &self.country,
            "state" => &self.state,
            "city" => &self.city,
            _ => "",
        }
    }

    fn category(&self) -> &str {
        &self.customer_type
    }

    fn status(&self) -> &str {
        &self.status
    }
}

impl ListRow for User {
    fn field(&self, key: &str) -> &str {
        match key {
            "username" => &self.username,
            "email" => &self.email,
            "userRole" => &self.user_role,
            "status" => &self.status,
            "createdOn" => &self.created_on,
            _ => "",
        }
    }

    fn category(&self) -> &str {
        &self.user_role
    }

    fn status(&self) -> &str {
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use super::{DEVICE_SCHEMA, ListRow, ListViewState, ORGANIZATION_SCHEMA, USER_SCHEMA};
    use crate::{Device, DeviceId, User, UserId};

    fn device(id: &str, customer: &str, city: &str, state: &str, pool_status: &str) -> Device {
        Device {
            device_id: DeviceId::from(id),
            customer: customer.to_owned(),
            city: city.to_owned(),
            state: state.to_owned(),
            pool_status: pool_status.to_owned(),
            mqtt_topic: format!("stp/{id}/data"),
            created_on: "2026-01-15".to_owned(),
        }
    }

    fn sample_devices() -> Vec<Device> {
        vec![
            device("D1", "Poolside Austin", "Austin", "Texas", "Good"),
            device("D2", "Reno Aquatics", "Reno", "Nevada", "Good"),
            device("D3", "Sunset Pools", "Miami", "Florida", "Need Attention"),
            device("D4", "Harbor Swim", "Tampa", "Florida", "Excellent"),
        ]
    }

    fn user(name: &str, email: &str, role: &str, status: &str) -> User {
        User {
            id: UserId::from(name),
            username: name.to_owned(),
            email: email.to_owned(),
            user_role: role.to_owned(),
            status: status.to_owned(),
            created_on: "2026-02-01".to_owned(),
        }
    }

    #[test]
    fn default_state_passes_everything_through() {
        let mut view = ListViewState::new(&DEVICE_SCHEMA);
        view.set_status_tab("All");
        let devices = sample_devices();
        let rows = view.filtered(&devices);
        assert_eq!(rows.len(), devices.len());
        // Fetch order is preserved.
        assert_eq!(rows[0].device_id.as_str(), "D1");
        assert_eq!(rows[3].device_id.as_str(), "D4");
    }

    #[test]
    fn search_is_case_insensitive_substring_over_designated_fields() {
        let mut view = ListViewState::new(&DEVICE_SCHEMA);
        view.set_status_tab("All");
        let devices = sample_devices();

        view.set_search_term("austin");
        let rows = view.filtered(&devices);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].city, "Austin");

        // Matches across fields, not just one.
        view.set_search_term("RENO");
        let rows = view.filtered(&devices);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].device_id.as_str(), "D2");
    }

    #[test]
    fn search_term_is_not_trimmed() {
        let mut view = ListViewState::new(&DEVICE_SCHEMA);
        view.set_status_tab("All");
        let devices = sample_devices();

        view.set_search_term("   ");
        assert!(view.filtered(&devices).is_empty());
    }

    #[test]
    fn filters_are_conjunctive() {
        let mut view = ListViewState::new(&DEVICE_SCHEMA);
        view.set_status_tab("All");
        let devices = sample_devices();

        view.set_search_term("pool");
        view.set_category_filter("Good");
        let rows = view.filtered(&devices);
        // "Poolside Austin" matches both; "Sunset Pools" fails the
        // category; "Reno Aquatics" fails the search.
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].device_id.as_str(), "D1");
    }

    #[test]
    fn unknown_category_filter_yields_empty_without_error() {
        let mut view = ListViewState::new(&DEVICE_SCHEMA);
        view.set_status_tab("All");
        view.set_category_filter("Pristine");
        assert!(view.filtered(&sample_devices()).is_empty());
    }

    #[test]
    fn status_tab_sentinel_is_case_insensitive() {
        let mut view = ListViewState::new(&DEVICE_SCHEMA);
        let devices = sample_devices();

        view.set_status_tab("all");
        assert_eq!(view.filtered(&devices).len(), 4);
        view.set_status_tab("All");
        assert_eq!(view.filtered(&devices).len(), 4);
        view.set_status_tab("Excellent");
        assert_eq!(view.filtered(&devices).len(), 1);
    }

    #[test]
    fn status_counts_cover_the_unfiltered_set() {
        let mut view = ListViewState::new(&DEVICE_SCHEMA);
        view.set_status_tab("All");
        view.set_search_term("austin");
        let devices = sample_devices();

        let counts = view.status_counts(&devices);
        let total: usize = counts.iter().map(|(_, count)| count).sum();
        assert_eq!(total, devices.len());

        let good = counts
            .iter()
            .find(|(status, _)| *status == "Good")
            .map(|(_, count)| *count);
        assert_eq!(good, Some(2));
    }

    #[test]
    fn user_counts_include_pending_even_without_a_pending_tab() {
        let view = ListViewState::new(&USER_SCHEMA);
        let users = vec![
            user("ana", "ana@ozopool.in", "Admin", "Active"),
            user("bo", "bo@ozopool.in", "Engineer", "Inactive"),
            user("cy", "cy@ozopool.in", "Executive", "Pending"),
        ];

        let counts = view.status_counts(&users);
        let total: usize = counts.iter().map(|(_, count)| count).sum();
        assert_eq!(total, users.len());
        assert!(!view.schema().status_tabs.contains(&"Pending"));

        // Pending rows surface only under the All tab.
        let mut all_tab = ListViewState::new(&USER_SCHEMA);
        all_tab.set_status_tab("All");
        assert_eq!(all_tab.filtered(&users).len(), 3);
        assert_eq!(view.filtered(&users).len(), 1);
    }

    #[test]
    fn toggle_column_is_an_involution() {
        let mut view = ListViewState::new(&DEVICE_SCHEMA);
        assert!(view.is_column_visible("city"));
        view.toggle_column("city");
        assert!(!view.is_column_visible("city"));
        view.toggle_column("city");
        assert!(view.is_column_visible("city"));
    }

    #[test]
    fn toggle_unknown_column_is_a_no_op_and_unknown_keys_default_visible() {
        let mut view = ListViewState::new(&DEVICE_SCHEMA);
        view.toggle_column("firmwareRev");
        assert!(view.is_column_visible("firmwareRev"));
        assert_eq!(view.visible_columns().len(), view.schema().columns.len());
    }

    #[test]
    fn hidden_columns_drop_out_of_the_visible_list() {
        let mut view = ListViewState::new(&ORGANIZATION_SCHEMA);
        view.toggle_column("phoneNo");
        let keys: Vec<&str> = view.visible_columns().iter().map(|c| c.key).collect();
        assert!(!keys.contains(&"phoneNo"));
        assert!(keys.contains(&"organizationName"));
    }

    #[test]
    fn missing_fields_compare_as_empty() {
        let devices = sample_devices();
        assert_eq!(devices[0].field("nonexistent"), "");

        let mut view = ListViewState::new(&DEVICE_SCHEMA);
        view.set_status_tab("All");
        view.set_search_term("zzz");
        assert!(view.filtered(&devices).is_empty());
    }

    #[test]
    fn filtering_does_not_reorder_or_mutate() {
        let mut view = ListViewState::new(&DEVICE_SCHEMA);
        view.set_status_tab("All");
        view.set_category_filter("Good");
        let devices = sample_devices();
        let before = devices.clone();

        let rows = view.filtered(&devices);
        let ids: Vec<&str> = rows.iter().map(|d| d.device_id.as_str()).collect();
        assert_eq!(ids, vec!["D1", "D2"]);
        assert_eq!(devices, before);
    }
}
