// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::*;

/// Water quality verdict reported per device. Doubles as the devices
/// screen's category filter and its status tab axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolStatus {
    Excellent,
    Good,
    NeedAttention,
    NotRecommended,
}

impl PoolStatus {
    pub const ALL: [Self; 4] = [
        Self::Excellent,
        Self::Good,
        Self::NeedAttention,
        Self::NotRecommended,
    ];

    // Backend literals, spaces included.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::NeedAttention => "Need Attention",
            Self::NotRecommended => "Not Recommended",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Excellent" => Some(Self::Excellent),
            "Good" => Some(Self::Good),
            "Need Attention" => Some(Self::NeedAttention),
            "Not Recommended" => Some(Self::NotRecommended),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrgStatus {
    Active,
    Inactive,
}

impl OrgStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Active" => Some(Self::Active),
            "Inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    Active,
    Inactive,
    Pending,
}

impl UserStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Pending => "Pending",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Active" => Some(Self::Active),
            "Inactive" => Some(Self::Inactive),
            "Pending" => Some(Self::Pending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Executive,
    Engineer,
    Admin,
}

impl UserRole {
    pub const ALL: [Self; 3] = [Self::Executive, Self::Engineer, Self::Admin];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Executive => "Executive",
            Self::Engineer => "Engineer",
            Self::Admin => "Admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Executive" => Some(Self::Executive),
            "Engineer" => Some(Self::Engineer),
            "Admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerType {
    Partner,
    EndCustomer,
}

impl CustomerType {
    pub const ALL: [Self; 2] = [Self::Partner, Self::EndCustomer];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Partner => "Partner",
            Self::EndCustomer => "End Customer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Partner" => Some(Self::Partner),
            "End Customer" => Some(Self::EndCustomer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScreenKind {
    Devices,
    Organizations,
    Users,
}

impl ScreenKind {
    pub const ALL: [Self; 3] = [Self::Devices, Self::Organizations, Self::Users];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Devices => "devices",
            Self::Organizations => "orgs",
            Self::Users => "users",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormKind {
    Device,
    Organization,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    Nav,
    Search,
    Form(FormKind),
    Detail,
}

/// A registered treatment unit. `created_on` is carried as the backend's
/// display string; it is rendered, never compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: DeviceId,
    pub customer: String,
    pub city: String,
    pub state: String,
    pub pool_status: String,
    pub mqtt_topic: String,
    pub created_on: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub organization_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone_no: String,
    pub customer_type: String,
    pub status: String,
    pub address: String,
    pub country: String,
    pub state: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub user_role: String,
    pub status: String,
    pub created_on: String,
}

/// Country -> state -> cities used by device edit forms. Mirrors the
/// shipped product's fixed location table.
pub fn location_states(country: &str) -> &'static [&'static str] {
    match country {
        "USA" => &["Texas", "Nevada", "California", "Florida"],
        "UK" => &["England", "Scotland"],
        "Canada" => &["Ontario", "British Columbia"],
        _ => &[],
    }
}

pub fn location_cities(country: &str, state: &str) -> &'static [&'static str] {
    match (country, state) {
        ("USA", "Texas") => &["Austin", "Dallas", "Houston"],
        ("USA", "Nevada") => &["Reno", "Las Vegas"],
        ("USA", "California") => &["San Diego", "Sacramento", "Fresno"],
        ("USA", "Florida") => &["Miami", "Orlando", "Tampa"],
        ("UK", "England") => &["London", "Manchester", "Bristol"],
        ("UK", "Scotland") => &["Edinburgh", "Glasgow"],
        ("Canada", "Ontario") => &["Toronto", "Ottawa"],
        ("Canada", "British Columbia") => &["Vancouver", "Victoria"],
        _ => &[],
    }
}

pub fn location_countries() -> &'static [&'static str] {
    &["USA", "UK", "Canada"]
}

#[cfg(test)]
mod tests {
    use super::{CustomerType, PoolStatus, UserStatus, location_cities, location_states};

    #[test]
    fn pool_status_round_trips_backend_literals() {
        for status in PoolStatus::ALL {
            assert_eq!(PoolStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PoolStatus::parse("excellent"), None);
    }

    #[test]
    fn customer_type_uses_spaced_literal() {
        assert_eq!(CustomerType::EndCustomer.as_str(), "End Customer");
        assert_eq!(
            CustomerType::parse("End Customer"),
            Some(CustomerType::EndCustomer)
        );
    }

    #[test]
    fn user_status_includes_pending() {
        assert_eq!(UserStatus::parse("Pending"), Some(UserStatus::Pending));
    }

    #[test]
    fn location_lookup_cascades() {
        assert!(location_states("USA").contains(&"Nevada"));
        assert!(location_cities("USA", "Nevada").contains(&"Reno"));
        assert!(location_cities("USA", "Unknown").is_empty());
        assert!(location_states("Mars").is_empty());
    }
}
