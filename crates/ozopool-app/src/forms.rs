// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::{Device, FormKind, Organization, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFormInput {
    pub device_id: String,
    pub mqtt_topic: String,
    pub country: String,
    pub state: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationFormInput {
    pub organization_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone_no: String,
    pub customer_type: String,
    pub address: String,
    pub country: String,
    pub state: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFormInput {
    pub username: String,
    pub email: String,
    pub user_role: String,
}

/// New-password form from the invite flow. The `encryption` id arrives
/// out of band (emailed link).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordFormInput {
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPayload {
    Device(DeviceFormInput),
    Organization(OrganizationFormInput),
    User(UserFormInput),
}

impl FormPayload {
    pub fn kind(&self) -> FormKind {
        match self {
            Self::Device(_) => FormKind::Device,
            Self::Organization(_) => FormKind::Organization,
            Self::User(_) => FormKind::User,
        }
    }

    pub fn blank_for(kind: FormKind) -> Self {
        match kind {
            FormKind::Device => Self::Device(DeviceFormInput {
                device_id: String::new(),
                mqtt_topic: String::new(),
                country: String::new(),
                state: String::new(),
                city: String::new(),
            }),
            FormKind::Organization => Self::Organization(OrganizationFormInput {
                organization_name: String::new(),
                contact_name: String::new(),
                email: String::new(),
                phone_no: String::new(),
                customer_type: String::new(),
                address: String::new(),
                country: String::new(),
                state: String::new(),
                city: String::new(),
            }),
            FormKind::User => Self::User(UserFormInput {
                username: String::new(),
                email: String::new(),
                user_role: String::new(),
            }),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Device(device) => device.validate(),
            Self::Organization(organization) => organization.validate(),
            Self::User(user) => user.validate(),
        }
    }
}

impl DeviceFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.device_id.trim().is_empty() {
            bail!("device id is required -- enter a device id and retry");
        }
        if self.mqtt_topic.trim().is_empty() {
            bail!("MQTT topic is required -- enter a topic and retry");
        }
        Ok(())
    }

    /// Duplicate check against the current record set, skipping the row
    /// being edited. Case-insensitive, matching the backend's keying.
    pub fn ensure_unique_device_id(&self, devices: &[Device], editing: Option<&str>) -> Result<()> {
        let candidate = self.device_id.to_lowercase();
        let duplicate = devices.iter().any(|device| {
            let existing = device.device_id.as_str();
            editing != Some(existing) && existing.to_lowercase() == candidate
        });
        if duplicate {
            bail!(
                "device id {:?} already exists -- choose a different id",
                self.device_id
            );
        }
        Ok(())
    }
}

impl OrganizationFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.organization_name.trim().is_empty() {
            bail!("organization name is required -- enter a name and retry");
        }
        if self.contact_name.trim().is_empty() {
            bail!("contact name is required -- enter a contact and retry");
        }
        if !is_valid_email(&self.email) {
            bail!("organization email {:?} is not a valid address", self.email);
        }
        if self.customer_type.trim().is_empty() {
            bail!("customer type is required -- choose Partner or End Customer");
        }
        Ok(())
    }
}

impl UserFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            bail!("username is required -- enter a username and retry");
        }
        if !is_valid_email(&self.email) {
            bail!("user email {:?} is not a valid address", self.email);
        }
        if self.user_role.trim().is_empty() {
            bail!("user role is required -- choose a role and retry");
        }
        Ok(())
    }

    pub fn ensure_unique_email(&self, users: &[User], editing: Option<&str>) -> Result<()> {
        let candidate = self.email.to_lowercase();
        let duplicate = users.iter().any(|user| {
            editing != Some(user.id.as_str()) && user.email.to_lowercase() == candidate
        });
        if duplicate {
            bail!(
                "a user with email {:?} already exists -- use a different address",
                self.email
            );
        }
        Ok(())
    }
}

impl PasswordFormInput {
    pub fn validate(&self) -> Result<()> {
        if self.password.is_empty() {
            bail!("password is required");
        }
        if self.password.chars().count() < 8 {
            bail!("password must be at least 8 characters");
        }
        if self.password != self.confirm_password {
            bail!("passwords do not match -- retype both and retry");
        }
        Ok(())
    }
}

/// Same shape the shipped product enforces: one `@`, no whitespace, and
/// a dot somewhere after the `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty()
}

#[cfg(test)]
mod tests {
    use super::{
        DeviceFormInput, FormPayload, PasswordFormInput, UserFormInput, is_valid_email,
    };
    use crate::{Device, DeviceId, FormKind, User, UserId};

    fn device_input(id: &str) -> DeviceFormInput {
        DeviceFormInput {
            device_id: id.to_owned(),
            mqtt_topic: "stp/sensors/data".to_owned(),
            country: String::new(),
            state: String::new(),
            city: String::new(),
        }
    }

    fn existing_device(id: &str) -> Device {
        Device {
            device_id: DeviceId::from(id),
            customer: String::new(),
            city: String::new(),
            state: String::new(),
            pool_status: "Good".to_owned(),
            mqtt_topic: String::new(),
            created_on: String::new(),
        }
    }

    #[test]
    fn blank_payloads_exist_for_every_kind() {
        for kind in [FormKind::Device, FormKind::Organization, FormKind::User] {
            assert_eq!(FormPayload::blank_for(kind).kind(), kind);
        }
    }

    #[test]
    fn device_validation_requires_id_and_topic() {
        let mut input = device_input("");
        assert!(input.validate().is_err());

        input.device_id = "OZ-100".to_owned();
        input.mqtt_topic = "  ".to_owned();
        assert!(input.validate().is_err());

        input.mqtt_topic = "stp/sensors/data".to_owned();
        assert!(input.validate().is_ok());
    }

    #[test]
    fn duplicate_device_id_is_case_insensitive() {
        let devices = vec![existing_device("OZ-100")];
        let input = device_input("oz-100");
        assert!(input.ensure_unique_device_id(&devices, None).is_err());
    }

    #[test]
    fn duplicate_check_skips_the_row_being_edited() {
        let devices = vec![existing_device("OZ-100")];
        let input = device_input("OZ-100");
        assert!(input.ensure_unique_device_id(&devices, Some("OZ-100")).is_ok());
    }

    #[test]
    fn user_validation_rejects_malformed_email() {
        let input = UserFormInput {
            username: "ana".to_owned(),
            email: "ana@nodot".to_owned(),
            user_role: "Admin".to_owned(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn duplicate_email_excludes_edited_user() {
        let users = vec![User {
            id: UserId::from("u1"),
            username: "ana".to_owned(),
            email: "ana@ozopool.in".to_owned(),
            user_role: "Admin".to_owned(),
            status: "Active".to_owned(),
            created_on: String::new(),
        }];
        let input = UserFormInput {
            username: "ana".to_owned(),
            email: "ANA@ozopool.in".to_owned(),
            user_role: "Admin".to_owned(),
        };
        assert!(input.ensure_unique_email(&users, None).is_err());
        assert!(input.ensure_unique_email(&users, Some("u1")).is_ok());
    }

    #[test]
    fn password_form_enforces_length_and_match() {
        let short = PasswordFormInput {
            password: "secret".to_owned(),
            confirm_password: "secret".to_owned(),
        };
        assert!(short.validate().is_err());

        let mismatch = PasswordFormInput {
            password: "longenough".to_owned(),
            confirm_password: "different1".to_owned(),
        };
        assert!(mismatch.validate().is_err());

        let ok = PasswordFormInput {
            password: "longenough".to_owned(),
            confirm_password: "longenough".to_owned(),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn email_shape_check() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("plain"));
    }
}
