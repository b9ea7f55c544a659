// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! One source per screen. The table layer talks to `RecordSource` and
//! never sees endpoint paths or wire field names.

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use ozopool_app::{
    Device, DeviceFormInput, ListRow, Organization, OrganizationFormInput, ScreenKind, Session,
    User, UserFormInput,
};

use crate::Client;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Activate,
    Deactivate,
}

impl StatusChange {
    const fn path_segment(self) -> &'static str {
        match self {
            Self::Activate => "activate/",
            Self::Deactivate => "inactivate/",
        }
    }
}

pub trait RecordSource {
    type Record: ListRow;
    type Draft;

    fn screen(&self) -> ScreenKind;
    fn list(&self, client: &Client, session: &Session) -> Result<Vec<Self::Record>>;
    fn create(&self, client: &Client, session: &Session, draft: &Self::Draft) -> Result<()>;
    fn update(
        &self,
        client: &Client,
        session: &Session,
        id: &str,
        draft: &Self::Draft,
    ) -> Result<()>;
    fn set_status(
        &self,
        client: &Client,
        session: &Session,
        id: &str,
        change: StatusChange,
    ) -> Result<()>;
    fn delete(&self, client: &Client, session: &Session, id: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceSource;

impl RecordSource for DeviceSource {
    type Record = Device;
    type Draft = DeviceFormInput;

    fn screen(&self) -> ScreenKind {
        ScreenKind::Devices
    }

    fn list(&self, client: &Client, session: &Session) -> Result<Vec<Device>> {
        let response = client.get_authed("/devices/list/", session)?;
        let rows: Vec<DeviceDto> = response.json().context("decode device list")?;
        Ok(rows.into_iter().map(DeviceDto::into_record).collect())
    }

    fn create(&self, client: &Client, session: &Session, draft: &DeviceFormInput) -> Result<()> {
        draft.validate()?;
        client.post_authed("/devices/add/", session, &device_body(draft, None))
    }

    fn update(
        &self,
        client: &Client,
        session: &Session,
        id: &str,
        draft: &DeviceFormInput,
    ) -> Result<()> {
        draft.validate()?;
        client.patch_authed("/devices/edit/", session, &device_body(draft, Some(id)))
    }

    // Pool status is computed from readings, never set by hand.
    fn set_status(&self, _: &Client, _: &Session, _: &str, _: StatusChange) -> Result<()> {
        bail!("device pool status is derived from sensor readings and cannot be set")
    }

    fn delete(&self, client: &Client, session: &Session, id: &str) -> Result<()> {
        client.delete_authed(
            "/devices/delete/",
            session,
            &serde_json::json!({ "deviceId": id }),
        )
    }
}

fn device_body(draft: &DeviceFormInput, editing: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "deviceId": editing.unwrap_or(&draft.device_id),
        "mqttTopic": draft.mqtt_topic,
        "country": draft.country,
        "state": draft.state,
        "city": draft.city,
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrganizationSource;

impl RecordSource for OrganizationSource {
    type Record = Organization;
    type Draft = OrganizationFormInput;

    fn screen(&self) -> ScreenKind {
        ScreenKind::Organizations
    }

    fn list(&self, client: &Client, session: &Session) -> Result<Vec<Organization>> {
        let response = client.get_authed("/organization/", session)?;
        let rows: Vec<OrganizationDto> = response.json().context("decode organization list")?;
        Ok(rows.into_iter().map(OrganizationDto::into_record).collect())
    }

    fn create(
        &self,
        client: &Client,
        session: &Session,
        draft: &OrganizationFormInput,
    ) -> Result<()> {
        draft.validate()?;
        client.post_authed("/organization/add/", session, &organization_body(draft, None))
    }

    fn update(
        &self,
        client: &Client,
        session: &Session,
        id: &str,
        draft: &OrganizationFormInput,
    ) -> Result<()> {
        draft.validate()?;
        client.patch_authed(
            "/organization/edit/",
            session,
            &organization_body(draft, Some(id)),
        )
    }

    fn set_status(
        &self,
        client: &Client,
        session: &Session,
        id: &str,
        change: StatusChange,
    ) -> Result<()> {
        client.patch_authed(
            &format!("/organization/{}", change.path_segment()),
            session,
            &serde_json::json!({ "organizationId": id }),
        )
    }

    fn delete(&self, _: &Client, _: &Session, _: &str) -> Result<()> {
        bail!("organizations are deactivated, not deleted -- use set_status")
    }
}

fn organization_body(draft: &OrganizationFormInput, editing: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "organizationName": draft.organization_name,
        "contactName": draft.contact_name,
        "email": draft.email,
        "phoneNo": draft.phone_no,
        "customerType": draft.customer_type,
        "address": draft.address,
        "country": draft.country,
        "state": draft.state,
        "city": draft.city,
    });
    if let Some(id) = editing {
        body["organizationId"] = serde_json::Value::String(id.to_owned());
    }
    body
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UserSource;

impl RecordSource for UserSource {
    type Record = User;
    type Draft = UserFormInput;

    fn screen(&self) -> ScreenKind {
        ScreenKind::Users
    }

    fn list(&self, client: &Client, session: &Session) -> Result<Vec<User>> {
        let response = client.get_authed("/users/", session)?;
        let rows: Vec<UserDto> = response.json().context("decode user list")?;
        Ok(rows.into_iter().map(UserDto::into_record).collect())
    }

    fn create(&self, client: &Client, session: &Session, draft: &UserFormInput) -> Result<()> {
        draft.validate()?;
        client.post_authed("/users/add/", session, &user_body(draft, None))
    }

    fn update(
        &self,
        client: &Client,
        session: &Session,
        id: &str,
        draft: &UserFormInput,
    ) -> Result<()> {
        draft.validate()?;
        client.patch_authed("/users/edit/", session, &user_body(draft, Some(id)))
    }

    fn set_status(
        &self,
        client: &Client,
        session: &Session,
        id: &str,
        change: StatusChange,
    ) -> Result<()> {
        client.patch_authed(
            &format!("/users/{}", change.path_segment()),
            session,
            &serde_json::json!({ "userId": id }),
        )
    }

    fn delete(&self, _: &Client, _: &Session, _: &str) -> Result<()> {
        bail!("users are deactivated, not deleted -- use set_status")
    }
}

fn user_body(draft: &UserFormInput, editing: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "username": draft.username,
        "email": draft.email,
        "userRole": draft.user_role,
    });
    if let Some(id) = editing {
        body["userId"] = serde_json::Value::String(id.to_owned());
    }
    body
}

// Wire rows. Fields the backend omits decode as empty strings so the
// table renders blanks instead of failing the whole list.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DeviceDto {
    device_id: String,
    customer: String,
    city: String,
    state: String,
    pool_status: String,
    mqtt_topic: String,
    created_on: String,
}

impl DeviceDto {
    pub(crate) fn into_record(self) -> Device {
        Device {
            device_id: self.device_id.into(),
            customer: self.customer,
            city: self.city,
            state: self.state,
            pool_status: self.pool_status,
            mqtt_topic: self.mqtt_topic,
            created_on: self.created_on,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct OrganizationDto {
    #[serde(rename = "_id")]
    id: String,
    organization_name: String,
    contact_name: String,
    email: String,
    phone_no: String,
    customer_type: String,
    status: String,
    address: String,
    country: String,
    state: String,
    city: String,
}

impl OrganizationDto {
    pub(crate) fn into_record(self) -> Organization {
        Organization {
            id: self.id.into(),
            organization_name: self.organization_name,
            contact_name: self.contact_name,
            email: self.email,
            phone_no: self.phone_no,
            customer_type: self.customer_type,
            status: self.status,
            address: self.address,
            country: self.country,
            state: self.state,
            city: self.city,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct UserDto {
    #[serde(rename = "_id")]
    id: String,
    username: String,
    email: String,
    user_role: String,
    status: String,
    created_on: String,
}

impl UserDto {
    pub(crate) fn into_record(self) -> User {
        User {
            id: self.id.into(),
            username: self.username,
            email: self.email,
            user_role: self.user_role,
            status: self.status,
            created_on: self.created_on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DeviceDto, OrganizationDto, UserDto, device_body, organization_body, user_body};
    use anyhow::Result;
    use ozopool_app::{DeviceFormInput, OrganizationFormInput, UserFormInput};

    #[test]
    fn device_rows_tolerate_missing_fields() -> Result<()> {
        let rows: Vec<DeviceDto> =
            serde_json::from_str(r#"[{"deviceId":"OZ-100","customer":"Lakeside"}]"#)?;
        let device = rows
            .into_iter()
            .next()
            .expect("one row expected")
            .into_record();
        assert_eq!(device.device_id.as_str(), "OZ-100");
        assert_eq!(device.customer, "Lakeside");
        assert_eq!(device.pool_status, "");
        assert_eq!(device.created_on, "");
        Ok(())
    }

    #[test]
    fn organization_rows_decode_backend_ids() -> Result<()> {
        let rows: Vec<OrganizationDto> = serde_json::from_str(
            r#"[{"_id":"64ab","organizationName":"AquaPure","customerType":"Partner","status":"Active"}]"#,
        )?;
        let organization = rows
            .into_iter()
            .next()
            .expect("one row expected")
            .into_record();
        assert_eq!(organization.id.as_str(), "64ab");
        assert_eq!(organization.organization_name, "AquaPure");
        assert_eq!(organization.customer_type, "Partner");
        Ok(())
    }

    #[test]
    fn user_rows_decode_backend_ids() -> Result<()> {
        let rows: Vec<UserDto> = serde_json::from_str(
            r#"[{"_id":"u1","username":"ana","email":"ana@ozopool.in","userRole":"Admin","status":"Pending"}]"#,
        )?;
        let user = rows
            .into_iter()
            .next()
            .expect("one row expected")
            .into_record();
        assert_eq!(user.id.as_str(), "u1");
        assert_eq!(user.status, "Pending");
        Ok(())
    }

    #[test]
    fn edit_bodies_carry_the_record_id() {
        let draft = DeviceFormInput {
            device_id: "OZ-100".to_owned(),
            mqtt_topic: "stp/sensors/data".to_owned(),
            country: "USA".to_owned(),
            state: "Texas".to_owned(),
            city: "Austin".to_owned(),
        };
        let body = device_body(&draft, Some("OZ-100"));
        assert_eq!(body["deviceId"], "OZ-100");
        assert_eq!(body["mqttTopic"], "stp/sensors/data");

        let draft = OrganizationFormInput {
            organization_name: "AquaPure".to_owned(),
            contact_name: "Mira".to_owned(),
            email: "mira@aquapure.example".to_owned(),
            phone_no: "555-0101".to_owned(),
            customer_type: "Partner".to_owned(),
            address: "12 Dock St".to_owned(),
            country: "USA".to_owned(),
            state: "Texas".to_owned(),
            city: "Austin".to_owned(),
        };
        let body = organization_body(&draft, Some("64ab"));
        assert_eq!(body["organizationId"], "64ab");
        assert!(organization_body(&draft, None).get("organizationId").is_none());

        let draft = UserFormInput {
            username: "ana".to_owned(),
            email: "ana@ozopool.in".to_owned(),
            user_role: "Admin".to_owned(),
        };
        let body = user_body(&draft, Some("u1"));
        assert_eq!(body["userId"], "u1");
        assert!(user_body(&draft, None).get("userId").is_none());
    }
}
