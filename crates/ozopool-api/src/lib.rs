// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use time::OffsetDateTime;
use url::Url;

use ozopool_app::{
    Device, DeviceCommand, DeviceId, DeviceThresholds, MqttTopics, Organization, OrganizationId,
    PasswordFormInput, SensorSnapshot, Session, ThresholdRange, User,
};

pub mod feed;
pub mod records;

pub use feed::{TelemetrySubscription, subscribe};
pub use records::{DeviceSource, OrganizationSource, RecordSource, StatusChange, UserSource};

/// The backend rejected the token. Callers drop the session and return
/// to login instead of surfacing this as an ordinary request failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRequired;

impl fmt::Display for AuthRequired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("session rejected by the backend -- log in again")
    }
}

impl std::error::Error for AuthRequired {}

pub fn is_auth_required(error: &anyhow::Error) -> bool {
    error.is::<AuthRequired>()
}

/// Everything a device detail fetch returns: the owner, the latest
/// readings, and the thresholds those readings are judged against.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDetail {
    pub owner_id: String,
    pub snapshot: SensorSnapshot,
    pub thresholds: DeviceThresholds,
}

/// Drill-down for one organization: its profile, a device rollup, and
/// the sub-organizations, users, and devices the backend nests under it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationDetail {
    pub organization: Organization,
    pub statistics: OrganizationStatistics,
    pub sub_organizations: Vec<Organization>,
    pub users: Vec<User>,
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrganizationStatistics {
    pub total_devices: u64,
    pub active_devices: u64,
    pub need_attention: u64,
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .with_context(|| format!("api.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("api.base_url must be http or https, got {:?}", parsed.scheme());
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn login(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .http
            .post(format!("{}/users/login/", self.base_url))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let response = check_status(response)?;
        let parsed: LoginResponse = response.json().context("decode login response")?;
        Ok(Session {
            access_token: parsed.access_token,
            user_role: parsed.user_role,
            customer_type: parsed.customer_type,
            user_id: parsed.user_id.into(),
            email: email.to_owned(),
            issued_at: OffsetDateTime::now_utc(),
        })
    }

    /// Invite flow. The encryption id comes from the emailed link, so no
    /// session is involved.
    pub fn set_password(&self, encryption_id: &str, form: &PasswordFormInput) -> Result<()> {
        form.validate()?;
        let response = self
            .http
            .patch(format!("{}/users/set-password/", self.base_url))
            .query(&[("encryption", encryption_id)])
            .json(&serde_json::json!({
                "password": form.password,
                "confirmPassword": form.confirm_password,
            }))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        check_status(response)?;
        Ok(())
    }

    pub fn device_detail(&self, session: &Session, device_id: &DeviceId) -> Result<DeviceDetail> {
        let response = self
            .authed(
                self.http
                    .get(format!("{}/devices/detail/", self.base_url))
                    .query(&[("deviceId", device_id.as_str())]),
                session,
            )
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let response = check_status(response)?;
        let parsed: DeviceDetailResponse = response.json().context("decode device detail")?;
        Ok(parsed.into_detail())
    }

    pub fn organization_detail(
        &self,
        session: &Session,
        organization_id: &OrganizationId,
    ) -> Result<OrganizationDetail> {
        let response = self
            .authed(
                self.http
                    .get(format!("{}/organization/detail/", self.base_url))
                    .query(&[("objectId", organization_id.as_str())]),
                session,
            )
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let response = check_status(response)?;
        let parsed: OrganizationDetailResponse =
            response.json().context("decode organization detail")?;
        Ok(parsed.organization.into_detail())
    }

    pub fn update_thresholds(
        &self,
        session: &Session,
        device_id: &DeviceId,
        thresholds: &DeviceThresholds,
    ) -> Result<()> {
        thresholds.validate()?;
        let body = serde_json::json!({
            "deviceId": device_id.as_str(),
            "minimumPh": thresholds.ph.min,
            "maximumPh": thresholds.ph.max,
            "minimumORP": thresholds.orp.min,
            "maximumORP": thresholds.orp.max,
            "minimumTemperature": thresholds.temperature.min,
            "maximumTemperature": thresholds.temperature.max,
        });
        self.patch_authed("/devices/thresholds/", session, &body)
    }

    pub fn update_mqtt_topics(
        &self,
        session: &Session,
        device_id: &DeviceId,
        topics: &MqttTopics,
    ) -> Result<()> {
        topics.validate()?;
        let body = serde_json::json!({
            "deviceId": device_id.as_str(),
            "readTopic": topics.read,
            "writeTopic": topics.write,
        });
        self.patch_authed("/devices/mqtt-topics/", session, &body)
    }

    /// Equipment switching is proxied through the backend, which owns
    /// the broker connection.
    pub fn publish_command(
        &self,
        session: &Session,
        device_id: &DeviceId,
        command: &DeviceCommand,
    ) -> Result<()> {
        command.validate()?;
        let mut body = serde_json::json!({
            "deviceId": device_id.as_str(),
            "device": command.device.as_str(),
            "action": command.action.as_str(),
        });
        if let Some(timer) = &command.timer {
            body["timer"] = serde_json::Value::String(timer.clone());
        }
        self.post_authed("/devices/control/", session, &body)
    }

    fn authed(&self, builder: RequestBuilder, session: &Session) -> RequestBuilder {
        builder.header("Authorization", session.bearer_header())
    }

    pub(crate) fn get_authed(&self, path: &str, session: &Session) -> Result<Response> {
        let response = self
            .authed(self.http.get(format!("{}{path}", self.base_url)), session)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        check_status(response)
    }

    pub(crate) fn post_authed(
        &self,
        path: &str,
        session: &Session,
        body: &serde_json::Value,
    ) -> Result<()> {
        let response = self
            .authed(
                self.http.post(format!("{}{path}", self.base_url)).json(body),
                session,
            )
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        check_status(response)?;
        Ok(())
    }

    pub(crate) fn patch_authed(
        &self,
        path: &str,
        session: &Session,
        body: &serde_json::Value,
    ) -> Result<()> {
        let response = self
            .authed(
                self.http.patch(format!("{}{path}", self.base_url)).json(body),
                session,
            )
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        check_status(response)?;
        Ok(())
    }

    pub(crate) fn delete_authed(
        &self,
        path: &str,
        session: &Session,
        body: &serde_json::Value,
    ) -> Result<()> {
        let response = self
            .authed(
                self.http
                    .delete(format!("{}{path}", self.base_url))
                    .json(body),
                session,
            )
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;
        check_status(response)?;
        Ok(())
    }
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check api.base_url and that the backend is up ({})",
        base_url,
        error
    )
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(anyhow::Error::new(AuthRequired));
    }
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(clean_error_response(status, &body));
    }
    Ok(response)
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), error);
    }

    if let Ok(parsed) = serde_json::from_str::<MessageEnvelope>(body)
        && let Some(message) = parsed.message
        && !message.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), message);
    }

    if body.len() < 100 && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
    #[serde(default)]
    customer_type: String,
    #[serde(default)]
    user_role: String,
    #[serde(default)]
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct DeviceDetailResponse {
    #[serde(default)]
    user_id: String,
    data: DeviceDetailData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceDetailData {
    #[serde(default)]
    ph: f64,
    #[serde(default)]
    orp: f64,
    #[serde(default)]
    ozone_level: f64,
    #[serde(default)]
    temperature: f64,
    minimum_ph: Option<f64>,
    maximum_ph: Option<f64>,
    #[serde(rename = "minimumORP")]
    minimum_orp: Option<f64>,
    #[serde(rename = "maximumORP")]
    maximum_orp: Option<f64>,
    minimum_temperature: Option<f64>,
    maximum_temperature: Option<f64>,
    #[serde(default)]
    power: bool,
}

impl DeviceDetailResponse {
    /// Thresholds fall back to the shipped defaults field by field;
    /// devices provisioned before the thresholds feature omit them.
    fn into_detail(self) -> DeviceDetail {
        let defaults = DeviceThresholds::default();
        let data = self.data;
        DeviceDetail {
            owner_id: self.user_id,
            snapshot: SensorSnapshot {
                ph: data.ph,
                orp: data.orp,
                temperature: data.temperature,
                ozone_level: data.ozone_level,
                power: data.power,
            },
            thresholds: DeviceThresholds {
                ph: ThresholdRange {
                    min: data.minimum_ph.unwrap_or(defaults.ph.min),
                    max: data.maximum_ph.unwrap_or(defaults.ph.max),
                },
                orp: ThresholdRange {
                    min: data.minimum_orp.unwrap_or(defaults.orp.min),
                    max: data.maximum_orp.unwrap_or(defaults.orp.max),
                },
                temperature: ThresholdRange {
                    min: data.minimum_temperature.unwrap_or(defaults.temperature.min),
                    max: data.maximum_temperature.unwrap_or(defaults.temperature.max),
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct OrganizationDetailResponse {
    organization: OrganizationDetailDto,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct OrganizationDetailDto {
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
    statistics: StatisticsDto,
    organizations: Vec<records::OrganizationDto>,
    users: Vec<records::UserDto>,
    devices: Vec<records::DeviceDto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StatisticsDto {
    total_devices: u64,
    active_devices: u64,
    need_attention: u64,
}

impl OrganizationDetailDto {
    fn into_detail(self) -> OrganizationDetail {
        OrganizationDetail {
            organization: Organization {
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
            },
            statistics: OrganizationStatistics {
                total_devices: self.statistics.total_devices,
                active_devices: self.statistics.active_devices,
                need_attention: self.statistics.need_attention,
            },
            sub_organizations: self
                .organizations
                .into_iter()
                .map(records::OrganizationDto::into_record)
                .collect(),
            users: self
                .users
                .into_iter()
                .map(records::UserDto::into_record)
                .collect(),
            devices: self
                .devices
                .into_iter()
                .map(records::DeviceDto::into_record)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageEnvelope {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{AuthRequired, Client, clean_error_response, is_auth_required};
    use anyhow::anyhow;
    use reqwest::StatusCode;
    use std::time::Duration;

    #[test]
    fn rejects_malformed_base_url() {
        assert!(Client::new("not a url", Duration::from_secs(1)).is_err());
        assert!(Client::new("ftp://api.ozopool.in", Duration::from_secs(1)).is_err());
        assert!(Client::new("https://api.ozopool.in/", Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let client = Client::new("https://api.ozopool.in/", Duration::from_secs(1))
            .expect("client should initialize");
        assert_eq!(client.base_url(), "https://api.ozopool.in");
    }

    #[test]
    fn error_envelope_message_is_surfaced() {
        let error = clean_error_response(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Device already exists"}"#,
        );
        assert!(error.to_string().contains("Device already exists"));

        let error = clean_error_response(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Invalid organization"}"#,
        );
        assert!(error.to_string().contains("Invalid organization"));
    }

    #[test]
    fn opaque_bodies_fall_back_to_status_code() {
        let error = clean_error_response(StatusCode::BAD_GATEWAY, r#"{"detail":{"nested":1}}"#);
        assert_eq!(error.to_string(), "server returned 502");
    }

    #[test]
    fn auth_required_is_detectable_through_anyhow() {
        let error = anyhow::Error::new(AuthRequired);
        assert!(is_auth_required(&error));
        assert!(!is_auth_required(&anyhow!("some other failure")));
    }
}
