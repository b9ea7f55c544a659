// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::time::Duration;

use ozopool_api::{
    Client, DeviceDetail, DeviceSource, OrganizationDetail, OrganizationSource, RecordSource,
    StatusChange, TelemetrySubscription, UserSource, is_auth_required, subscribe,
};
use ozopool_app::{
    Device, DeviceCommand, DeviceId, DeviceThresholds, FormPayload, Organization, OrganizationId,
    PoolStatus, ScreenKind, Session, User,
};
use ozopool_testkit::PoolFaker;
use ozopool_tui::{
    AppRuntime, DeviceDetailView, OrganizationDetailView, RecordAction, ScreenRecords,
};
use time::OffsetDateTime;

/// Runtime backed by the real backend. Holds the session it was logged
/// in with; every call passes it explicitly.
pub struct ApiRuntime {
    client: Client,
    session: Session,
    poll_interval: Duration,
    feed: Option<TelemetrySubscription>,
}

impl ApiRuntime {
    pub fn new(client: Client, session: Session, poll_interval: Duration) -> Self {
        Self {
            client,
            session,
            poll_interval,
            feed: None,
        }
    }

    /// The expiry window is enforced locally; a request with a stale
    /// token never leaves the process.
    fn session(&self) -> Result<&Session> {
        if self.session.is_expired(OffsetDateTime::now_utc()) {
            bail!("session expired -- restart ozopool and log in again");
        }
        Ok(&self.session)
    }

    fn dispatch_action<S: RecordSource>(
        &self,
        source: &S,
        row_id: &str,
        action: RecordAction,
    ) -> Result<()> {
        let session = self.session()?;
        match action {
            RecordAction::Activate => {
                source.set_status(&self.client, session, row_id, StatusChange::Activate)
            }
            RecordAction::Deactivate => {
                source.set_status(&self.client, session, row_id, StatusChange::Deactivate)
            }
            RecordAction::Delete => source.delete(&self.client, session, row_id),
        }
    }

    fn close_feed(&mut self) {
        if let Some(feed) = self.feed.take() {
            feed.cancel();
        }
    }
}

fn auth_hint(error: anyhow::Error) -> anyhow::Error {
    if is_auth_required(&error) {
        error.context("restart ozopool and log in again")
    } else {
        error
    }
}

fn to_view(detail: DeviceDetail) -> DeviceDetailView {
    DeviceDetailView {
        owner_id: detail.owner_id,
        snapshot: detail.snapshot,
        thresholds: detail.thresholds,
    }
}

fn to_org_view(detail: OrganizationDetail) -> OrganizationDetailView {
    OrganizationDetailView {
        organization: detail.organization,
        total_devices: detail.statistics.total_devices,
        active_devices: detail.statistics.active_devices,
        need_attention: detail.statistics.need_attention,
        sub_organizations: detail.sub_organizations,
        users: detail.users,
        devices: detail.devices,
    }
}

impl AppRuntime for ApiRuntime {
    fn load_records(&mut self, screen: ScreenKind) -> Result<ScreenRecords> {
        let session = self.session()?;
        let records = match screen {
            ScreenKind::Devices => DeviceSource
                .list(&self.client, session)
                .map(ScreenRecords::Devices),
            ScreenKind::Organizations => OrganizationSource
                .list(&self.client, session)
                .map(ScreenRecords::Organizations),
            ScreenKind::Users => UserSource
                .list(&self.client, session)
                .map(ScreenRecords::Users),
        };
        records.map_err(auth_hint)
    }

    fn submit_form(&mut self, payload: &FormPayload, editing: Option<&str>) -> Result<()> {
        payload.validate()?;
        let session = self.session()?;
        let outcome = match (payload, editing) {
            (FormPayload::Device(form), None) => DeviceSource.create(&self.client, session, form),
            (FormPayload::Device(form), Some(id)) => {
                DeviceSource.update(&self.client, session, id, form)
            }
            (FormPayload::Organization(form), None) => {
                OrganizationSource.create(&self.client, session, form)
            }
            (FormPayload::Organization(form), Some(id)) => {
                OrganizationSource.update(&self.client, session, id, form)
            }
            (FormPayload::User(form), None) => UserSource.create(&self.client, session, form),
            (FormPayload::User(form), Some(id)) => {
                UserSource.update(&self.client, session, id, form)
            }
        };
        outcome.map_err(auth_hint)
    }

    fn apply_record_action(
        &mut self,
        screen: ScreenKind,
        row_id: &str,
        action: RecordAction,
    ) -> Result<()> {
        let outcome = match screen {
            ScreenKind::Devices => self.dispatch_action(&DeviceSource, row_id, action),
            ScreenKind::Organizations => self.dispatch_action(&OrganizationSource, row_id, action),
            ScreenKind::Users => self.dispatch_action(&UserSource, row_id, action),
        };
        outcome.map_err(auth_hint)
    }

    fn open_device_detail(&mut self, device_id: &DeviceId) -> Result<DeviceDetailView> {
        let session = self.session()?.clone();
        self.close_feed();
        let detail = self
            .client
            .device_detail(&session, device_id)
            .map_err(auth_hint)?;
        self.feed = Some(subscribe(
            self.client.clone(),
            session,
            device_id.clone(),
            self.poll_interval,
        ));
        Ok(to_view(detail))
    }

    fn open_organization_detail(
        &mut self,
        organization_id: &str,
    ) -> Result<OrganizationDetailView> {
        let detail = self
            .client
            .organization_detail(self.session()?, &OrganizationId::from(organization_id))
            .map_err(auth_hint)?;
        Ok(to_org_view(detail))
    }

    fn poll_device_detail(&mut self) -> Option<DeviceDetailView> {
        // Poll errors keep the last good reading on screen.
        match self.feed.as_ref()?.latest()? {
            Ok(detail) => Some(to_view(detail)),
            Err(_) => None,
        }
    }

    fn close_device_detail(&mut self) {
        self.close_feed();
    }

    fn send_command(&mut self, device_id: &DeviceId, command: &DeviceCommand) -> Result<()> {
        command.validate()?;
        let session = self.session()?;
        self.client
            .publish_command(session, device_id, command)
            .map_err(auth_hint)
    }
}

const DEMO_DATE: &str = "2026-08-31";

/// Offline runtime over a deterministic in-memory fleet. Same seed,
/// same records.
pub struct DemoRuntime {
    faker: PoolFaker,
    devices: Vec<Device>,
    organizations: Vec<Organization>,
    users: Vec<User>,
    next_id: u32,
}

impl DemoRuntime {
    pub fn new(seed: u64) -> Self {
        let mut faker = PoolFaker::new(seed);
        let devices = (0..8).map(|_| faker.device()).collect();
        let organizations = (0..5).map(|_| faker.organization()).collect();
        let users = (0..6).map(|_| faker.user()).collect();
        Self {
            faker,
            devices,
            organizations,
            users,
            next_id: 1,
        }
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl AppRuntime for DemoRuntime {
    fn load_records(&mut self, screen: ScreenKind) -> Result<ScreenRecords> {
        Ok(match screen {
            ScreenKind::Devices => ScreenRecords::Devices(self.devices.clone()),
            ScreenKind::Organizations => ScreenRecords::Organizations(self.organizations.clone()),
            ScreenKind::Users => ScreenRecords::Users(self.users.clone()),
        })
    }

    fn submit_form(&mut self, payload: &FormPayload, editing: Option<&str>) -> Result<()> {
        payload.validate()?;
        match payload {
            FormPayload::Device(form) => {
                form.ensure_unique_device_id(&self.devices, editing)?;
                match editing {
                    None => self.devices.push(Device {
                        device_id: form.device_id.as_str().into(),
                        customer: "Unassigned".to_owned(),
                        city: form.city.clone(),
                        state: form.state.clone(),
                        pool_status: "Good".to_owned(),
                        mqtt_topic: form.mqtt_topic.clone(),
                        created_on: DEMO_DATE.to_owned(),
                    }),
                    Some(id) => {
                        let Some(device) = self
                            .devices
                            .iter_mut()
                            .find(|device| device.device_id.as_str() == id)
                        else {
                            bail!("device {id:?} not found -- refresh and retry");
                        };
                        device.mqtt_topic = form.mqtt_topic.clone();
                        device.state = form.state.clone();
                        device.city = form.city.clone();
                    }
                }
            }
            FormPayload::Organization(form) => match editing {
                None => {
                    let id = self.next_id();
                    self.organizations.push(Organization {
                        id: format!("org-demo-{id:03}").into(),
                        organization_name: form.organization_name.clone(),
                        contact_name: form.contact_name.clone(),
                        email: form.email.clone(),
                        phone_no: form.phone_no.clone(),
                        customer_type: form.customer_type.clone(),
                        status: "Active".to_owned(),
                        address: form.address.clone(),
                        country: form.country.clone(),
                        state: form.state.clone(),
                        city: form.city.clone(),
                    });
                }
                Some(id) => {
                    let Some(organization) = self
                        .organizations
                        .iter_mut()
                        .find(|organization| organization.id.as_str() == id)
                    else {
                        bail!("organization {id:?} not found -- refresh and retry");
                    };
                    organization.organization_name = form.organization_name.clone();
                    organization.contact_name = form.contact_name.clone();
                    organization.email = form.email.clone();
                    organization.phone_no = form.phone_no.clone();
                    organization.customer_type = form.customer_type.clone();
                    organization.address = form.address.clone();
                    organization.country = form.country.clone();
                    organization.state = form.state.clone();
                    organization.city = form.city.clone();
                }
            },
            FormPayload::User(form) => {
                form.ensure_unique_email(&self.users, editing)?;
                match editing {
                    None => {
                        let id = self.next_id();
                        self.users.push(User {
                            id: format!("usr-demo-{id:03}").into(),
                            username: form.username.clone(),
                            email: form.email.clone(),
                            user_role: form.user_role.clone(),
                            status: "Pending".to_owned(),
                            created_on: DEMO_DATE.to_owned(),
                        });
                    }
                    Some(id) => {
                        let Some(user) = self.users.iter_mut().find(|user| user.id.as_str() == id)
                        else {
                            bail!("user {id:?} not found -- refresh and retry");
                        };
                        user.username = form.username.clone();
                        user.email = form.email.clone();
                        user.user_role = form.user_role.clone();
                    }
                }
            }
        }
        Ok(())
    }

    fn apply_record_action(
        &mut self,
        screen: ScreenKind,
        row_id: &str,
        action: RecordAction,
    ) -> Result<()> {
        match (screen, action) {
            (ScreenKind::Devices, RecordAction::Delete) => {
                let before = self.devices.len();
                self.devices
                    .retain(|device| device.device_id.as_str() != row_id);
                if self.devices.len() == before {
                    bail!("device {row_id:?} not found -- refresh and retry");
                }
                Ok(())
            }
            (ScreenKind::Devices, _) => {
                bail!("device pool status is derived from sensor readings and cannot be set")
            }
            (ScreenKind::Organizations, RecordAction::Delete) => {
                bail!("organizations are deactivated, not deleted -- use set_status")
            }
            (ScreenKind::Organizations, action) => {
                let Some(organization) = self
                    .organizations
                    .iter_mut()
                    .find(|organization| organization.id.as_str() == row_id)
                else {
                    bail!("organization {row_id:?} not found -- refresh and retry");
                };
                organization.status = match action {
                    RecordAction::Activate => "Active".to_owned(),
                    _ => "Inactive".to_owned(),
                };
                Ok(())
            }
            (ScreenKind::Users, RecordAction::Delete) => {
                bail!("users are deactivated, not deleted -- use set_status")
            }
            (ScreenKind::Users, action) => {
                let Some(user) = self.users.iter_mut().find(|user| user.id.as_str() == row_id)
                else {
                    bail!("user {row_id:?} not found -- refresh and retry");
                };
                user.status = match action {
                    RecordAction::Activate => "Active".to_owned(),
                    _ => "Inactive".to_owned(),
                };
                Ok(())
            }
        }
    }

    fn open_device_detail(&mut self, device_id: &DeviceId) -> Result<DeviceDetailView> {
        if !self
            .devices
            .iter()
            .any(|device| device.device_id == *device_id)
        {
            bail!("device {:?} not found -- refresh and retry", device_id.as_str());
        }
        let thresholds = DeviceThresholds::default();
        let snapshot = self.faker.snapshot(&thresholds);
        Ok(DeviceDetailView {
            owner_id: "demo-operator".to_owned(),
            snapshot,
            thresholds,
        })
    }

    fn open_organization_detail(
        &mut self,
        organization_id: &str,
    ) -> Result<OrganizationDetailView> {
        let Some(organization) = self
            .organizations
            .iter()
            .find(|organization| organization.id.as_str() == organization_id)
        else {
            bail!("organization {organization_id:?} not found -- refresh and retry");
        };

        let devices: Vec<Device> = self
            .devices
            .iter()
            .filter(|device| device.customer == organization.organization_name)
            .cloned()
            .collect();
        let active_devices = devices
            .iter()
            .filter(|device| {
                device.pool_status == PoolStatus::Excellent.as_str()
                    || device.pool_status == PoolStatus::Good.as_str()
            })
            .count() as u64;
        let need_attention = devices
            .iter()
            .filter(|device| device.pool_status == PoolStatus::NeedAttention.as_str())
            .count() as u64;

        // Partners roll up their end customers; end customers have no
        // children of their own.
        let sub_organizations: Vec<Organization> = if organization.customer_type == "Partner" {
            self.organizations
                .iter()
                .filter(|candidate| {
                    candidate.id != organization.id && candidate.customer_type == "End Customer"
                })
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        Ok(OrganizationDetailView {
            organization: organization.clone(),
            total_devices: devices.len() as u64,
            active_devices,
            need_attention,
            sub_organizations,
            users: self.users.clone(),
            devices,
        })
    }

    fn send_command(&mut self, _device_id: &DeviceId, command: &DeviceCommand) -> Result<()> {
        command.validate()
    }
}
