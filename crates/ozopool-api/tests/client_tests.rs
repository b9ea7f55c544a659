// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

use ozopool_api::{Client, DeviceSource, RecordSource, is_auth_required, subscribe};
use ozopool_app::{
    ControlDevice, DeviceCommand, DeviceId, DeviceThresholds, MqttTopics, OrganizationId, Session,
    SwitchAction, ThresholdRange, UserId,
};
use std::io::Read;
use time::OffsetDateTime;

fn test_session() -> Session {
    Session {
        access_token: "tok-abc".to_owned(),
        user_role: "Admin".to_owned(),
        customer_type: "Partner".to_owned(),
        user_id: UserId::from("u1"),
        email: "ana@ozopool.in".to_owned(),
        issued_at: OffsetDateTime::now_utc(),
    }
}

fn json_response(body: &str, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body).with_status_code(status).with_header(
        Header::from_bytes("Content-Type", "application/json")
            .expect("valid content type header"),
    )
}

#[test]
fn unreachable_backend_yields_actionable_error() {
    let client = Client::new("http://127.0.0.1:1", Duration::from_millis(50))
        .expect("client should initialize");

    let error = client
        .login("ana@ozopool.in", "secret123")
        .expect_err("login should fail for unreachable endpoint");
    assert!(error.to_string().contains("cannot reach"));
    assert!(error.to_string().contains("api.base_url"));
}

#[test]
fn login_round_trip_builds_a_session() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/users/login/");
        let body = concat!(
            r#"{"accessToken":"tok-abc","customerType":"Partner","#,
            r#""userRole":"Executive","userId":"u1"}"#,
        );
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let session = client.login("ana@ozopool.in", "secret123")?;

    assert_eq!(session.access_token, "tok-abc");
    assert_eq!(session.user_role, "Executive");
    assert_eq!(session.customer_type, "Partner");
    assert_eq!(session.user_id.as_str(), "u1");
    assert_eq!(session.email, "ana@ozopool.in");
    assert_eq!(session.bearer_header(), "Bearer tok-abc");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn device_list_sends_bearer_token_and_decodes_bare_array() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/devices/list/");
        let auth = request
            .headers()
            .iter()
            .find(|header| header.field.equiv("Authorization"))
            .map(|header| header.value.as_str().to_owned());
        assert_eq!(auth.as_deref(), Some("Bearer tok-abc"));

        let body = concat!(
            r#"[{"deviceId":"OZ-100","customer":"Lakeside","city":"Austin","#,
            r#""state":"Texas","poolStatus":"Excellent","createdOn":"2026-05-01"},"#,
            r#"{"deviceId":"OZ-101"}]"#,
        );
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let devices = DeviceSource.list(&client, &test_session())?;

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].device_id.as_str(), "OZ-100");
    assert_eq!(devices[0].pool_status, "Excellent");
    assert_eq!(devices[1].device_id.as_str(), "OZ-101");
    assert_eq!(devices[1].customer, "");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn rejected_token_maps_to_auth_required() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(r#"{"error":"jwt expired"}"#, 401))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let error = DeviceSource
        .list(&client, &test_session())
        .expect_err("expired token should fail the list");
    assert!(is_auth_required(&error));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn backend_error_envelope_is_surfaced() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/devices/delete/");
        request
            .respond(json_response(r#"{"error":"Device not found"}"#, 404))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let error = DeviceSource
        .delete(&client, &test_session(), "OZ-999")
        .expect_err("delete of unknown device should fail");
    assert!(error.to_string().contains("Device not found"));
    assert!(!is_auth_required(&error));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn device_detail_fills_missing_thresholds_with_defaults() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/devices/detail/?deviceId=OZ-100");
        let body = concat!(
            r#"{"user_id":"u1","data":{"ph":7.2,"orp":690.0,"ozoneLevel":196.4,"#,
            r#""temperature":28.9,"minimumPh":7.0,"maximumPh":7.4,"power":true}}"#,
        );
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let detail = client.device_detail(&test_session(), &DeviceId::from("OZ-100"))?;

    assert_eq!(detail.owner_id, "u1");
    assert_eq!(detail.snapshot.ph, 7.2);
    assert!(detail.snapshot.power);
    // Explicit values win, omitted ones fall back.
    assert_eq!(detail.thresholds.ph.min, 7.0);
    assert_eq!(detail.thresholds.ph.max, 7.4);
    assert_eq!(detail.thresholds.orp.min, 250.0);
    assert_eq!(detail.thresholds.temperature.max, 32.0);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn organization_detail_decodes_nested_children() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/organization/detail/?objectId=64ab");
        let body = concat!(
            r#"{"organization":{"_id":"64ab","organizationName":"AquaPure","#,
            r#""customerType":"Partner","status":"Active","contactName":"Mira","#,
            r#""statistics":{"totalDevices":4,"activeDevices":3,"needAttention":1},"#,
            r#""organizations":[{"_id":"64ac","organizationName":"Lakeside Pools","#,
            r#""customerType":"End Customer","status":"Inactive"}],"#,
            r#""users":[{"_id":"u2","username":"ravi","status":"Pending"}],"#,
            r#""devices":[{"deviceId":"OZ-100","poolStatus":"Good"}]}}"#,
        );
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let detail = client.organization_detail(&test_session(), &OrganizationId::from("64ab"))?;

    assert_eq!(detail.organization.id.as_str(), "64ab");
    assert_eq!(detail.organization.organization_name, "AquaPure");
    assert_eq!(detail.statistics.total_devices, 4);
    assert_eq!(detail.statistics.active_devices, 3);
    assert_eq!(detail.statistics.need_attention, 1);
    assert_eq!(detail.sub_organizations.len(), 1);
    assert_eq!(detail.sub_organizations[0].status, "Inactive");
    assert_eq!(detail.users[0].username, "ravi");
    assert_eq!(detail.devices[0].device_id.as_str(), "OZ-100");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn publish_command_serializes_equipment_switch() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let mut request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/devices/control/");
        assert_eq!(request.method(), &tiny_http::Method::Post);

        let mut body = String::new();
        request
            .as_reader()
            .read_to_string(&mut body)
            .expect("readable body");
        let parsed: serde_json::Value = serde_json::from_str(&body).expect("JSON body");
        assert_eq!(parsed["deviceId"], "OZ-100");
        assert_eq!(parsed["device"], "filtration");
        assert_eq!(parsed["action"], "ON");
        assert_eq!(parsed["timer"], "06:00");

        request
            .respond(json_response("{}", 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let command = DeviceCommand {
        device: ControlDevice::Filtration,
        action: SwitchAction::On,
        timer: Some("06:00".to_owned()),
    };
    client.publish_command(&test_session(), &DeviceId::from("OZ-100"), &command)?;

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn settings_updates_are_validated_then_patched() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        for expected_url in ["/devices/thresholds/", "/devices/mqtt-topics/"] {
            let request = server.recv().expect("request expected");
            assert_eq!(request.url(), expected_url);
            assert_eq!(request.method(), &tiny_http::Method::Patch);
            request
                .respond(json_response("{}", 200))
                .expect("response should succeed");
        }
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let device_id = DeviceId::from("OZ-100");

    // Invalid values never reach the wire.
    let mut inverted = DeviceThresholds::default();
    inverted.ph = ThresholdRange { min: 7.6, max: 6.8 };
    assert!(
        client
            .update_thresholds(&test_session(), &device_id, &inverted)
            .is_err()
    );
    let blank_topic = MqttTopics {
        read: String::new(),
        ..MqttTopics::default()
    };
    assert!(
        client
            .update_mqtt_topics(&test_session(), &device_id, &blank_topic)
            .is_err()
    );

    client.update_thresholds(&test_session(), &device_id, &DeviceThresholds::default())?;
    client.update_mqtt_topics(&test_session(), &device_id, &MqttTopics::default())?;

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn telemetry_subscription_delivers_updates_and_stops_on_drop() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let mut served = 0_u32;
        while let Ok(Some(request)) = server.recv_timeout(Duration::from_millis(400)) {
            let body = concat!(
                r#"{"user_id":"u1","data":{"ph":7.2,"orp":690.0,"ozoneLevel":196.4,"#,
                r#""temperature":28.9,"power":true}}"#,
            );
            request
                .respond(json_response(body, 200))
                .expect("response should succeed");
            served += 1;
        }
        served
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let subscription = subscribe(
        client,
        test_session(),
        DeviceId::from("OZ-100"),
        Duration::from_millis(50),
    );

    let first = subscription
        .recv()
        .expect("worker should deliver an update")?;
    assert_eq!(first.snapshot.orp, 690.0);

    // Dropping the subscription stops the worker; the server then sees
    // no further requests and its loop times out.
    drop(subscription);
    let served = handle.join().expect("server thread should join");
    assert!(served >= 1);
    Ok(())
}
