// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests against a mocked Phyn cloud API using wiremock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use phyn_lib::api::{ApiClient, ApiConfig};
use phyn_lib::device::{Device, Poller};
use phyn_lib::entity::{DeviceSwitch, SensorKind, SwitchKind, WaterSensor};
use phyn_lib::error::{ApiError, Error};
use phyn_lib::manager::{setup_entry, validate_credentials};
use phyn_lib::state::ValveState;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USERNAME: &str = "user@example.com";
const PASSWORD: &str = "secret";

fn state_body(product_code: &str, pressure_mean: f64, online: &str, valve: &str) -> serde_json::Value {
    serde_json::json!({
        "product_code": product_code,
        "signal_strength": -58.5,
        "online_status": {"v": online},
        "flow": {"mean": 1.3},
        "pressure": {"mean": pressure_mean},
        "temperature": {"mean": 71.2},
        "fw_version": "5.2.1",
        "serial_number": "PW1-000123",
        "sov_status": {"v": valve},
        "away_mode": {"v": false}
    })
}

fn dual_zone_state_body() -> serde_json::Value {
    serde_json::json!({
        "product_code": "PC1",
        "signal_strength": -71.0,
        "online_status": {"v": "online"},
        "pressure1": {"mean": 58.1},
        "pressure2": {"mean": 60.9},
        "temperature1": {"mean": 104.6},
        "temperature2": {"mean": 66.0},
        "fw_version": "3.1.9",
        "serial_number": "PC1-004567",
        "sov_status": {"v": "Open"}
    })
}

fn today() -> String {
    chrono::Local::now().format("%Y/%m/%d").to_string()
}

async fn mock_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/users/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "test-token"
        })))
        .mount(server)
        .await;
}

async fn connect(server: &MockServer) -> ApiClient {
    ApiConfig::new(USERNAME, PASSWORD)
        .with_base_url(server.uri())
        .connect()
        .await
        .unwrap()
}

// ============================================================================
// ApiClient Tests
// ============================================================================

mod api_client {
    use super::*;

    #[tokio::test]
    async fn login_attaches_bearer_token() {
        let server = MockServer::start().await;
        mock_login(&server).await;

        Mock::given(method("GET"))
            .and(path("/devices/dev-1/state"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(state_body("PW1", 62.4, "online", "Open")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let api = connect(&server).await;
        let state = api.get_state("dev-1").await.unwrap();

        assert_eq!(state.product_code, "PW1");
        assert_eq!(state.sov_status.v, ValveState::Open);
    }

    #[tokio::test]
    async fn rejected_credentials() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/users/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = ApiConfig::new(USERNAME, "wrong")
            .with_base_url(server.uri())
            .connect()
            .await;

        assert!(matches!(
            result,
            Err(Error::Api(ApiError::AuthenticationFailed))
        ));
    }

    #[tokio::test]
    async fn server_error_maps_to_request_failed() {
        let server = MockServer::start().await;
        mock_login(&server).await;

        Mock::given(method("GET"))
            .and(path("/devices/dev-1/state"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let api = connect(&server).await;
        let result = api.get_state("dev-1").await;

        assert!(matches!(
            result,
            Err(Error::Api(ApiError::RequestFailed { status: 503, .. }))
        ));
    }

    #[tokio::test]
    async fn consumption_uses_date_query() {
        let server = MockServer::start().await;
        mock_login(&server).await;

        Mock::given(method("GET"))
            .and(path("/devices/dev-1/consumption"))
            .and(query_param("duration", "2024/01/31"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "water_consumption": 42.7
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = connect(&server).await;
        let report = api.get_consumption("dev-1", "2024/01/31").await.unwrap();

        assert_eq!(report.water_consumption, Some(42.7));
    }

    #[tokio::test]
    async fn valve_commands_post_to_sov_endpoints() {
        let server = MockServer::start().await;
        mock_login(&server).await;

        Mock::given(method("POST"))
            .and(path("/devices/dev-1/sov/Open"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/devices/dev-1/sov/Close"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let api = connect(&server).await;
        api.open_valve("dev-1").await.unwrap();
        api.close_valve("dev-1").await.unwrap();
    }

    #[tokio::test]
    async fn away_mode_commands() {
        let server = MockServer::start().await;
        mock_login(&server).await;

        Mock::given(method("POST"))
            .and(path("/devices/dev-1/away_mode/enable"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/devices/dev-1/away_mode/disable"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let api = connect(&server).await;
        api.enable_away_mode("dev-1").await.unwrap();
        api.disable_away_mode("dev-1").await.unwrap();
    }
}

// ============================================================================
// Refresh Cycle Tests
// ============================================================================

mod refresh {
    use super::*;

    async fn mock_state_once(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/devices/dev-1/state"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .up_to_n_times(1)
            .mount(server)
            .await;
    }

    async fn mock_consumption_once(server: &MockServer, gallons: f64) {
        Mock::given(method("GET"))
            .and(path("/devices/dev-1/consumption"))
            .and(query_param("duration", today()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "water_consumption": gallons
            })))
            .up_to_n_times(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn successful_cycle_installs_both_snapshots() {
        let server = MockServer::start().await;
        mock_login(&server).await;
        mock_state_once(&server, state_body("PW1", 62.4, "online", "Open")).await;
        mock_consumption_once(&server, 18.9).await;

        let device = Device::new(connect(&server).await, "home-1", "dev-1");
        device.refresh().await.unwrap();

        assert!(device.last_update_success());
        assert!(device.available());
        assert_eq!(device.current_psi(), Some(62.4));
        assert_eq!(device.consumption_today(), Some(18.9));
    }

    #[tokio::test]
    async fn failed_consumption_fetch_leaves_pair_untouched() {
        let server = MockServer::start().await;
        mock_login(&server).await;

        // First cycle succeeds in full.
        mock_state_once(&server, state_body("PW1", 62.4, "online", "Open")).await;
        mock_consumption_once(&server, 18.9).await;
        // Second cycle: the state fetch returns fresh values but the
        // consumption fetch fails, so neither half may become visible.
        mock_state_once(&server, state_body("PW1", 99.9, "online", "Closed")).await;
        Mock::given(method("GET"))
            .and(path("/devices/dev-1/consumption"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let device = Device::new(connect(&server).await, "home-1", "dev-1");
        device.refresh().await.unwrap();

        let result = device.refresh().await;
        assert!(matches!(result, Err(Error::UpdateFailed(_))));
        assert!(!device.last_update_success());

        // The first cycle's pair is still authoritative.
        assert_eq!(device.current_psi(), Some(62.4));
        assert_eq!(device.valve_state(), Some(ValveState::Open));
        assert_eq!(device.consumption_today(), Some(18.9));
    }

    #[tokio::test]
    async fn cycle_over_deadline_aborts_without_partial_update() {
        let server = MockServer::start().await;
        mock_login(&server).await;

        mock_state_once(&server, state_body("PW1", 62.4, "online", "Open")).await;
        mock_consumption_once(&server, 18.9).await;
        // Second cycle stalls past the deadline.
        Mock::given(method("GET"))
            .and(path("/devices/dev-1/state"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(state_body("PW1", 99.9, "online", "Closed"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let device = Device::new(connect(&server).await, "home-1", "dev-1")
            .with_refresh_timeout(Duration::from_millis(100));
        device.refresh().await.unwrap();

        let result = device.refresh().await;
        match result {
            Err(Error::UpdateFailed(reason)) => assert!(reason.contains("timed out")),
            other => panic!("expected UpdateFailed, got {other:?}"),
        }

        assert!(!device.last_update_success());
        assert_eq!(device.current_psi(), Some(62.4));
    }

    #[tokio::test]
    async fn availability_follows_online_status() {
        let server = MockServer::start().await;
        mock_login(&server).await;

        mock_state_once(&server, state_body("PW1", 62.4, "online", "Open")).await;
        mock_consumption_once(&server, 1.0).await;
        mock_state_once(&server, state_body("PW1", 62.4, "offline", "Open")).await;
        mock_consumption_once(&server, 1.0).await;

        let device = Device::new(connect(&server).await, "home-1", "dev-1");

        device.refresh().await.unwrap();
        assert!(device.available());

        device.refresh().await.unwrap();
        assert!(!device.available());
    }

    #[tokio::test]
    async fn concurrent_refreshes_coalesce_into_one_fetch() {
        let server = MockServer::start().await;
        mock_login(&server).await;

        Mock::given(method("GET"))
            .and(path("/devices/dev-1/state"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(state_body("PW1", 62.4, "online", "Open"))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/devices/dev-1/consumption"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "water_consumption": 18.9
            })))
            .expect(1)
            .mount(&server)
            .await;

        let device = Arc::new(Device::new(connect(&server).await, "home-1", "dev-1"));

        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let device = Arc::clone(&device);
                tokio::spawn(async move { device.refresh().await })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(device.current_psi(), Some(62.4));
        // The server verifies on drop that each endpoint saw exactly one
        // request.
    }

    #[tokio::test]
    async fn listeners_notified_in_registration_order_per_refresh() {
        let server = MockServer::start().await;
        mock_login(&server).await;
        mock_state_once(&server, state_body("PW1", 62.4, "online", "Open")).await;
        mock_consumption_once(&server, 18.9).await;

        let device = Device::new(connect(&server).await, "home-1", "dev-1");

        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        for label in ["first", "second"] {
            let order = Arc::clone(&order);
            device.add_listener(move || order.lock().unwrap().push(label));
        }

        device.refresh().await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }
}

// ============================================================================
// Switch Tests
// ============================================================================

mod switches {
    use super::*;

    async fn device_with_snapshot(server: &MockServer, valve: &str) -> Arc<Device> {
        Mock::given(method("GET"))
            .and(path("/devices/dev-1/state"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(state_body("PW1", 62.4, "online", valve)),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/devices/dev-1/consumption"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "water_consumption": 1.0
            })))
            .mount(server)
            .await;

        let device = Arc::new(Device::new(connect(server).await, "home-1", "dev-1"));
        device.refresh().await.unwrap();
        device
    }

    #[tokio::test]
    async fn successful_open_flips_state_and_notifies_once() {
        let server = MockServer::start().await;
        mock_login(&server).await;
        let device = device_with_snapshot(&server, "Closed").await;

        Mock::given(method("POST"))
            .and(path("/devices/dev-1/sov/Open"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let valve = DeviceSwitch::new(device, SwitchKind::ShutoffValve);
        assert!(!valve.is_on());

        let notified = Arc::new(AtomicU32::new(0));
        let notified_clone = Arc::clone(&notified);
        valve.add_listener(move || {
            notified_clone.fetch_add(1, Ordering::SeqCst);
        });

        valve.turn_on().await.unwrap();

        assert!(valve.is_on());
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_open_propagates_and_keeps_state() {
        let server = MockServer::start().await;
        mock_login(&server).await;
        let device = device_with_snapshot(&server, "Closed").await;

        Mock::given(method("POST"))
            .and(path("/devices/dev-1/sov/Open"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let valve = DeviceSwitch::new(device, SwitchKind::ShutoffValve);
        let result = valve.turn_on().await;

        assert!(matches!(
            result,
            Err(Error::Api(ApiError::RequestFailed { status: 500, .. }))
        ));
        assert!(!valve.is_on());
    }

    #[tokio::test]
    async fn background_refresh_overrides_optimistic_state() {
        let server = MockServer::start().await;
        mock_login(&server).await;
        // Every poll reports the valve closed.
        let device = device_with_snapshot(&server, "Closed").await;

        Mock::given(method("POST"))
            .and(path("/devices/dev-1/sov/Open"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let valve = DeviceSwitch::new(Arc::clone(&device), SwitchKind::ShutoffValve);
        valve.turn_on().await.unwrap();
        assert!(valve.is_on());

        // The next successful poll re-derives the state from the
        // snapshot: last write observed wins.
        device.refresh().await.unwrap();
        assert!(!valve.is_on());
    }
}

// ============================================================================
// Setup / Unload Tests
// ============================================================================

mod setup {
    use super::*;

    async fn mock_account(server: &MockServer) {
        mock_login(server).await;

        Mock::given(method("GET"))
            .and(path("/homes"))
            .and(query_param("user_id", USERNAME))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "id": "home-1",
                    "alias_name": "Main House",
                    "devices": [
                        {"device_id": "dev-1"},
                        {"device_id": "dev-2"}
                    ]
                }
            ])))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/devices/dev-1/state"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(state_body("PW1", 62.4, "online", "Open")),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/devices/dev-2/state"))
            .respond_with(ResponseTemplate::new(200).set_body_json(dual_zone_state_body()))
            .mount(server)
            .await;

        for device_id in ["dev-1", "dev-2"] {
            Mock::given(method("GET"))
                .and(path(format!("/devices/{device_id}/consumption")))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "water_consumption": 5.5
                })))
                .mount(server)
                .await;
        }
    }

    use phyn_lib::entity::Entity;

    fn kinds_of(sensors: &[WaterSensor], device_id: &str) -> Vec<SensorKind> {
        sensors
            .iter()
            .filter(|sensor| sensor.unique_id().starts_with(device_id))
            .map(WaterSensor::kind)
            .collect()
    }

    #[tokio::test]
    async fn setup_registers_entities_per_model() {
        let server = MockServer::start().await;
        mock_account(&server).await;

        let config = ApiConfig::new(USERNAME, PASSWORD).with_base_url(server.uri());
        let entry = setup_entry(config).await.unwrap();

        assert_eq!(entry.devices().len(), 2);

        // Single-zone device gets the flow-rate sensor.
        let single = kinds_of(entry.sensors(), "dev-1");
        assert!(single.contains(&SensorKind::FlowRate));
        assert_eq!(single.len(), 4);

        // Dual-zone device gets hot/cold sensors and no flow rate.
        let dual = kinds_of(entry.sensors(), "dev-2");
        assert!(!dual.contains(&SensorKind::FlowRate));
        assert!(dual.contains(&SensorKind::HotPressure));
        assert!(dual.contains(&SensorKind::ColdTemperature));
        assert_eq!(dual.len(), 5);

        // Both devices get both switches.
        assert_eq!(entry.switches().len(), 4);

        // Entities iterate as one flat set.
        assert_eq!(entry.entities().count(), 13);

        entry.unload();
    }

    #[tokio::test]
    async fn unload_stops_pollers() {
        let server = MockServer::start().await;
        mock_account(&server).await;

        let config = ApiConfig::new(USERNAME, PASSWORD).with_base_url(server.uri());
        let entry = setup_entry(config).await.unwrap();

        let devices: Vec<Arc<Device>> = entry.devices().to_vec();
        for device in &devices {
            assert!(device.is_polling());
        }

        entry.unload();

        for device in &devices {
            assert!(!device.is_polling());
        }
    }

    #[tokio::test]
    async fn setup_not_ready_when_service_unreachable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/users/login"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let config = ApiConfig::new(USERNAME, PASSWORD).with_base_url(server.uri());
        let result = setup_entry(config).await;

        assert!(matches!(result, Err(Error::NotReady(_))));
    }

    #[tokio::test]
    async fn validate_credentials_returns_home_title() {
        let server = MockServer::start().await;
        mock_account(&server).await;

        let config = ApiConfig::new(USERNAME, PASSWORD).with_base_url(server.uri());
        let title = validate_credentials(config).await.unwrap();

        assert_eq!(title, "Main House");
    }

    #[tokio::test]
    async fn validate_credentials_maps_rejection_to_cannot_connect() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/users/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let config = ApiConfig::new(USERNAME, "wrong").with_base_url(server.uri());
        let result = validate_credentials(config).await;

        assert!(matches!(result, Err(Error::CannotConnect)));
    }
}
