//! HTTP-level tests for RestSend over the real blocking sender,
//! against a wiremock controller stub.

mod common;

use common::MockController;
use ndfc_rest::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

const FABRIC_PATH: &str = "/api/v1/lan-fabric/rest/control/fabrics/f1";

#[test]
fn get_ok_classifies_as_found() {
    let controller = MockController::start();
    controller.mount(
        Mock::given(method("GET"))
            .and(path(FABRIC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "RETURN_CODE": 200,
                "MESSAGE": "OK",
                "DATA": {"fabricName": "f1", "fabricType": "Switch_Fabric"},
            }))),
    );

    let mut rest_send = RestSend::new(HttpSender::new(&controller.config()).unwrap());
    let result = rest_send.commit(Verb::Get, FABRIC_PATH, None).unwrap();

    assert!(result.success);
    assert_eq!(result.found, Some(true));
    assert_eq!(
        rest_send.response_current()["DATA"]["fabricName"],
        json!("f1")
    );
    assert!(!rest_send.results().failed());
}

#[test]
fn get_404_not_found_is_a_clean_negative() {
    let controller = MockController::start();
    controller.mount(
        Mock::given(method("GET"))
            .and(path(FABRIC_PATH))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "RETURN_CODE": 404,
                "MESSAGE": "Not Found",
            }))),
    );

    let mut rest_send = RestSend::new(HttpSender::new(&controller.config()).unwrap());
    let result = rest_send.commit(Verb::Get, FABRIC_PATH, None).unwrap();

    assert!(result.success);
    assert_eq!(result.found, Some(false));
    assert!(!rest_send.results().failed());
    assert!(!rest_send.results().changed());
}

#[test]
fn post_payload_reaches_the_controller_and_counts_as_changed() {
    let controller = MockController::start();
    let payload = json!({"FABRIC_NAME": "f1", "BGP_AS": "65001"});
    controller.mount(
        Mock::given(method("POST"))
            .and(path(FABRIC_PATH))
            .and(body_json(payload.clone()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "RETURN_CODE": 200,
                "MESSAGE": "OK",
                "DATA": {"status": "Config deployment completed"},
            }))),
    );

    let mut rest_send = RestSend::new(HttpSender::new(&controller.config()).unwrap());
    rest_send.results_mut().set_action("fabric_create");
    let result = rest_send
        .commit(Verb::Post, FABRIC_PATH, Some(payload.clone()))
        .unwrap();

    assert!(result.success);
    assert_eq!(result.changed, Some(true));

    let finished = rest_send.into_results().build_final_result();
    assert!(finished.changed);
    assert!(!finished.failed);
    assert_eq!(finished.diff, vec![payload]);
}

#[test]
fn mutating_response_with_error_key_fails_without_resend() {
    let controller = MockController::start();
    controller.mount(
        Mock::given(method("PUT"))
            .and(path(FABRIC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "RETURN_CODE": 200,
                "MESSAGE": "OK",
                "ERROR": "Fabric is in an inconsistent state",
            }))),
    );

    let mut rest_send = RestSend::new(HttpSender::new(&controller.config()).unwrap())
        .with_timeout(std::time::Duration::from_secs(1));
    let result = rest_send
        .commit(Verb::Put, FABRIC_PATH, Some(json!({"BGP_AS": "65002"})))
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.changed, Some(false));
    assert!(rest_send.results().failed());
    // failed mutations are recorded, never retried
    assert_eq!(controller.request_count(), 1);
}

#[test]
fn check_mode_commit_never_reaches_the_wire() {
    let controller = MockController::start();
    controller.mount(
        Mock::given(method("POST"))
            .and(path(FABRIC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "RETURN_CODE": 200,
                "MESSAGE": "OK",
            }))),
    );

    let mut rest_send =
        RestSend::new(HttpSender::new(&controller.config()).unwrap()).with_check_mode(true);
    let result = rest_send
        .commit(Verb::Post, FABRIC_PATH, Some(json!({"FABRIC_NAME": "f1"})))
        .unwrap();

    assert!(result.success);
    assert_eq!(controller.request_count(), 0);
    assert_eq!(rest_send.results().len(), 1);
    assert_eq!(rest_send.response_current()["CHECK_MODE"], json!(true));
}

#[test]
fn missing_envelope_fields_are_fatal() {
    let controller = MockController::start();
    controller.mount(
        Mock::given(method("GET"))
            .and(path(FABRIC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "some": "other shape entirely",
            }))),
    );

    let mut rest_send = RestSend::new(HttpSender::new(&controller.config()).unwrap());
    let err = rest_send.commit(Verb::Get, FABRIC_PATH, None).unwrap_err();
    assert!(matches!(err, Error::MissingField { field: "RETURN_CODE", .. }));
    assert!(!err.is_recoverable());
}
