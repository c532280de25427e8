//! End-to-end tests for the late-delivery-and-penalty contract.
//!
//! The compiled logic and contract parameters live in `tests/fixtures/`:
//! - `late_delivery.logic.json`    -- interchange bundle
//! - `late_delivery.contract.json` -- contract parameters (wire JSON)
//!
//! Requests are built per test so that `now` and the agreed delivery date
//! can vary.

use std::path::{Path, PathBuf};

use accord_eval::{
    Engine, EngineConfig, EvalError, Failure, Invocation, Outcome, Value, DISPATCH_ERROR,
};
use serde_json::json;

const REQUEST_BRAND: &str = "org.accordproject.latedeliveryandpenalty.LateDeliveryAndPenaltyRequest";
const RESPONSE_BRAND: &str =
    "org.accordproject.latedeliveryandpenalty.LateDeliveryAndPenaltyResponse";
const AGREED: &str = "2026-03-01T12:00:00Z";

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn load_json(dir: &Path, name: &str) -> serde_json::Value {
    let path = dir.join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("Invalid JSON in {}: {}", name, e))
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn bundle() -> serde_json::Value {
    load_json(&fixture_dir(), "late_delivery.logic.json")
}

fn contract_wire() -> serde_json::Value {
    load_json(&fixture_dir(), "late_delivery.contract.json")
}

fn engine() -> Engine {
    init_logging();
    Engine::from_interchange(&bundle(), EngineConfig::default())
        .unwrap_or_else(|e| panic!("Failed to load late delivery bundle: {}", e))
}

fn request_wire(force_majeure: bool, goods_value: f64) -> serde_json::Value {
    json!({
        "$class": REQUEST_BRAND,
        "$data": {
            "forceMajeure": force_majeure,
            "agreedDelivery": {"$datetime": AGREED},
            "deliveredAt": {"$right": null},
            "goodsValue": goods_value
        }
    })
}

fn input(now: &str, force_majeure: bool) -> serde_json::Value {
    json!({
        "contract": contract_wire(),
        "state": {"$class": "org.accordproject.cicero.contract.AccordContractState",
                  "$data": {"stateId": "org.accordproject.cicero.contract.AccordContractState#1"}},
        "emit": [],
        "request": request_wire(force_majeure, 1000.0),
        "now": now
    })
}

fn invoke_at(now: &str, force_majeure: bool) -> Outcome {
    let inv = Invocation::from_wire(&input(now, force_majeure)).unwrap();
    engine()
        .invoke(&inv)
        .unwrap_or_else(|e| panic!("invoke at {} failed: {}", now, e))
}

/// `(penalty, buyerMayTerminate)` from a successful outcome.
fn penalty_and_termination(outcome: &Outcome) -> (f64, bool) {
    let response = outcome
        .response()
        .unwrap_or_else(|| panic!("expected success, got {:?}", outcome));
    assert_eq!(response.brand(), Some(RESPONSE_BRAND));
    match response {
        Value::Branded { fields, .. } => (
            fields["penalty"].as_float().unwrap(),
            fields["buyerMayTerminate"].as_bool().unwrap(),
        ),
        other => panic!("expected branded response, got {:?}", other),
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn before_delivery_date_is_business_error() {
    let outcome = invoke_at("2026-02-20T12:00:00Z", false);
    match outcome.failure() {
        Some(Failure::Error { message, .. }) => {
            assert_eq!(message, "Cannot exercise late delivery before delivery date")
        }
        other => panic!("expected error failure, got {:?}", other),
    }
}

#[test]
fn exactly_at_delivery_date_is_not_late() {
    let outcome = invoke_at(AGREED, false);
    assert!(!outcome.is_success());
}

#[test]
fn force_majeure_zeroes_penalty() {
    let (penalty, terminate) = penalty_and_termination(&invoke_at("2026-03-05T12:00:00Z", true));
    assert_close(penalty, 0.0);
    assert!(terminate);
}

#[test]
fn force_majeure_declared_by_contract_party() {
    let mut wire = input("2026-03-05T12:00:00Z", false);
    wire["contract"]["$data"]["forceMajeure"] = json!(true);
    let inv = Invocation::from_wire(&wire).unwrap();
    let (penalty, terminate) = penalty_and_termination(&engine().invoke(&inv).unwrap());
    assert_close(penalty, 0.0);
    assert!(terminate);
}

#[test]
fn two_days_late_penalty() {
    // (2 / 1) * 10 / 100 * 1000 = 200, below the 100% cap.
    let outcome = invoke_at("2026-03-03T12:00:00Z", false);
    let (penalty, terminate) = penalty_and_termination(&outcome);
    assert_close(penalty, 200.0);
    assert!(!terminate, "2 days does not exceed the 15 day threshold");
}

#[test]
fn partial_days_are_floored() {
    // 2 days and 23 hours still counts as 2 whole days.
    let (penalty, _) = penalty_and_termination(&invoke_at("2026-03-04T11:00:00Z", false));
    assert_close(penalty, 200.0);
}

#[test]
fn penalty_is_capped() {
    let mut wire = input("2026-03-06T12:00:00Z", false);
    wire["contract"]["$data"]["capPercentage"] = json!(15.0);
    let inv = Invocation::from_wire(&wire).unwrap();
    // Uncapped would be 5 * 10% * 1000 = 500.
    let (penalty, _) = penalty_and_termination(&engine().invoke(&inv).unwrap());
    assert_close(penalty, 150.0);
}

#[test]
fn buyer_may_terminate_past_threshold() {
    let (_, at_threshold) = penalty_and_termination(&invoke_at("2026-03-16T12:00:00Z", false));
    assert!(!at_threshold, "exactly 15 days is not past the threshold");
    let (_, past) = penalty_and_termination(&invoke_at("2026-03-16T12:00:01Z", false));
    assert!(past);
}

#[test]
fn state_and_emit_pass_through() {
    let outcome = invoke_at("2026-03-03T12:00:00Z", false);
    let wire = outcome.to_wire();
    assert_eq!(
        wire["$left"]["state"],
        json!({"$class": "org.accordproject.cicero.contract.AccordContractState",
               "$data": {"stateId": "org.accordproject.cicero.contract.AccordContractState#1"}})
    );
    assert_eq!(wire["$left"]["emit"], json!([]));
    assert_eq!(
        wire["$left"]["response"]["$class"],
        json!(RESPONSE_BRAND)
    );
}

#[test]
fn unknown_request_brand_is_dispatch_error() {
    let mut wire = input("2026-03-03T12:00:00Z", false);
    wire["request"]["$class"] = json!("org.example.UnrelatedRequest");
    let inv = Invocation::from_wire(&wire).unwrap();
    let outcome = engine().invoke(&inv).unwrap();
    assert_eq!(outcome.failure().unwrap().message(), DISPATCH_ERROR);
    assert_eq!(
        outcome.to_wire()["$right"]["$data"]["message"],
        json!(DISPATCH_ERROR)
    );
}

#[test]
fn supertype_request_brand_does_not_dispatch() {
    let mut wire = input("2026-03-03T12:00:00Z", false);
    wire["request"]["$class"] = json!("org.accordproject.cicero.runtime.Request");
    let inv = Invocation::from_wire(&wire).unwrap();
    assert!(!engine().invoke(&inv).unwrap().is_success());
}

#[test]
fn init_yields_sentinel_state() {
    let outcome = accord_eval::init(
        &bundle(),
        &json!({"contract": contract_wire(), "now": "2026-01-01"}),
    )
    .unwrap();
    assert_eq!(
        outcome.to_wire(),
        json!({"$left": {
            "response": null,
            "state": {"$class": "org.accordproject.cicero.contract.AccordContractState",
                      "$data": {"stateId": "org.accordproject.cicero.contract.AccordContractState#1"}},
            "emit": []
        }})
    );
}

#[test]
fn json_helper_matches_engine() {
    let wire = input("2026-03-03T12:00:00Z", false);
    let via_helper = accord_eval::invoke(&bundle(), &wire).unwrap();
    let via_engine = engine().invoke(&Invocation::from_wire(&wire).unwrap()).unwrap();
    assert_eq!(via_helper.to_wire(), via_engine.to_wire());
}

#[test]
fn invocation_is_deterministic_and_inputs_untouched() {
    let eng = engine();
    let inv = Invocation::from_wire(&input("2026-03-09T08:00:00Z", false)).unwrap();
    let before = format!("{:?}", inv);
    let first = eng.invoke(&inv).unwrap().to_wire();
    let second = eng.invoke(&inv).unwrap().to_wire();
    assert_eq!(first, second);
    assert_eq!(format!("{:?}", inv), before);
}

#[test]
fn concurrent_invocations_share_one_engine() {
    let eng = engine();
    let days: Vec<u32> = (2..=20).collect();
    let expected: Vec<serde_json::Value> = days
        .iter()
        .map(|d| {
            let now = format!("2026-03-{:02}T12:00:00Z", 1 + d);
            eng.invoke(&Invocation::from_wire(&input(&now, false)).unwrap())
                .unwrap()
                .to_wire()
        })
        .collect();

    std::thread::scope(|s| {
        let handles: Vec<_> = days
            .iter()
            .map(|d| {
                let eng = &eng;
                s.spawn(move || {
                    let now = format!("2026-03-{:02}T12:00:00Z", 1 + d);
                    eng.invoke(&Invocation::from_wire(&input(&now, false)).unwrap())
                        .unwrap()
                        .to_wire()
                })
            })
            .collect();
        for (handle, want) in handles.into_iter().zip(&expected) {
            assert_eq!(&handle.join().unwrap(), want);
        }
    });
}

#[test]
fn malformed_request_is_a_defect_not_an_outcome() {
    let mut wire = input("2026-03-03T12:00:00Z", false);
    wire["request"]["$data"]["goodsValue"] = json!({"$nat": 1000});
    let inv = Invocation::from_wire(&wire).unwrap();
    assert!(matches!(
        engine().invoke(&inv),
        Err(EvalError::TypeError { .. })
    ));
}

#[test]
fn tight_depth_limit_aborts() {
    let config = EngineConfig {
        max_depth: 4,
        ..EngineConfig::default()
    };
    let eng = Engine::from_interchange(&bundle(), config).unwrap();
    let inv = Invocation::from_wire(&input("2026-03-03T12:00:00Z", false)).unwrap();
    assert_eq!(
        eng.invoke(&inv),
        Err(EvalError::DepthExceeded { limit: 4 })
    );
}
