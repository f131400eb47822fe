//! Execution boundary tests.
//!
//! Drive the boundary through its JSON contract the way an embedding
//! caller would: build a request, submit it, read exactly one response.

use fleet_core::combat::EclipseResolver;
use fleet_core::fleet::Fleet;
use fleet_core::rules::{CombatRules, InitiativeTieBreak};
use fleet_sim::{
    handle_json, handle_request, run_batch, BatchRequest, BatchResponse, BoundaryState,
    ErrorCategory, ExecutionBoundary, SerializedFleet,
};
use fleet_test_utils::fixtures;

fn json_request(attacker: &str, defender: &str, seed: u64, steps: i64) -> String {
    serde_json::json!({
        "seed": seed,
        "attacker_fleet": attacker,
        "defender_fleet": defender,
        "simulation_steps": steps,
    })
    .to_string()
}

#[tokio::test]
async fn test_malformed_attacker_reports_invalid_fleet_data() {
    let defender = fixtures::fleet_json(&fixtures::mixed_fleet());
    let request =
        BatchRequest::from_json(&json_request("{\"ships\": [{\"hull\":", &defender, 1, 100))
            .unwrap();
    let boundary = ExecutionBoundary::current(EclipseResolver::default()).unwrap();

    let response = boundary.submit(request).wait().await;
    let line = response.to_json_line();

    assert!(!line.contains("defender_win_percent"));
    assert_eq!(
        response.error().map(|e| e.category),
        Some(ErrorCategory::InvalidFleetData)
    );
    assert!(response.error().unwrap().message.contains("attacker"));
    assert_eq!(boundary.state(), BoundaryState::Failed);
}

#[tokio::test]
async fn test_empty_defender_over_the_wire() {
    let attacker = fixtures::fleet_json(&fixtures::mixed_fleet());
    let request =
        BatchRequest::from_json(&json_request(&attacker, r#"{"ships":[]}"#, 7, 10)).unwrap();
    let boundary = ExecutionBoundary::current(EclipseResolver::default()).unwrap();

    let response = boundary.submit(request).wait().await;

    assert_eq!(response.to_json_line(), "{\"defender_win_percent\":0.0}\n");
}

#[tokio::test]
async fn test_response_matches_direct_batch() {
    let attacker = fixtures::benchmark_attacker();
    let defender = fixtures::benchmark_defender();
    let boundary = ExecutionBoundary::current(EclipseResolver::default()).unwrap();

    let response = boundary
        .submit(BatchRequest::new(42, &attacker, &defender, 100))
        .wait()
        .await;
    let direct = run_batch(&attacker, &defender, 42, 100).unwrap();

    assert_eq!(
        response.defender_win_percent(),
        Some(direct.defender_win_fraction())
    );
}

#[tokio::test]
async fn test_trial_count_checked_after_fleets() {
    let fleet = fixtures::mixed_fleet();
    let boundary = ExecutionBoundary::current(EclipseResolver::default()).unwrap();

    for steps in [0, -1, i64::MIN] {
        let response = boundary
            .submit(BatchRequest::new(1, &fleet, &fleet, steps))
            .wait()
            .await;
        assert_eq!(
            response.error().map(|e| e.category),
            Some(ErrorCategory::InvalidTrialCount)
        );
        assert_eq!(response.defender_win_percent(), None);
    }
}

#[tokio::test]
async fn test_sequential_requests_reuse_boundary() {
    let fleet = fixtures::mixed_fleet();
    let rules = CombatRules::default().with_tie_break(InitiativeTieBreak::Random);
    let boundary = ExecutionBoundary::with_rules(tokio::runtime::Handle::current(), rules);

    let mut answers = Vec::new();
    for seed in 0..3 {
        let response = boundary
            .submit(BatchRequest::new(seed, &fleet, &fleet, 20))
            .wait()
            .await;
        assert_eq!(boundary.state(), BoundaryState::Completed);
        answers.push(response);
    }

    let replay = boundary
        .submit(BatchRequest::new(0, &fleet, &fleet, 20))
        .wait()
        .await;
    assert_eq!(replay, answers[0]);
}

#[test]
fn test_string_and_inline_fleets_agree() {
    let attacker = fixtures::mixed_fleet();
    let defender = fixtures::fleet_of(fixtures::cruiser(), 3);
    let inline = BatchRequest::new(5, &attacker, &defender, 50);
    let text = BatchRequest {
        attacker_fleet: SerializedFleet::Text(fixtures::fleet_json(&attacker)),
        defender_fleet: SerializedFleet::Text(fixtures::fleet_json(&defender)),
        ..inline.clone()
    };

    let resolver = EclipseResolver::default();
    assert_eq!(
        handle_request(&inline, &resolver),
        handle_request(&text, &resolver)
    );
}

#[test]
fn test_response_wire_format_parses_back() {
    let fleet = fixtures::mixed_fleet();
    let response = handle_request(
        &BatchRequest::new(3, &fleet, &Fleet::empty(), 4),
        &EclipseResolver::default(),
    );

    let parsed = BatchResponse::from_json(response.to_json_line().trim_end()).unwrap();
    assert_eq!(parsed, response);
}

#[test]
fn test_undecodable_request_answers_with_boundary_error() {
    let resolver = EclipseResolver::default();

    for json in [
        r#"{"seed":1,"attacker_fleet":"{}","defender_fleet":"{}"}"#,
        r#"{"seed":1,"attacker_fleet":"{}""#,
        "",
    ] {
        let response = handle_json(json, &resolver);
        let line = response.to_json_line();

        assert!(!line.contains("defender_win_percent"), "{line}");
        assert_eq!(
            response.error().map(|e| e.category),
            Some(ErrorCategory::BoundaryError)
        );
    }
}

#[test]
fn test_missing_steps_names_the_field() {
    let response = handle_json(
        r#"{"seed":1,"attacker_fleet":"{}","defender_fleet":"{}"}"#,
        &EclipseResolver::default(),
    );
    assert!(response.error().unwrap().message.contains("simulation_steps"));
}

#[test]
fn test_json_entry_point_matches_typed_entry_point() {
    let fleet = fixtures::mixed_fleet();
    let request = BatchRequest::new(9, &fleet, &fixtures::fleet_of(fixtures::cruiser(), 2), 30);
    let json = serde_json::to_string(&request).unwrap();
    let resolver = EclipseResolver::default();

    assert_eq!(
        handle_json(&json, &resolver),
        handle_request(&request, &resolver)
    );
}

#[tokio::test]
async fn test_finished_states_accept_new_requests() {
    let fleet = fixtures::mixed_fleet();
    let boundary = ExecutionBoundary::current(EclipseResolver::default()).unwrap();

    boundary
        .submit(BatchRequest::new(1, &fleet, &fleet, 0))
        .wait()
        .await;
    assert_eq!(boundary.state(), BoundaryState::Failed);
    assert!(boundary.state().is_idle());

    let response = boundary
        .submit(BatchRequest::new(1, &fleet, &fleet, 5))
        .wait()
        .await;
    assert!(response.defender_win_percent().is_some());
    assert!(boundary.state().is_idle());
}
