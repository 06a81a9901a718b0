//! Request surface of the choreography service
//!
//! Upload responses, the sequence store operations and the move listing.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use cadence_choreography::{
    ChoreographyConfig, ChoreographyService, ExecuteRequest, MoveCatalog, SequenceStore,
    ViolationCategory,
};
use cadence_core::{ChoreographySequenceRecord, ExecuteStatus, PlaybackStatus};
use cadence_testkit::fixtures::{self, move_at, sequence, T0};
use cadence_testkit::{MockLeaseArbiter, RecordingMotionController, SimulatedClock};

fn service_with(catalog: MoveCatalog, clock: SimulatedClock) -> ChoreographyService {
    ChoreographyService::from_config(
        &ChoreographyConfig::default(),
        catalog,
        Arc::new(SequenceStore::new()),
        Arc::new(clock),
        Arc::new(RecordingMotionController::new()),
        Arc::new(MockLeaseArbiter::granting(fixtures::lease())),
    )
}

fn service() -> ChoreographyService {
    service_with(
        MoveCatalog::new(fixtures::scenario_moves()).unwrap(),
        SimulatedClock::auto(T0),
    )
}

#[test]
fn accepted_upload_reports_corrections_and_replacement() {
    let service = service();
    let stretched = sequence("dance", 120.0, vec![move_at("step", 0, 6)]);

    let first = service.upload(stretched.clone().into(), true);
    assert!(first.accepted);
    assert_eq!(first.warnings.len(), 1);
    assert!(!first.replaced_previous);

    let stored = service.store().get("dance").unwrap();
    assert_eq!(stored.sequence.moves[0].requested_slices, 4);
    assert_eq!(stored.warnings, first.warnings);

    let second = service.upload(fixtures::scenario_sequence().into(), false);
    assert!(!second.replaced_previous);
    let again = service.upload(stretched.into(), true);
    assert!(again.replaced_previous);
    assert_eq!(service.list_all_sequences(), vec!["dance", "scenario"]);
}

#[test]
fn rejected_upload_leaves_the_store_untouched() {
    let service = service();
    service.upload(fixtures::scenario_sequence().into(), false);
    let before = service.store().get("scenario").unwrap();

    let mut broken = fixtures::reversed_scenario_sequence();
    broken.name = "scenario".into();
    let response = service.upload(broken.into(), true);

    assert!(!response.accepted);
    assert!(response.warnings.is_empty());
    assert!(response
        .diagnostics
        .iter()
        .any(|d| d.category == ViolationCategory::Continuity));
    assert_eq!(service.store().get("scenario").unwrap(), before);
}

#[test]
fn malformed_records_are_structural_rejections() {
    let service = service();
    let mut record = ChoreographySequenceRecord::from(fixtures::scenario_sequence());
    record.slices_per_minute = 0.0;
    record.moves[1].start_slice = -3;

    let response = service.upload(record, true);
    assert!(!response.accepted);
    assert!(response
        .diagnostics
        .iter()
        .all(|d| d.category == ViolationCategory::Structural));
    assert_eq!(response.diagnostics.len(), 2);
    assert!(service.list_all_sequences().is_empty());
}

#[test]
fn move_listing_carries_catalog_and_params_config() {
    let service = service_with(MoveCatalog::builtin().unwrap(), SimulatedClock::auto(T0));
    let listing = service.list_all_moves();
    assert_eq!(listing.moves.len(), 21);
    assert!(listing.moves.windows(2).all(|w| w[0].name < w[1].name));
    let config: serde_json::Value = serde_json::from_str(&listing.move_params_config).unwrap();
    assert!(config.is_object());
}

#[test]
fn delete_sequence_reports_whether_it_existed() {
    let service = service();
    service.upload(fixtures::scenario_sequence().into(), false);
    assert!(service.delete_sequence("scenario"));
    assert!(!service.delete_sequence("scenario"));
    assert!(service.list_all_sequences().is_empty());
}

#[tokio::test]
async fn deleting_a_playing_sequence_does_not_stop_it() {
    let service = service();
    service.upload(fixtures::scenario_sequence().into(), false);
    let response = service
        .execute(ExecuteRequest {
            sequence_name: "scenario".into(),
            start_time: T0,
            start_slice: 0,
            lease: fixtures::lease(),
        })
        .await;
    assert_eq!(response.status, ExecuteStatus::Ok);
    assert!(service.delete_sequence("scenario"));

    let report = service
        .wait_for_completion(response.session_id.unwrap())
        .await
        .unwrap();
    assert_eq!(report.status, PlaybackStatus::Completed);
    assert_eq!(report.dispatched.len(), 2);
}
