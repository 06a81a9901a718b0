//! Execution through the service with deterministic effects
//!
//! Covers the reference timing scenario, lease gating before and during
//! playback (under both lease check policies), controller faults, abort,
//! session replacement, catch-up after a late start and runtime posture
//! tracking.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use cadence_choreography::{
    ChoreographyConfig, ChoreographyService, ExecuteRequest, LeaseCheckPolicy, MoveCatalog,
    SequenceStore,
};
use cadence_core::{
    ChoreographySequence, ChoreographySequenceRecord, ExecuteStatus, FaultReason, LeaseToken,
    LeaseUseStatus, PlaybackStatus, Timestamp,
};
use cadence_effects::StaticLeaseArbiter;
use cadence_testkit::fixtures::{self, move_at, sequence, T0};
use cadence_testkit::{MockLeaseArbiter, RecordingMotionController, SimulatedClock};

struct Harness {
    service: ChoreographyService,
    clock: SimulatedClock,
    motion: RecordingMotionController,
    arbiter: MockLeaseArbiter,
}

fn harness(clock: SimulatedClock) -> Harness {
    harness_with(clock, ChoreographyConfig::default())
}

fn harness_with(clock: SimulatedClock, config: ChoreographyConfig) -> Harness {
    let motion = RecordingMotionController::new();
    let arbiter = MockLeaseArbiter::granting(fixtures::lease());
    let catalog = MoveCatalog::new(fixtures::scenario_moves()).unwrap();
    let service = ChoreographyService::from_config(
        &config,
        catalog,
        Arc::new(SequenceStore::new()),
        Arc::new(clock.clone()),
        Arc::new(motion.clone()),
        Arc::new(arbiter.clone()),
    );
    Harness {
        service,
        clock,
        motion,
        arbiter,
    }
}

impl Harness {
    fn upload(&self, sequence: ChoreographySequence) {
        let response = self
            .service
            .upload(ChoreographySequenceRecord::from(sequence), false);
        assert!(response.accepted, "{:?}", response.diagnostics);
    }

    fn request(&self, name: &str, start_time: Timestamp, start_slice: u64) -> ExecuteRequest {
        ExecuteRequest {
            sequence_name: name.to_string(),
            start_time,
            start_slice,
            lease: fixtures::lease(),
        }
    }
}

fn on_revocation_harness(clock: SimulatedClock) -> Harness {
    let mut config = ChoreographyConfig::default();
    config.scheduler.lease_check = LeaseCheckPolicy::OnRevocation;
    harness_with(clock, config)
}

/// step and arm_wave both starting at slice 0 on disjoint subsystems
fn paired_sequence() -> ChoreographySequence {
    sequence(
        "pair",
        120.0,
        vec![move_at("step", 0, 4), move_at("arm_wave", 0, 4)],
    )
}

/// Let spawned tasks run until `condition` holds
async fn until(condition: impl Fn() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn scenario_dispatches_step_now_and_kneel_circle_at_two_seconds() {
    let h = harness(SimulatedClock::auto(T0));
    h.upload(fixtures::scenario_sequence());

    let response = h.service.execute(h.request("scenario", T0, 0)).await;
    assert_eq!(response.status, ExecuteStatus::Ok);
    assert_eq!(response.lease_use_result.status, LeaseUseStatus::Ok);

    let report = h
        .service
        .wait_for_completion(response.session_id.unwrap())
        .await
        .unwrap();
    assert_eq!(report.status, PlaybackStatus::Completed);
    assert_eq!(report.execute_status, ExecuteStatus::Ok);
    assert_eq!(report.dispatched_types(), vec!["step", "kneel_circle"]);

    let activations = h.motion.activations();
    assert_eq!(activations[0].dispatched_at, T0);
    assert_eq!(activations[0].deadline, T0 + Duration::from_secs(2));
    assert_eq!(activations[1].dispatched_at, T0 + Duration::from_secs(2));
    assert_eq!(activations[1].deadline, T0 + Duration::from_secs(6));
    assert!(h.motion.cancels().is_empty());
    assert!(h.clock.current() >= T0 + Duration::from_secs(6));
}

#[tokio::test]
async fn invalid_lease_never_dispatches() {
    let h = harness(SimulatedClock::auto(T0));
    h.upload(fixtures::scenario_sequence());

    let mut request = h.request("scenario", T0, 0);
    request.lease = LeaseToken::new("body", "epoch-0", vec![7]);
    let response = h.service.execute(request).await;

    assert_eq!(response.status, ExecuteStatus::LeaseError);
    assert_eq!(response.lease_use_result.status, LeaseUseStatus::Invalid);
    assert!(response.session_id.is_none());
    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
    assert!(h.motion.activations().is_empty());
    assert_eq!(h.service.status().await.status, PlaybackStatus::Idle);
}

#[tokio::test]
async fn unknown_sequence_is_reported_without_arming() {
    let h = harness(SimulatedClock::auto(T0));
    let response = h.service.execute(h.request("missing", T0, 0)).await;
    assert_eq!(response.status, ExecuteStatus::InvalidUploadedChoreography);
    assert!(response.lease_use_result.is_ok());
    assert!(response.session_id.is_none());
    assert_eq!(h.service.status().await, Default::default());
}

#[tokio::test]
async fn revocation_notice_faults_the_session_mid_run() {
    let h = harness(SimulatedClock::manual(T0));
    h.upload(fixtures::scenario_sequence());
    let id = h
        .service
        .execute(h.request("scenario", T0, 0))
        .await
        .session_id
        .unwrap();

    until(|| h.motion.activations().len() == 1).await;
    h.arbiter.revoke(&fixtures::lease(), "preempted by operator");

    let report = h.service.wait_for_completion(id).await.unwrap();
    assert_matches!(
        &report.status,
        PlaybackStatus::Faulted { reason: FaultReason::LeaseError { message } }
            if message.contains("preempted")
    );
    assert_eq!(report.execute_status, ExecuteStatus::LeaseError);
    assert_eq!(h.motion.activated_types(), vec!["step"]);
    assert_eq!(h.motion.cancels(), vec![id]);
}

#[tokio::test]
async fn silent_lease_expiry_is_caught_on_the_next_tick() {
    let h = harness(SimulatedClock::manual(T0));
    h.upload(fixtures::scenario_sequence());
    let id = h
        .service
        .execute(h.request("scenario", T0, 0))
        .await
        .session_id
        .unwrap();

    until(|| h.motion.activations().len() == 1).await;
    let checks_before = h.arbiter.validations();
    h.arbiter.expire(&fixtures::lease());
    h.clock.advance(Duration::from_secs(3));

    let report = h.service.wait_for_completion(id).await.unwrap();
    assert_eq!(report.execute_status, ExecuteStatus::LeaseError);
    assert!(h.arbiter.validations() > checks_before);
    // kneel_circle was due at 2s but the lease check runs first.
    assert_eq!(h.motion.activated_types(), vec!["step"]);
}

#[tokio::test]
async fn on_revocation_policy_faults_on_a_notice_mid_run() {
    let h = on_revocation_harness(SimulatedClock::manual(T0));
    h.upload(fixtures::scenario_sequence());
    let id = h
        .service
        .execute(h.request("scenario", T0, 0))
        .await
        .session_id
        .unwrap();

    until(|| h.motion.activations().len() == 1).await;
    // One check in execute, one on the first running tick.
    assert_eq!(h.arbiter.validations(), 2);
    h.arbiter.revoke(&fixtures::lease(), "preempted by operator");

    let report = h.service.wait_for_completion(id).await.unwrap();
    assert_matches!(
        &report.status,
        PlaybackStatus::Faulted { reason: FaultReason::LeaseError { message } }
            if message.contains("preempted")
    );
    assert_eq!(h.arbiter.validations(), 2);
    assert_eq!(h.motion.activated_types(), vec!["step"]);
    assert_eq!(h.motion.cancels(), vec![id]);
}

#[tokio::test]
async fn notice_published_right_after_execute_stops_the_session() {
    let h = on_revocation_harness(SimulatedClock::auto(T0));
    h.upload(fixtures::scenario_sequence());
    let id = h
        .service
        .execute(h.request("scenario", T0, 0))
        .await
        .session_id
        .unwrap();
    // The dispatch task has not run yet.
    h.arbiter
        .publish_revocation(&fixtures::lease(), "preempted while arming");

    let report = h.service.wait_for_completion(id).await.unwrap();
    assert_matches!(
        &report.status,
        PlaybackStatus::Faulted { reason: FaultReason::LeaseError { message } }
            if message.contains("arming")
    );
    assert!(h.motion.activations().is_empty());
    assert_eq!(h.motion.cancels(), vec![id]);
}

#[tokio::test]
async fn on_revocation_policy_still_checks_the_lease_on_the_first_tick() {
    let h = on_revocation_harness(SimulatedClock::auto(T0));
    h.upload(fixtures::scenario_sequence());
    let id = h
        .service
        .execute(h.request("scenario", T0, 0))
        .await
        .session_id
        .unwrap();
    h.arbiter.expire(&fixtures::lease());

    let report = h.service.wait_for_completion(id).await.unwrap();
    assert_eq!(report.execute_status, ExecuteStatus::LeaseError);
    assert!(report.dispatched.is_empty());
    assert!(h.motion.activations().is_empty());
}

#[tokio::test]
async fn abort_during_a_slow_activation_stops_the_rest_of_the_batch() {
    let h = harness(SimulatedClock::manual(T0));
    h.motion.hold("step");
    h.upload(paired_sequence());
    let id = h
        .service
        .execute(h.request("pair", T0, 0))
        .await
        .session_id
        .unwrap();
    until(|| h.motion.is_holding()).await;

    // The abort is requested on the first poll, then step's activation returns.
    let (response, ()) = tokio::join!(h.service.abort(fixtures::lease()), async {
        tokio::task::yield_now().await;
        h.motion.release();
    });
    assert_eq!(response.status, ExecuteStatus::Ok);
    assert_eq!(response.aborted_session, Some(id));

    let report = h.service.scheduler().report(id).unwrap();
    assert_eq!(report.status, PlaybackStatus::Aborted);
    assert_eq!(report.dispatched_types(), vec!["step"]);
    assert_eq!(h.motion.activated_types(), vec!["step"]);
    assert_eq!(h.motion.cancels(), vec![id]);
}

#[tokio::test]
async fn revocation_during_a_slow_activation_stops_the_rest_of_the_batch() {
    let h = harness(SimulatedClock::manual(T0));
    h.motion.hold("step");
    h.upload(paired_sequence());
    let id = h
        .service
        .execute(h.request("pair", T0, 0))
        .await
        .session_id
        .unwrap();
    until(|| h.motion.is_holding()).await;

    h.arbiter.revoke(&fixtures::lease(), "preempted by operator");
    h.motion.release();

    let report = h.service.wait_for_completion(id).await.unwrap();
    assert_eq!(report.execute_status, ExecuteStatus::LeaseError);
    assert_eq!(h.motion.activated_types(), vec!["step"]);
    assert_eq!(h.motion.cancels(), vec![id]);
}

#[tokio::test]
async fn refused_activation_faults_with_robot_command_issues() {
    let h = harness(SimulatedClock::auto(T0));
    h.motion.refuse("kneel_circle");
    h.upload(fixtures::scenario_sequence());
    let id = h
        .service
        .execute(h.request("scenario", T0, 0))
        .await
        .session_id
        .unwrap();

    let report = h.service.wait_for_completion(id).await.unwrap();
    assert_eq!(report.execute_status, ExecuteStatus::RobotCommandIssues);
    assert_eq!(report.dispatched_types(), vec!["step"]);
    assert_eq!(h.motion.cancels(), vec![id]);
}

#[tokio::test]
async fn controller_fault_mid_move_stops_dispatch() {
    let h = harness(SimulatedClock::auto(T0));
    h.motion.fault_after("step", "foot slipped");
    h.upload(fixtures::scenario_sequence());
    let id = h
        .service
        .execute(h.request("scenario", T0, 0))
        .await
        .session_id
        .unwrap();

    let report = h.service.wait_for_completion(id).await.unwrap();
    assert_matches!(
        report.status,
        PlaybackStatus::Faulted { reason: FaultReason::RobotCommandIssues { .. } }
    );
    assert_eq!(h.motion.activated_types(), vec!["step"]);
}

#[tokio::test]
async fn abort_cancels_in_flight_moves() {
    let h = harness(SimulatedClock::manual(T0));
    h.upload(fixtures::scenario_sequence());
    let id = h
        .service
        .execute(h.request("scenario", T0, 0))
        .await
        .session_id
        .unwrap();
    until(|| h.motion.activations().len() == 1).await;

    let denied = h
        .service
        .abort(LeaseToken::new("body", "epoch-0", vec![3]))
        .await;
    assert_eq!(denied.status, ExecuteStatus::LeaseError);
    assert_eq!(h.service.status().await.status, PlaybackStatus::Running);

    let response = h.service.abort(fixtures::lease()).await;
    assert_eq!(response.status, ExecuteStatus::Ok);
    assert_eq!(response.aborted_session, Some(id));

    let report = h.service.scheduler().report(id).unwrap();
    assert_eq!(report.status, PlaybackStatus::Aborted);
    assert_eq!(h.motion.cancels(), vec![id]);

    h.clock.advance(Duration::from_secs(10));
    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
    assert_eq!(h.motion.activated_types(), vec!["step"]);

    let status = h.service.status().await;
    assert_eq!(status.status, PlaybackStatus::Idle);
    assert_eq!(status.last_outcome, Some(PlaybackStatus::Aborted));
}

#[tokio::test]
async fn new_session_replaces_the_live_one() {
    let h = harness(SimulatedClock::manual(T0));
    h.upload(fixtures::scenario_sequence());
    h.upload(sequence("sway", 120.0, vec![move_at("body_sway", 0, 4)]));

    let first = h
        .service
        .execute(h.request("scenario", T0, 0))
        .await
        .session_id
        .unwrap();
    until(|| h.motion.activations().len() == 1).await;

    let second = h
        .service
        .execute(h.request("sway", T0, 0))
        .await
        .session_id
        .unwrap();
    assert_ne!(first, second);

    // The first session was stopped before the second was spawned.
    let replaced = h.service.scheduler().report(first).unwrap();
    assert_eq!(replaced.status, PlaybackStatus::Aborted);
    assert_eq!(h.motion.cancels(), vec![first]);

    until(|| h.motion.activations().len() == 2).await;
    let activations = h.motion.activations();
    assert_eq!(activations[1].move_type, "body_sway");
    assert_eq!(activations[1].session_id, second);
    assert_eq!(h.service.status().await.session_id, Some(second));
}

#[tokio::test]
async fn late_start_catches_up_instead_of_replaying() {
    // Start time 2.5s ago: slice 5 is current, step (0..4) has passed.
    let now = T0 + Duration::from_millis(2_500);
    let h = harness(SimulatedClock::auto(now));
    h.upload(fixtures::scenario_sequence());

    let id = h
        .service
        .execute(h.request("scenario", T0, 0))
        .await
        .session_id
        .unwrap();
    let report = h.service.wait_for_completion(id).await.unwrap();

    assert_eq!(report.status, PlaybackStatus::Completed);
    assert_eq!(report.skipped, vec![0]);
    assert_eq!(report.dispatched_types(), vec!["kneel_circle"]);
    assert_eq!(report.dispatched[0].dispatched_at, now);
    assert_eq!(report.dispatched[0].deadline, T0 + Duration::from_secs(6));
}

#[tokio::test]
async fn start_slice_offsets_the_timeline() {
    let h = harness(SimulatedClock::auto(T0));
    h.upload(fixtures::scenario_sequence());

    let id = h
        .service
        .execute(h.request("scenario", T0, 4))
        .await
        .session_id
        .unwrap();
    let report = h.service.wait_for_completion(id).await.unwrap();

    assert_eq!(report.skipped, vec![0]);
    assert_eq!(report.dispatched[0].dispatched_at, T0);
    assert_eq!(report.dispatched[0].deadline, T0 + Duration::from_secs(4));
}

#[tokio::test]
async fn future_start_stays_armed_until_its_time() {
    let h = harness(SimulatedClock::manual(T0));
    h.upload(fixtures::scenario_sequence());
    let start = T0 + Duration::from_secs(1);
    h.service.execute(h.request("scenario", start, 0)).await;

    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
    assert_eq!(h.service.status().await.status, PlaybackStatus::Armed);
    assert!(h.motion.activations().is_empty());

    h.clock.set_time(start);
    until(|| h.motion.activations().len() == 1).await;
    let status = h.service.status().await;
    assert_eq!(status.status, PlaybackStatus::Running);
    assert_eq!(status.current_slice, Some(0));
    assert_eq!(status.executing.len(), 1);
    assert_eq!(status.executing[0].move_type, "step");
    assert_eq!(h.motion.activations()[0].dispatched_at, start);
}

#[tokio::test]
async fn runtime_posture_drift_is_warned() {
    let h = harness(SimulatedClock::auto(T0));
    // Accepted: the gap between kneel_circle and step is not checked by default.
    h.upload(sequence(
        "gap",
        120.0,
        vec![move_at("kneel_circle", 0, 8), move_at("step", 10, 4)],
    ));

    let id = h
        .service
        .execute(h.request("gap", T0, 0))
        .await
        .session_id
        .unwrap();
    let report = h.service.wait_for_completion(id).await.unwrap();

    assert_eq!(report.status, PlaybackStatus::Completed);
    assert_eq!(report.posture_warnings.len(), 1);
    assert!(report.posture_warnings[0].contains("'kneel'"));
}

#[tokio::test]
async fn tick_cap_bounds_sleep_length() {
    let mut config = ChoreographyConfig::default();
    config.scheduler.max_tick_ms = Some(100);
    let h = harness_with(SimulatedClock::auto(T0), config);
    h.upload(fixtures::scenario_sequence());

    let start = T0 + Duration::from_secs(1);
    let id = h
        .service
        .execute(h.request("scenario", start, 0))
        .await
        .session_id
        .unwrap();
    h.service.wait_for_completion(id).await.unwrap();

    let deadlines = h.clock.sleep_deadlines();
    assert!(deadlines
        .windows(2)
        .all(|pair| pair[1].saturating_duration_since(pair[0]) <= Duration::from_millis(100)));
    assert_eq!(deadlines[0], T0 + Duration::from_millis(100));
}

#[tokio::test]
async fn operator_arbiter_classifies_and_revokes_leases() {
    let current = LeaseToken::new("body", "epoch-1", vec![2]);
    let arbiter = Arc::new(StaticLeaseArbiter::with_lease(current.clone()));
    let motion = RecordingMotionController::new();
    let service = ChoreographyService::from_config(
        &ChoreographyConfig::default(),
        MoveCatalog::new(fixtures::scenario_moves()).unwrap(),
        Arc::new(SequenceStore::new()),
        Arc::new(SimulatedClock::manual(T0)),
        Arc::new(motion.clone()),
        arbiter.clone(),
    );
    service.upload(fixtures::scenario_sequence().into(), false);

    let mut request = ExecuteRequest {
        sequence_name: "scenario".into(),
        start_time: T0,
        start_slice: 0,
        lease: LeaseToken::new("body", "epoch-1", vec![1]),
    };
    let stale = service.execute(request.clone()).await;
    assert_eq!(stale.status, ExecuteStatus::LeaseError);
    assert_eq!(stale.lease_use_result.status, LeaseUseStatus::Older);
    assert_eq!(stale.lease_use_result.latest_known_lease, Some(current.clone()));

    request.lease = current;
    let id = service.execute(request).await.session_id.unwrap();
    until(|| motion.activations().len() == 1).await;
    arbiter.revoke("body", "operator took control");

    let report = service.wait_for_completion(id).await.unwrap();
    assert_eq!(report.execute_status, ExecuteStatus::LeaseError);
    assert_eq!(motion.cancels(), vec![id]);
}
