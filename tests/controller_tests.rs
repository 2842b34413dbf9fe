mod common;

use std::time::Duration;

use common::{email_only, FakeApi};
use footprint_guard::controller::{ScanController, ScanOutcome, COMPLETE_MESSAGE};
use footprint_guard::render::{self, Priority};
use footprint_guard::types::{
    uniform_statuses, ScanRequest, ScanSnapshot, Severity, Source, SourceStatus, ViewState,
};
use tokio::time::{sleep, Instant};

const TIMELINE: Duration = Duration::from_millis(11_500);
const RESULTS_PAUSE: Duration = Duration::from_millis(500);

fn stage_lines(snapshot: &ScanSnapshot) -> Vec<String> {
    snapshot
        .logs
        .iter()
        .filter(|l| l.message.starts_with("[STAGE"))
        .map(|l| l.message.clone())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn empty_request_never_fires() {
    let api = FakeApi::ok(Duration::ZERO);
    let ctl = ScanController::new(api.clone());

    let blank = ScanRequest {
        github_username: Some("  ".into()),
        ..Default::default()
    };
    assert!(ctl.submit(ScanRequest::default()).await.is_none());
    assert!(ctl.submit(blank).await.is_none());

    assert_eq!(ctl.snapshot().await, ScanSnapshot::default());
    assert_eq!(api.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn one_field_issues_exactly_one_remote_call() {
    let api = FakeApi::ok(Duration::from_millis(300));
    let ctl = ScanController::new(api.clone());

    let task = ctl.submit(email_only()).await.expect("submittable");
    assert_eq!(task.await.unwrap(), ScanOutcome::Completed);
    assert_eq!(api.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn stage_lines_keep_order_regardless_of_latency() {
    for latency in [Duration::ZERO, Duration::from_secs(3), Duration::from_secs(30)] {
        let ctl = ScanController::new(FakeApi::ok(latency));
        ctl.submit(email_only()).await.unwrap().await.unwrap();
        assert_eq!(
            stage_lines(&ctl.snapshot().await),
            vec![
                "[STAGE 1] PLANNER AGENT ACTIVATED",
                "[STAGE 2] GATHER AGENT ACTIVATED",
                "[STAGE 3] GENERATE AGENT ACTIVATED",
                "[STAGE 4] EVALUATE AGENT ACTIVATED",
            ],
            "latency {latency:?}"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn fast_remote_waits_for_the_timeline() {
    let ctl = ScanController::new(FakeApi::ok(Duration::from_millis(100)));
    let start = Instant::now();
    let task = ctl.submit(email_only()).await.unwrap();

    sleep(Duration::from_secs(5)).await;
    let mid = ctl.snapshot().await;
    assert_eq!(mid.view, ViewState::Scanning);
    assert!(mid.result.is_none());
    assert!(!mid.logs.iter().any(|l| l.message == COMPLETE_MESSAGE));

    assert_eq!(task.await.unwrap(), ScanOutcome::Completed);
    assert!(start.elapsed() >= TIMELINE + RESULTS_PAUSE);
    assert_eq!(ctl.snapshot().await.view, ViewState::Results);
}

#[tokio::test(start_paused = true)]
async fn slow_remote_holds_finalization_after_the_timeline() {
    let latency = Duration::from_secs(20);
    let ctl = ScanController::new(FakeApi::ok(latency));
    let start = Instant::now();
    let task = ctl.submit(email_only()).await.unwrap();

    sleep(Duration::from_secs(15)).await;
    let mid = ctl.snapshot().await;
    assert_eq!(mid.view, ViewState::Scanning);
    assert!(mid.result.is_none());
    assert_eq!(stage_lines(&mid).len(), 4);
    assert_eq!(mid.current_stage, 3);
    // Timeline badges are done, but nothing has been finalized yet.
    assert_eq!(mid.status_of(Source::GitHub), SourceStatus::Complete);
    assert!(!mid.logs.iter().any(|l| l.message == COMPLETE_MESSAGE));

    assert_eq!(task.await.unwrap(), ScanOutcome::Completed);
    assert!(start.elapsed() >= latency + RESULTS_PAUSE);
}

#[tokio::test(start_paused = true)]
async fn remote_failure_marks_every_source_error_and_stays_scanning() {
    let api = FakeApi::failing(Duration::from_secs(1), 500, "upstream timeout");
    let ctl = ScanController::new(api);

    let outcome = ctl.submit(email_only()).await.unwrap().await.unwrap();
    assert_eq!(outcome, ScanOutcome::Failed("upstream timeout".into()));

    let snap = ctl.snapshot().await;
    assert_eq!(snap.view, ViewState::Scanning);
    assert!(snap.result.is_none());
    assert_eq!(snap.sources, uniform_statuses(SourceStatus::Error));
    let last = snap.logs.last().expect("final log line");
    assert_eq!(last.severity, Severity::Error);
    assert!(last.message.contains("upstream timeout"));

    // No automatic transition later on.
    sleep(Duration::from_secs(10)).await;
    assert_eq!(ctl.snapshot().await.view, ViewState::Scanning);
}

#[tokio::test(start_paused = true)]
async fn success_renders_the_report() {
    let ctl = ScanController::new(FakeApi::ok(Duration::from_secs(2)));
    ctl.submit(email_only()).await.unwrap().await.unwrap();

    let snap = ctl.snapshot().await;
    assert_eq!(snap.view, ViewState::Results);
    assert_eq!(snap.sources, uniform_statuses(SourceStatus::Complete));
    let last = snap.logs.last().unwrap();
    assert_eq!(last.severity, Severity::Success);
    assert_eq!(last.message, COMPLETE_MESSAGE);

    let report = render::report_view(snap.result.as_ref().unwrap());
    assert_eq!(report.gauge.display(), "67/100");
    assert_eq!(report.risk_factors.len(), 1);
    assert!(report.no_risk_factors.is_none());
    let priorities: Vec<Priority> = report.mitigations.iter().map(|m| m.priority).collect();
    assert_eq!(priorities, vec![Priority::Critical, Priority::Recommended]);
    assert_eq!(report.mitigations[1].step, 2);
}

#[tokio::test(start_paused = true)]
async fn finalization_is_never_observed_half_applied() {
    let ctl = ScanController::new(FakeApi::ok(Duration::from_secs(4)));
    let task = ctl.submit(email_only()).await.unwrap();

    let watcher = ctl.clone();
    let poll = tokio::spawn(async move {
        let mut seen = Vec::new();
        for _ in 0..300 {
            seen.push(watcher.snapshot().await);
            sleep(Duration::from_millis(50)).await;
        }
        seen
    });

    task.await.unwrap();
    for snap in poll.await.unwrap() {
        if snap.result.is_some() || snap.logs.iter().any(|l| l.message == COMPLETE_MESSAGE) {
            assert!(snap.result.is_some());
            assert_eq!(snap.sources, uniform_statuses(SourceStatus::Complete));
        }
        if snap.view == ViewState::Results {
            assert!(snap.result.is_some());
        }
    }
}

#[tokio::test(start_paused = true)]
async fn reset_while_scanning_ignores_the_late_response() {
    let api = FakeApi::ok(Duration::from_secs(20));
    let ctl = ScanController::new(api.clone());
    let task = ctl.submit(email_only()).await.unwrap();

    sleep(Duration::from_secs(3)).await;
    ctl.reset().await;
    assert_eq!(ctl.snapshot().await, ScanSnapshot::default());

    assert_eq!(task.await.unwrap(), ScanOutcome::Superseded);
    assert_eq!(api.calls(), 1);
    assert_eq!(ctl.snapshot().await, ScanSnapshot::default());
}

#[tokio::test(start_paused = true)]
async fn reset_during_results_pause_prevents_results() {
    let ctl = ScanController::new(FakeApi::ok(Duration::ZERO));
    let task = ctl.submit(email_only()).await.unwrap();

    sleep(TIMELINE + Duration::from_millis(100)).await;
    assert!(ctl.snapshot().await.result.is_some());
    ctl.reset().await;

    assert_eq!(task.await.unwrap(), ScanOutcome::Superseded);
    assert_eq!(ctl.snapshot().await.view, ViewState::Input);
}

#[tokio::test(start_paused = true)]
async fn second_reset_is_a_no_op() {
    let ctl = ScanController::new(FakeApi::ok(Duration::ZERO));
    ctl.reset().await;
    assert_eq!(ctl.snapshot().await, ScanSnapshot::default());

    ctl.submit(email_only()).await.unwrap().await.unwrap();
    ctl.reset().await;
    let first = ctl.snapshot().await;
    ctl.reset().await;
    assert_eq!(ctl.snapshot().await, first);
    assert_eq!(first.view, ViewState::Input);
}

#[tokio::test(start_paused = true)]
async fn resubmitting_supersedes_the_running_scan() {
    let api = FakeApi::ok(Duration::from_secs(1));
    let ctl = ScanController::new(api.clone());
    let first = ctl.submit(email_only()).await.unwrap();

    sleep(Duration::from_secs(4)).await;
    let second = ctl.submit(email_only()).await.unwrap();

    assert_eq!(first.await.unwrap(), ScanOutcome::Superseded);
    assert_eq!(second.await.unwrap(), ScanOutcome::Completed);
    assert_eq!(api.calls(), 2);

    let snap = ctl.snapshot().await;
    let planner = snap
        .logs
        .iter()
        .filter(|l| l.message == "[STAGE 1] PLANNER AGENT ACTIVATED")
        .count();
    assert_eq!(planner, 1);
}

#[tokio::test(start_paused = true)]
async fn name_only_request_is_sent_and_a_rejection_surfaces_as_failure() {
    let api = FakeApi::failing(Duration::ZERO, 400, "At least one identifier is required");
    let ctl = ScanController::new(api.clone());
    let request = ScanRequest {
        full_name: Some("Ada Lovelace".into()),
        ..Default::default()
    };

    let outcome = ctl.submit(request).await.expect("name alone is submittable").await.unwrap();
    assert_eq!(
        outcome,
        ScanOutcome::Failed("At least one identifier is required".into())
    );
    assert_eq!(api.calls(), 1);
    assert_eq!(ctl.snapshot().await.sources, uniform_statuses(SourceStatus::Error));
}
