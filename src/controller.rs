//! Scan controller: owns the view state and joins the decorative timeline with the
//! remote scan call.
//!
//! Every transition takes the state write lock exactly once, so readers never observe a
//! half-applied transition. Each submission opens a new session; updates carrying an
//! older session number are dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ScanApi;
use crate::timeline::{Timeline, TimelineEvent};
use crate::types::{
    uniform_statuses, LogEntry, ScanRequest, ScanResult, ScanSnapshot, Severity, SourceStatus,
    ViewState,
};

/// Pause between finalizing a successful scan and switching to the results view.
pub const RESULTS_DELAY: Duration = Duration::from_millis(500);

pub const COMPLETE_MESSAGE: &str = "SCAN COMPLETE - Report generated";

/// How a submitted scan ended, as seen by whoever awaits its task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Completed,
    Failed(String),
    /// A reset or a newer submission took over before this scan finished.
    Superseded,
}

#[derive(Debug, Default)]
struct ControllerState {
    session: u64,
    cancel: Option<CancellationToken>,
    snapshot: ScanSnapshot,
}

impl ControllerState {
    fn is_current(&self, session: u64) -> bool {
        self.session == session
    }

    fn log(&mut self, severity: Severity, message: impl Into<String>) {
        self.snapshot.logs.push(LogEntry::now(severity, message));
    }
}

#[derive(Clone)]
pub struct ScanController {
    inner: Arc<RwLock<ControllerState>>,
    api: Arc<dyn ScanApi>,
    timeline: Timeline,
    results_delay: Duration,
}

impl ScanController {
    pub fn new(api: Arc<dyn ScanApi>) -> Self {
        Self::with_timeline(api, Timeline::standard())
    }

    pub fn with_timeline(api: Arc<dyn ScanApi>, timeline: Timeline) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ControllerState::default())),
            api,
            timeline,
            results_delay: RESULTS_DELAY,
        }
    }

    pub fn with_results_delay(mut self, delay: Duration) -> Self {
        self.results_delay = delay;
        self
    }

    /// Copy of the observable state.
    pub async fn snapshot(&self) -> ScanSnapshot {
        self.inner.read().await.snapshot.clone()
    }

    /// Start a scan. Returns `None` without touching any state when the request carries
    /// no identifier.
    ///
    /// A scan already in flight is superseded: its timeline stops and its remote result
    /// will be discarded.
    pub async fn submit(&self, request: ScanRequest) -> Option<JoinHandle<ScanOutcome>> {
        if !request.is_submittable() {
            debug!("ignoring submit without identifiers");
            return None;
        }
        let request = request.normalized();

        let cancel = CancellationToken::new();
        let session = {
            let mut s = self.inner.write().await;
            if let Some(previous) = s.cancel.take() {
                previous.cancel();
            }
            s.session += 1;
            s.cancel = Some(cancel.clone());
            s.snapshot = ScanSnapshot {
                view: ViewState::Scanning,
                current_stage: 0,
                logs: Vec::new(),
                sources: uniform_statuses(SourceStatus::Pending),
                result: None,
            };
            s.session
        };
        info!(session, "scan submitted");

        let this = self.clone();
        Some(tokio::spawn(async move {
            this.run_session(session, request, cancel).await
        }))
    }

    /// Return to the input view, discarding everything from the current session.
    pub async fn reset(&self) {
        let mut s = self.inner.write().await;
        if s.snapshot.view == ViewState::Input && s.cancel.is_none() {
            return;
        }
        if let Some(cancel) = s.cancel.take() {
            cancel.cancel();
        }
        s.session += 1;
        s.snapshot = ScanSnapshot::default();
        info!(session = s.session, "scan reset");
    }

    async fn run_session(
        &self,
        session: u64,
        request: ScanRequest,
        cancel: CancellationToken,
    ) -> ScanOutcome {
        let timeline = self
            .timeline
            .run(cancel, move |event| self.apply_timeline_event(session, event));
        let remote = self.api.scan(&request);
        let (timeline_outcome, remote_outcome) = tokio::join!(timeline, remote);
        debug!(session, ?timeline_outcome, "timeline and remote call joined");

        match remote_outcome {
            Ok(result) => self.finish_success(session, result).await,
            Err(e) => self.finish_failure(session, e.to_string()).await,
        }
    }

    async fn apply_timeline_event(&self, session: u64, event: TimelineEvent) {
        self.update(session, |s| match event {
            TimelineEvent::StageEntered(stage) => s.snapshot.current_stage = stage.index(),
            TimelineEvent::Log { severity, message } => s.log(severity, message),
            TimelineEvent::Status { source, status } => {
                s.snapshot.sources.insert(source, status);
            }
        })
        .await;
    }

    /// Apply `f` under the write lock when `session` is still current.
    async fn update(&self, session: u64, f: impl FnOnce(&mut ControllerState)) -> bool {
        let mut s = self.inner.write().await;
        if !s.is_current(session) {
            return false;
        }
        f(&mut *s);
        true
    }

    async fn finish_success(&self, session: u64, result: ScanResult) -> ScanOutcome {
        let score = result.risk_score;
        let applied = self
            .update(session, |s| {
                s.snapshot.sources = uniform_statuses(SourceStatus::Complete);
                s.log(Severity::Success, COMPLETE_MESSAGE);
                s.snapshot.result = Some(result);
            })
            .await;
        if !applied {
            warn!(session, "discarding scan result from a stale session");
            return ScanOutcome::Superseded;
        }
        info!(session, score, "scan finalized");

        tokio::time::sleep(self.results_delay).await;

        let shown = self
            .update(session, |s| {
                if s.snapshot.result.is_some() {
                    s.snapshot.view = ViewState::Results;
                    s.cancel = None;
                }
            })
            .await;
        if shown {
            ScanOutcome::Completed
        } else {
            ScanOutcome::Superseded
        }
    }

    async fn finish_failure(&self, session: u64, message: String) -> ScanOutcome {
        let applied = self
            .update(session, |s| {
                s.snapshot.sources = uniform_statuses(SourceStatus::Error);
                s.log(Severity::Error, format!("Error: {message}"));
                s.cancel = None;
            })
            .await;
        if !applied {
            warn!(session, %message, "discarding scan failure from a stale session");
            return ScanOutcome::Superseded;
        }
        warn!(session, %message, "scan failed");
        ScanOutcome::Failed(message)
    }
}
