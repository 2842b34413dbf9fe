//! Decorative progress timeline.
//!
//! The timing table is plain data; [`Timeline::run`] replays it against a cancellation
//! token and hands every step to a callback. Nothing here looks at real backend progress.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::types::Severity::{Info, Success};
use crate::types::SourceStatus::{Complete, Scanning};
use crate::types::{Severity, Source, SourceStatus};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Planner,
    Gather,
    Generate,
    Evaluate,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Planner, Stage::Gather, Stage::Generate, Stage::Evaluate];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::Planner => "Planner",
            Stage::Gather => "Gather",
            Stage::Generate => "Generate",
            Stage::Evaluate => "Evaluate",
        }
    }
}

/// A log line scheduled `at_ms` after its stage starts.
#[derive(Debug, Clone, Copy)]
pub struct TimedLog {
    pub at_ms: u64,
    pub severity: Severity,
    pub message: &'static str,
}

/// A badge status change scheduled `at_ms` after its stage starts.
#[derive(Debug, Clone, Copy)]
pub struct TimedStatus {
    pub at_ms: u64,
    pub source: Source,
    pub status: SourceStatus,
}

#[derive(Debug, Clone, Copy)]
pub struct StagePlan {
    pub stage: Stage,
    pub duration_ms: u64,
    pub logs: &'static [TimedLog],
    pub statuses: &'static [TimedStatus],
}

const fn log(at_ms: u64, severity: Severity, message: &'static str) -> TimedLog {
    TimedLog { at_ms, severity, message }
}

const fn status(at_ms: u64, source: Source, status: SourceStatus) -> TimedStatus {
    TimedStatus { at_ms, source, status }
}

pub const STANDARD_PLAN: [StagePlan; 4] = [
    StagePlan {
        stage: Stage::Planner,
        duration_ms: 2000,
        logs: &[
            log(0, Info, "[STAGE 1] PLANNER AGENT ACTIVATED"),
            log(400, Info, "Initializing autonomous agents..."),
            log(800, Info, "Parsing input parameters..."),
            log(1200, Info, "Building execution strategy..."),
            log(1800, Success, "Execution plan ready"),
        ],
        statuses: &[],
    },
    StagePlan {
        stage: Stage::Gather,
        duration_ms: 4000,
        logs: &[
            log(0, Info, "[STAGE 2] GATHER AGENT ACTIVATED"),
            log(500, Info, "Querying GitHub API..."),
            log(1500, Info, "Scanning email breach databases..."),
            log(2500, Info, "Checking username registrations..."),
            log(3200, Info, "Crawling public profiles..."),
            log(3800, Success, "Data collection complete"),
        ],
        statuses: &[
            status(200, Source::GitHub, Scanning),
            status(1200, Source::GitHub, Complete),
            status(1000, Source::EmailServices, Scanning),
            status(2200, Source::EmailServices, Complete),
            status(2000, Source::TwitterX, Scanning),
            status(3000, Source::TwitterX, Complete),
            status(2500, Source::LinkedIn, Scanning),
            status(3400, Source::LinkedIn, Complete),
            status(3000, Source::PublicWeb, Scanning),
            status(3800, Source::PublicWeb, Complete),
        ],
    },
    StagePlan {
        stage: Stage::Generate,
        duration_ms: 3000,
        logs: &[
            log(0, Info, "[STAGE 3] GENERATE AGENT ACTIVATED"),
            log(600, Info, "Correlating data points..."),
            log(1400, Info, "Identifying exposure patterns..."),
            log(2200, Info, "Calculating risk vectors..."),
            log(2800, Success, "Risk analysis generated"),
        ],
        statuses: &[],
    },
    StagePlan {
        stage: Stage::Evaluate,
        duration_ms: 2500,
        logs: &[
            log(0, Info, "[STAGE 4] EVALUATE AGENT ACTIVATED"),
            log(500, Info, "Scoring vulnerability severity..."),
            log(1200, Info, "Prioritizing risk factors..."),
            log(1800, Info, "Generating mitigation steps..."),
            log(2200, Info, "Compiling final report..."),
        ],
        statuses: &[],
    },
];

/// One step of the timeline as seen by the callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEvent {
    StageEntered(Stage),
    Log { severity: Severity, message: &'static str },
    Status { source: Source, status: SourceStatus },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineOutcome {
    Finished,
    Cancelled,
}

/// A plan plus a pace factor: 1.0 plays in real time, 0.5 twice as fast, 0.0 instantly.
#[derive(Debug, Clone, Copy)]
pub struct Timeline {
    plan: &'static [StagePlan],
    pace: f64,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl Timeline {
    pub fn standard() -> Self {
        Self::new(&STANDARD_PLAN)
    }

    pub fn new(plan: &'static [StagePlan]) -> Self {
        Self { plan, pace: 1.0 }
    }

    pub fn with_pace(mut self, pace: f64) -> Self {
        self.pace = if pace.is_finite() { pace.max(0.0) } else { 1.0 };
        self
    }

    /// Wall-clock length of a full run at the configured pace.
    pub fn total_duration(&self) -> Duration {
        self.plan
            .iter()
            .map(|s| self.scaled(s.duration_ms))
            .sum()
    }

    fn scaled(&self, ms: u64) -> Duration {
        Duration::from_nanos((ms as f64 * 1_000_000.0 * self.pace).round() as u64)
    }

    /// Replay the plan, invoking `on_event` for each step in order.
    ///
    /// Within a stage, effects fire in offset order; logs go before status changes that
    /// share an offset. Each stage then waits out its full duration before the next one
    /// is entered. Returns early once `cancel` fires.
    pub async fn run<F, Fut>(&self, cancel: CancellationToken, mut on_event: F) -> TimelineOutcome
    where
        F: FnMut(TimelineEvent) -> Fut,
        Fut: Future<Output = ()>,
    {
        for plan in self.plan {
            if cancel.is_cancelled() {
                return TimelineOutcome::Cancelled;
            }
            debug!(stage = plan.stage.name(), "timeline stage entered");
            let stage_start = Instant::now();
            on_event(TimelineEvent::StageEntered(plan.stage)).await;

            for (at_ms, event) in stage_events(plan) {
                if !sleep_until(&cancel, stage_start + self.scaled(at_ms)).await {
                    return TimelineOutcome::Cancelled;
                }
                on_event(event).await;
            }

            if !sleep_until(&cancel, stage_start + self.scaled(plan.duration_ms)).await {
                return TimelineOutcome::Cancelled;
            }
        }
        TimelineOutcome::Finished
    }
}

fn stage_events(plan: &StagePlan) -> Vec<(u64, TimelineEvent)> {
    let mut events: Vec<(u64, TimelineEvent)> = plan
        .logs
        .iter()
        .map(|l| {
            (
                l.at_ms,
                TimelineEvent::Log { severity: l.severity, message: l.message },
            )
        })
        .chain(plan.statuses.iter().map(|s| {
            (
                s.at_ms,
                TimelineEvent::Status { source: s.source, status: s.status },
            )
        }))
        .collect();
    // Stable: table order is kept for equal offsets.
    events.sort_by_key(|(at, _)| *at);
    events
}

/// Sleep until `deadline`; false when cancelled first.
async fn sleep_until(cancel: &CancellationToken, deadline: Instant) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = time::sleep_until(deadline) => true,
    }
}
