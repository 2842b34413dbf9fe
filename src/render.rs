//! View components. Every function here is a pure mapping from the data model to a view
//! model; the web UI consumes the models as JSON and the CLI prints them via `Display`.

use std::fmt;

use serde::Serialize;

use crate::timeline::Stage;
use crate::types::{LogEntry, ScanResult, ScanSnapshot, Severity, Source, SourceStatus, ViewState};

pub const DEFAULT_MAX_SCORE: u32 = 100;
pub const NO_RISKS: &str = "No significant risks detected";
pub const NO_MITIGATIONS: &str = "No specific mitigations recommended";

/// Color role of a rendered element.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Muted,
    Primary,
    Success,
    Warning,
    Destructive,
}

impl Tone {
    fn ansi(self) -> &'static str {
        match self {
            Tone::Muted => "\x1b[90m",
            Tone::Primary => "\x1b[96m",
            Tone::Success => "\x1b[92m",
            Tone::Warning => "\x1b[93m",
            Tone::Destructive => "\x1b[91m",
        }
    }
}

const RESET: &str = "\x1b[0m";

struct Painted<'a>(Tone, &'a str);

impl fmt::Display for Painted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.0.ansi(), self.1, RESET)
    }
}

// ---------------------------------------------------------------------------
// Source badge

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceBadge {
    pub name: &'static str,
    pub icon: &'static str,
    pub status: SourceStatus,
    pub tone: Tone,
    pub label: &'static str,
}

pub fn source_badge(source: Source, status: SourceStatus) -> SourceBadge {
    let (tone, label) = match status {
        SourceStatus::Pending => (Tone::Muted, "Pending"),
        SourceStatus::Scanning => (Tone::Primary, "Scanning..."),
        SourceStatus::Complete => (Tone::Success, "Complete"),
        SourceStatus::Error => (Tone::Destructive, "Error"),
    };
    SourceBadge {
        name: source.name(),
        icon: source.icon(),
        status,
        tone,
        label,
    }
}

impl fmt::Display for SourceBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:>3}] {:<15} {}",
            self.icon,
            self.name,
            Painted(self.tone, self.label)
        )
    }
}

// ---------------------------------------------------------------------------
// Gauge

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn label(self) -> &'static str {
        match self {
            RiskBand::Low => "LOW",
            RiskBand::Medium => "MEDIUM",
            RiskBand::High => "HIGH",
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            RiskBand::Low => Tone::Success,
            RiskBand::Medium => Tone::Warning,
            RiskBand::High => Tone::Destructive,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Gauge {
    pub score: u32,
    pub max_score: u32,
    pub percentage: f64,
    /// Needle angle in degrees: -90 at zero, +90 at max.
    pub rotation_deg: f64,
    /// Filled length of the 251-unit arc.
    pub arc_dash: f64,
    pub band: RiskBand,
    pub tone: Tone,
}

impl Gauge {
    /// `score/max` as shown under the needle.
    pub fn display(&self) -> String {
        format!("{}/{}", self.score, self.max_score)
    }
}

pub fn gauge(score: u32, max_score: u32) -> Gauge {
    let percentage = if max_score == 0 {
        0.0
    } else {
        f64::from(score) * 100.0 / f64::from(max_score)
    };
    let band = if percentage <= 30.0 {
        RiskBand::Low
    } else if percentage <= 60.0 {
        RiskBand::Medium
    } else {
        RiskBand::High
    };
    Gauge {
        score,
        max_score,
        percentage,
        rotation_deg: percentage / 100.0 * 180.0 - 90.0,
        arc_dash: percentage * 2.51,
        band,
        tone: band.tone(),
    }
}

impl fmt::Display for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const WIDTH: usize = 30;
        let filled = ((self.percentage.clamp(0.0, 100.0) / 100.0) * WIDTH as f64).round() as usize;
        let bar = format!("{}{}", "#".repeat(filled), "-".repeat(WIDTH - filled));
        write!(
            f,
            "[{}] {}  {}",
            Painted(self.tone, &bar),
            self.display(),
            Painted(self.tone, &format!("{} RISK", self.band.label()))
        )
    }
}

// ---------------------------------------------------------------------------
// Stage tracker

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    Completed,
    Current,
    Pending,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StageMarker {
    pub stage: Stage,
    pub name: &'static str,
    pub state: StageState,
    /// Whether the connector leading to the next stage is lit.
    pub connector_lit: bool,
}

pub fn stage_track(current: usize) -> Vec<StageMarker> {
    Stage::ALL
        .iter()
        .map(|&stage| {
            let i = stage.index();
            let state = match i.cmp(&current) {
                std::cmp::Ordering::Less => StageState::Completed,
                std::cmp::Ordering::Equal => StageState::Current,
                std::cmp::Ordering::Greater => StageState::Pending,
            };
            StageMarker {
                stage,
                name: stage.name(),
                state,
                connector_lit: i + 1 < Stage::ALL.len() && i < current,
            }
        })
        .collect()
}

/// Terminal rendering of a stage track.
pub struct StageTrack<'a>(pub &'a [StageMarker]);

impl fmt::Display for StageTrack<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, m) in self.0.iter().enumerate() {
            let (tone, mark) = match m.state {
                StageState::Completed => (Tone::Success, "[x]"),
                StageState::Current => (Tone::Primary, "[>]"),
                StageState::Pending => (Tone::Muted, "[ ]"),
            };
            write!(f, "{}", Painted(tone, &format!("{mark} {}", m.name.to_uppercase())))?;
            if i + 1 < self.0.len() {
                let tone = if m.connector_lit { Tone::Success } else { Tone::Muted };
                write!(f, " {} ", Painted(tone, "──"))?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Log panel

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogLine {
    pub timestamp: String,
    pub tag: &'static str,
    pub tone: Tone,
    pub message: String,
}

pub fn severity_tone(severity: Severity) -> Tone {
    match severity {
        Severity::Info => Tone::Primary,
        Severity::Success => Tone::Success,
        Severity::Warning => Tone::Warning,
        Severity::Error => Tone::Destructive,
    }
}

pub fn log_line(entry: &LogEntry) -> LogLine {
    LogLine {
        timestamp: entry.timestamp.clone(),
        tag: entry.severity.tag(),
        tone: severity_tone(entry.severity),
        message: entry.message.clone(),
    }
}

pub fn log_panel(logs: &[LogEntry]) -> Vec<LogLine> {
    logs.iter().map(log_line).collect()
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            Painted(Tone::Muted, &format!("[{}]", self.timestamp)),
            Painted(self.tone, &format!("[{}]", self.tag)),
            self.message
        )
    }
}

// ---------------------------------------------------------------------------
// Report rows

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    Recommended,
    Optional,
}

impl Priority {
    pub fn tone(self) -> Tone {
        match self {
            Priority::Critical => Tone::Destructive,
            Priority::Recommended => Tone::Warning,
            Priority::Optional => Tone::Success,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::Recommended => "RECOMMENDED",
            Priority::Optional => "OPTIONAL",
        }
    }
}

/// The first mitigation is critical, the rest recommended.
pub fn priority_for(index: usize) -> Priority {
    if index == 0 {
        Priority::Critical
    } else {
        Priority::Recommended
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MitigationRow {
    pub step: usize,
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

pub fn mitigation_row(index: usize, title: &str, description: &str, priority: Priority) -> MitigationRow {
    MitigationRow {
        step: index + 1,
        title: title.to_string(),
        description: description.to_string(),
        priority,
    }
}

pub fn mitigation_rows(mitigations: &[String]) -> Vec<MitigationRow> {
    mitigations
        .iter()
        .enumerate()
        .map(|(i, m)| mitigation_row(i, m, m, priority_for(i)))
        .collect()
}

impl fmt::Display for MitigationRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>2}. {} {}",
            self.step,
            Painted(self.priority.tone(), &format!("[{}]", self.priority.label())),
            self.title
        )?;
        if self.description != self.title {
            write!(f, "\n    {}", Painted(Tone::Muted, &self.description))?;
        }
        Ok(())
    }
}

/// A plain card row: a risk factor, or a muted placeholder when the list is empty.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardRow {
    pub text: String,
    pub tone: Tone,
}

fn card_rows(items: &[String], placeholder: &str) -> (Vec<CardRow>, Option<CardRow>) {
    let rows = items
        .iter()
        .map(|t| CardRow { text: t.clone(), tone: Tone::Primary })
        .collect();
    let empty = items.is_empty().then(|| CardRow {
        text: placeholder.to_string(),
        tone: Tone::Muted,
    });
    (rows, empty)
}

pub fn risk_level_tone(level: &str) -> Tone {
    match level {
        "High" => Tone::Destructive,
        "Medium" => Tone::Warning,
        _ => Tone::Success,
    }
}

// ---------------------------------------------------------------------------
// Screens

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanningView {
    pub stages: Vec<StageMarker>,
    pub sources: Vec<SourceBadge>,
    pub logs: Vec<LogLine>,
}

pub fn scanning_view(snapshot: &ScanSnapshot) -> ScanningView {
    ScanningView {
        stages: stage_track(snapshot.current_stage),
        sources: Source::ALL
            .iter()
            .map(|&s| source_badge(s, snapshot.status_of(s)))
            .collect(),
        logs: log_panel(&snapshot.logs),
    }
}

impl fmt::Display for ScanningView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", StageTrack(&self.stages))?;
        writeln!(f)?;
        writeln!(f, "DATA SOURCES")?;
        for badge in &self.sources {
            writeln!(f, "  {badge}")?;
        }
        writeln!(f)?;
        writeln!(f, "AGENT LOGS")?;
        for line in &self.logs {
            writeln!(f, "  {line}")?;
        }
        Ok(())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub gauge: Gauge,
    pub risk_level: String,
    pub risk_level_tone: Tone,
    pub risk_factors: Vec<CardRow>,
    pub no_risk_factors: Option<CardRow>,
    pub mitigations: Vec<MitigationRow>,
    pub no_mitigations: Option<CardRow>,
}

pub fn report_view(result: &ScanResult) -> ReportView {
    let (risk_factors, no_risk_factors) = card_rows(&result.risk_factors, NO_RISKS);
    let mitigations = mitigation_rows(&result.mitigations);
    let no_mitigations = mitigations.is_empty().then(|| CardRow {
        text: NO_MITIGATIONS.to_string(),
        tone: Tone::Muted,
    });
    ReportView {
        gauge: gauge(result.risk_score, DEFAULT_MAX_SCORE),
        risk_level: result.risk_level.clone(),
        risk_level_tone: risk_level_tone(&result.risk_level),
        risk_factors,
        no_risk_factors,
        mitigations,
        no_mitigations,
    }
}

impl fmt::Display for ReportView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "OVERALL RISK SCORE")?;
        writeln!(f, "  {}", self.gauge)?;
        writeln!(
            f,
            "  Risk Level: {}",
            Painted(self.risk_level_tone, &self.risk_level)
        )?;
        writeln!(f)?;
        writeln!(f, "IDENTIFIED RISK FACTORS")?;
        for row in self.risk_factors.iter().chain(&self.no_risk_factors) {
            writeln!(f, "  - {}", Painted(row.tone, &row.text))?;
        }
        writeln!(f)?;
        writeln!(f, "RECOMMENDED MITIGATION STEPS")?;
        for row in &self.mitigations {
            writeln!(f, "  {row}")?;
        }
        if let Some(row) = &self.no_mitigations {
            writeln!(f, "  {}", Painted(row.tone, &row.text))?;
        }
        Ok(())
    }
}

/// What the current view state puts on screen.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum Screen {
    Input,
    Scanning(ScanningView),
    Results(ReportView),
}

pub fn screen(snapshot: &ScanSnapshot) -> Screen {
    match (snapshot.view, &snapshot.result) {
        (ViewState::Input, _) => Screen::Input,
        (ViewState::Results, Some(result)) => Screen::Results(report_view(result)),
        // A results view without a result never happens; show progress instead.
        (ViewState::Scanning, _) | (ViewState::Results, None) => {
            Screen::Scanning(scanning_view(snapshot))
        }
    }
}
