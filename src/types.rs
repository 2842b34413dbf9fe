use std::collections::BTreeMap;
use std::fmt;

use ::time::{macros::format_description, OffsetDateTime};
use serde::{Deserialize, Serialize};

/// Identifiers submitted for one scan. Empty or whitespace-only fields count as absent.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_handles: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl ScanRequest {
    /// True when at least one identifier field carries a non-blank value.
    pub fn is_submittable(&self) -> bool {
        [
            &self.github_username,
            &self.email,
            &self.social_handles,
            &self.full_name,
        ]
        .into_iter()
        .any(|f| non_blank(f).is_some())
    }

    /// Trimmed copy with blank fields dropped; this is what goes on the wire.
    pub fn normalized(&self) -> Self {
        Self {
            github_username: non_blank(&self.github_username),
            email: non_blank(&self.email),
            social_handles: non_blank(&self.social_handles),
            full_name: non_blank(&self.full_name),
        }
    }
}

fn non_blank(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn tag(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Success => "SUCCESS",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

/// One line of the agent log panel.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: String,
    pub severity: Severity,
    pub message: String,
}

impl LogEntry {
    /// Build an entry stamped with the current wall-clock time.
    pub fn now(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: display_time(OffsetDateTime::now_utc()),
            severity,
            message: message.into(),
        }
    }
}

/// `HH:MM:SS`, 24h.
pub fn display_time(at: OffsetDateTime) -> String {
    at.format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| String::from("00:00:00"))
}

/// The external data providers shown as badges, in display order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    #[serde(rename = "GitHub")]
    GitHub,
    #[serde(rename = "Email Services")]
    EmailServices,
    #[serde(rename = "LinkedIn")]
    LinkedIn,
    #[serde(rename = "Twitter/X")]
    TwitterX,
    #[serde(rename = "Public Web")]
    PublicWeb,
}

impl Source {
    pub const ALL: [Source; 5] = [
        Source::GitHub,
        Source::EmailServices,
        Source::LinkedIn,
        Source::TwitterX,
        Source::PublicWeb,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Source::GitHub => "GitHub",
            Source::EmailServices => "Email Services",
            Source::LinkedIn => "LinkedIn",
            Source::TwitterX => "Twitter/X",
            Source::PublicWeb => "Public Web",
        }
    }

    /// Short glyph used in terminal output in place of the web UI icon.
    pub fn icon(self) -> &'static str {
        match self {
            Source::GitHub => "gh",
            Source::EmailServices => "@",
            Source::LinkedIn => "in",
            Source::TwitterX => "x",
            Source::PublicWeb => "www",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    #[default]
    Pending,
    Scanning,
    Complete,
    Error,
}

pub type SourceStatuses = BTreeMap<Source, SourceStatus>;

/// Every known source set to the same status.
pub fn uniform_statuses(status: SourceStatus) -> SourceStatuses {
    Source::ALL.iter().map(|&s| (s, status)).collect()
}

/// Risk report returned by the scan API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub risk_score: u32,
    pub risk_level: String,
    pub risk_factors: Vec<String>,
    pub mitigations: Vec<String>,
    #[serde(default)]
    pub evidence: serde_json::Map<String, serde_json::Value>,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewState {
    #[default]
    Input,
    Scanning,
    Results,
}

/// Observable controller state: what the log panel, badges, tracker and report show.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanSnapshot {
    pub view: ViewState,
    pub current_stage: usize,
    pub logs: Vec<LogEntry>,
    pub sources: SourceStatuses,
    pub result: Option<ScanResult>,
}

impl ScanSnapshot {
    /// Status of a source; sources missing from the mapping are pending.
    pub fn status_of(&self, source: Source) -> SourceStatus {
        self.sources.get(&source).copied().unwrap_or_default()
    }
}
