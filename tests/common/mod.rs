#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use footprint_guard::api::{ScanApi, ScanError};
use footprint_guard::types::{ScanRequest, ScanResult};

/// Scan API double: answers after `delay` and counts calls.
pub struct FakeApi {
    pub calls: AtomicUsize,
    pub delay: Duration,
    pub fail_with: Option<(u16, String)>,
    pub result: ScanResult,
}

impl FakeApi {
    pub fn ok(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
            fail_with: None,
            result: sample_result(),
        })
    }

    pub fn failing(delay: Duration, status: u16, detail: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
            fail_with: Some((status, detail.to_string())),
            result: sample_result(),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScanApi for FakeApi {
    async fn scan(&self, _request: &ScanRequest) -> Result<ScanResult, ScanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        match &self.fail_with {
            Some((status, detail)) => Err(ScanError::Status {
                status: *status,
                detail: detail.clone(),
            }),
            None => Ok(self.result.clone()),
        }
    }
}

pub fn sample_result() -> ScanResult {
    serde_json::from_value(serde_json::json!({
        "riskScore": 67,
        "riskLevel": "Medium",
        "riskFactors": ["a"],
        "mitigations": ["b", "c"],
        "evidence": {},
        "timestamp": "2026-10-18T12:00:00"
    }))
    .expect("sample result parses")
}

pub fn email_only() -> ScanRequest {
    ScanRequest {
        email: Some("someone@example.com".into()),
        ..Default::default()
    }
}
