//! Per-request instrumentation types: stage timings and partial-failure
//! bookkeeping, plus the shared regulation-id normal form.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Stage-by-stage latency map threaded through the orchestrator and
/// returned to the caller in the response envelope's `timing` field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestTiming {
    stages: Vec<(String, Duration)>,
}

impl RequestTiming {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stage: impl Into<String>, elapsed: Duration) {
        self.stages.push((stage.into(), elapsed));
    }

    pub fn total(&self) -> Duration {
        self.stages.iter().map(|(_, d)| *d).sum()
    }

    pub fn as_millis_map(&self) -> std::collections::HashMap<String, u128> {
        self.stages
            .iter()
            .map(|(name, d)| (name.clone(), d.as_millis()))
            .collect()
    }
}

/// Which retrieval leg(s) failed during a single `retrieve` call, and why.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialFailure {
    pub failed_legs: Vec<String>,
    pub messages: Vec<String>,
}

impl PartialFailure {
    pub fn is_empty(&self) -> bool {
        self.failed_legs.is_empty()
    }

    pub fn record(&mut self, leg: impl Into<String>, message: impl Into<String>) {
        self.failed_legs.push(leg.into());
        self.messages.push(message.into());
    }
}

/// Normalised `{document, chapter/part/regulation/paragraph}` identity
/// shared by the classifier's override rule, the retriever's
/// keyword-strategy detector, and the generator's citation regex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegulationId {
    pub document: String,
    pub locator: String,
}

impl RegulationId {
    pub fn new(document: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            locator: locator.into(),
        }
    }

    /// Canonical `[Document Locator]` citation form.
    pub fn citation(&self) -> String {
        format!("[{} {}]", self.document, self.locator)
    }
}

impl std::fmt::Display for RegulationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.document, self.locator)
    }
}
