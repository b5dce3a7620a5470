//! Usage tracking for dispatched provider calls.
//!
//! Every tracked call appends exactly one [`UsageRecord`]. Summaries are
//! recomputed from the full record list on each request.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Number of failing records kept in [`UsageSummary::recent_errors`].
pub const RECENT_ERRORS: usize = 10;

/// One dispatched provider call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub provider: String,
    pub model: String,
    pub tool: String,
    /// When the call started
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate over every record of one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderUsageSummary {
    pub provider: String,
    pub total_requests: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub avg_duration_ms: u64,
    pub last_used: Option<DateTime<Utc>>,
    pub models: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub uptime_ms: u64,
    pub total_requests: u64,
    pub providers: Vec<ProviderUsageSummary>,
    pub recent_errors: Vec<UsageRecord>,
}

/// Process-local, append-only usage log.
pub struct UsageTracker {
    records: Mutex<Vec<UsageRecord>>,
    started: Instant,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            started: Instant::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UsageRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a record as-is.
    pub fn record(&self, entry: UsageRecord) {
        self.lock().push(entry);
    }

    /// Time `operation`, record its outcome, and return it unchanged.
    pub async fn track<T, Fut>(&self, provider: &str, model: &str, tool: &str, operation: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let timestamp = Utc::now();
        let start = Instant::now();
        let result = operation.await;
        let duration_ms = start.elapsed().as_millis() as u64;

        self.record(UsageRecord {
            provider: provider.to_string(),
            model: model.to_string(),
            tool: tool.to_string(),
            timestamp,
            duration_ms,
            success: result.is_ok(),
            error: result.as_ref().err().map(|e| e.to_string()),
        });

        result
    }

    /// Snapshot of every record in emission order.
    pub fn records(&self) -> Vec<UsageRecord> {
        self.lock().clone()
    }

    /// Aggregate the current records. Providers appear in first-seen order.
    pub fn get_summary(&self) -> UsageSummary {
        let records = self.lock();

        let mut order: Vec<&str> = Vec::new();
        let mut by_provider: HashMap<&str, Vec<&UsageRecord>> = HashMap::new();
        for r in records.iter() {
            by_provider
                .entry(r.provider.as_str())
                .or_insert_with(|| {
                    order.push(r.provider.as_str());
                    Vec::new()
                })
                .push(r);
        }

        let providers = order
            .iter()
            .filter_map(|name| by_provider.get(name).map(|list| summarize(name, list)))
            .collect();

        let failures: Vec<&UsageRecord> = records.iter().filter(|r| !r.success).collect();
        let skip = failures.len().saturating_sub(RECENT_ERRORS);
        let recent_errors = failures[skip..].iter().map(|r| (*r).clone()).collect();

        UsageSummary {
            uptime_ms: self.started.elapsed().as_millis() as u64,
            total_requests: records.len() as u64,
            providers,
            recent_errors,
        }
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize(provider: &str, records: &[&UsageRecord]) -> ProviderUsageSummary {
    let total = records.len() as u64;
    let success_count = records.iter().filter(|r| r.success).count() as u64;
    let total_duration: u64 = records.iter().map(|r| r.duration_ms).sum();

    let mut models = BTreeMap::new();
    for r in records {
        *models.entry(r.model.clone()).or_insert(0) += 1;
    }

    let avg_duration_ms = if total > 0 {
        (total_duration as f64 / total as f64).round() as u64
    } else {
        0
    };

    ProviderUsageSummary {
        provider: provider.to_string(),
        total_requests: total,
        success_count,
        error_count: total - success_count,
        avg_duration_ms,
        last_used: records.last().map(|r| r.timestamp),
        models,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn entry(provider: &str, model: &str, duration_ms: u64, success: bool) -> UsageRecord {
        UsageRecord {
            provider: provider.to_string(),
            model: model.to_string(),
            tool: "ai_chat".to_string(),
            timestamp: Utc::now(),
            duration_ms,
            success,
            error: (!success).then(|| format!("failed after {duration_ms}ms")),
        }
    }

    #[tokio::test]
    async fn test_track_success_and_failure() {
        let tracker = UsageTracker::new();

        let ok = tracker
            .track("gemini", "gemini-2.5-pro", "ai_chat", async { Ok("hi") })
            .await
            .unwrap();
        assert_eq!(ok, "hi");
        assert_eq!(tracker.get_summary().total_requests, 1);

        let err = tracker
            .track::<(), _>("gemini", "gemini-2.5-pro", "ai_chat", async {
                Err(Error::Timeout(50))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(50)));

        let records = tracker.records();
        assert_eq!(records.len(), 2);
        assert!(records[0].success);
        assert!(!records[1].success);
        assert_eq!(records[1].error.as_deref(), Some("Request timeout after 50ms"));
    }

    #[test]
    fn test_average_is_per_provider() {
        let tracker = UsageTracker::new();
        tracker.record(entry("claude", "sonnet", 100, true));
        tracker.record(entry("openai", "gpt-4o", 5000, true));
        tracker.record(entry("claude", "haiku", 300, false));

        let summary = tracker.get_summary();
        assert_eq!(summary.total_requests, 3);
        assert_eq!(summary.providers[0].provider, "claude");
        assert_eq!(summary.providers[1].provider, "openai");

        let claude = &summary.providers[0];
        assert_eq!(claude.avg_duration_ms, 200);
        assert_eq!(claude.success_count + claude.error_count, claude.total_requests);
        assert_eq!(claude.models.get("sonnet"), Some(&1));
        assert_eq!(claude.models.get("haiku"), Some(&1));
    }

    #[test]
    fn test_average_rounds() {
        let tracker = UsageTracker::new();
        tracker.record(entry("gemini", "m", 1, true));
        tracker.record(entry("gemini", "m", 2, true));
        assert_eq!(tracker.get_summary().providers[0].avg_duration_ms, 2);
    }

    #[test]
    fn test_recent_errors_capped_in_order() {
        let tracker = UsageTracker::new();
        for i in 0..50 {
            tracker.record(entry("copilot", "gpt-4", i, false));
            tracker.record(entry("copilot", "gpt-4", 1000 + i, true));
        }

        let summary = tracker.get_summary();
        assert_eq!(summary.recent_errors.len(), RECENT_ERRORS);
        let durations: Vec<u64> = summary.recent_errors.iter().map(|r| r.duration_ms).collect();
        assert_eq!(durations, (40..50).collect::<Vec<u64>>());
    }

    #[test]
    fn test_last_used_is_latest_record() {
        let tracker = UsageTracker::new();
        let first = entry("gemini", "m", 1, true);
        let mut second = entry("gemini", "m", 1, true);
        second.timestamp = first.timestamp + chrono::Duration::seconds(5);
        let expected = second.timestamp;
        tracker.record(first);
        tracker.record(second);

        assert_eq!(tracker.get_summary().providers[0].last_used, Some(expected));
    }
}
