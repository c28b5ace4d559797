//! Aggregate verdicts and diagnostics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::navigation::NavigationRecord;
use crate::schema::{SelectorSpec, ValidationResult};

/// One failing item, in original input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    /// Zero-based position in the input list
    pub index: usize,
    /// Selector as proposed by the planner
    pub selector: String,
    /// Planner-supplied purpose, may be empty
    pub purpose: String,
    /// Classification string of the recorded failure
    pub error: String,
    /// Page URL at the moment of probing
    pub current_url: String,
}

/// Aggregate outcome of a full ordered run.
///
/// Computed once at the end of a run, immutable, never updated
/// incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Unique id for this run
    pub run_id: Uuid,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Number of specs probed
    pub total_selectors: usize,
    /// Number of specs whose every applicable check passed
    pub successful_selectors: usize,
    /// Number of specs that failed
    pub failed_selectors: usize,
    /// `failed / total * 100`, 0 for an empty run
    pub failure_rate: f64,
    /// Failing items in original order
    pub failed_details: Vec<FailureDetail>,
    /// Batch verdict against the configured tolerance
    pub passed: bool,
    /// URL transitions observed between steps
    #[serde(default)]
    pub navigations: Vec<NavigationRecord>,
}

impl ValidationReport {
    /// Bounded diagnostic line: up to `limit` failing items' purpose and
    /// error text, with the remainder counted rather than dumped.
    #[must_use]
    pub fn failure_summary(&self, limit: usize) -> String {
        let shown = self
            .failed_details
            .iter()
            .take(limit)
            .map(|detail| {
                let label = if detail.purpose.is_empty() {
                    detail.selector.as_str()
                } else {
                    detail.purpose.as_str()
                };
                format!("{label}: {}", detail.error)
            })
            .collect::<Vec<_>>()
            .join("; ");
        let hidden = self.failed_selectors.saturating_sub(limit);
        if hidden > 0 {
            format!("{shown} (+{hidden} more)")
        } else {
            shown
        }
    }
}

/// Pure reduction of per-item results into a report.
///
/// `max_failure_rate` is a percentage; 0.0 keeps the strict
/// any-failure-fails-the-batch behavior.
#[must_use]
pub fn aggregate(
    specs: &[SelectorSpec],
    results: &[ValidationResult],
    max_failure_rate: f64,
) -> ValidationReport {
    let total = results.len();
    let successful = results.iter().filter(|result| result.success).count();
    let failed = total - successful;
    let failure_rate = if total == 0 {
        0.0
    } else {
        failed as f64 / total as f64 * 100.0
    };

    let failed_details = specs
        .iter()
        .zip(results)
        .enumerate()
        .filter(|(_, (_, result))| !result.success)
        .map(|(index, (spec, result))| FailureDetail {
            index,
            selector: spec.selector.clone(),
            purpose: spec.purpose.clone(),
            error: result
                .error
                .as_ref()
                .map_or_else(|| "unknown failure".to_string(), ToString::to_string),
            current_url: result.current_url.clone(),
        })
        .collect();

    ValidationReport {
        run_id: Uuid::new_v4(),
        finished_at: Utc::now(),
        total_selectors: total,
        successful_selectors: successful,
        failed_selectors: failed,
        failure_rate,
        failed_details,
        passed: failure_rate <= max_failure_rate,
        navigations: Vec::new(),
    }
}
