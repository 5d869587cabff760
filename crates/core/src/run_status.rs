//! Well-known run status constants.
//!
//! These must match the values the executor writes to `runs.status`.

/// Submitted and waiting for a worker.
pub const RUN_QUEUED: &str = "queued";

/// A worker is executing the run; `current_stage` is authoritative.
pub const RUN_RUNNING: &str = "running";

/// Waiting to be picked up again after a technical failure.
pub const RUN_RETRY_QUEUED: &str = "retry_queued";

/// Finished with an attempt that met the quality threshold.
pub const RUN_COMPLETED_PASS: &str = "completed_pass";

/// Finished after exhausting attempts without meeting the threshold.
pub const RUN_COMPLETED_FAIL_THRESHOLD: &str = "completed_fail_threshold";

/// Aborted by a non-recoverable technical error.
pub const RUN_FAILED_TECHNICAL: &str = "failed_technical";

/// Returns `true` if the run finished without a passing result.
pub fn is_unsuccessful_terminal(status: &str) -> bool {
    matches!(status, RUN_COMPLETED_FAIL_THRESHOLD | RUN_FAILED_TECHNICAL)
}
