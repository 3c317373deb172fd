//! Runtime environment errors

use super::RunnerError;

/// Collapses every preflight problem into one error so all of them are reported at once
pub fn preflight_failed(problems: &[String]) -> RunnerError {
    RunnerError::PreflightFailed {
        problems: problems.join("; "),
    }
}
