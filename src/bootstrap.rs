//! Startup orchestration.
//!
//! Startup is an ordered list of [`StartupStep`]s, each tagged fatal or
//! best-effort, executed strictly one after another by [`run_steps`]. The
//! first fatal failure halts the sequence and surfaces as a
//! [`FatalStartupError`]; best-effort failures are logged and skipped so the
//! server still comes up with degraded capability. The policy lives in the
//! step list, not in nested error handling at each call site.

use futures::FutureExt;
use futures::future::BoxFuture;
use thiserror::Error;
use tracing::{info, warn};

/// A single startup action. On success it reports a short human-readable
/// detail line for the log.
pub struct StartupStep {
    name: &'static str,
    fatal: bool,
    action: BoxFuture<'static, anyhow::Result<String>>,
}

impl StartupStep {
    /// A step the process cannot run without.
    pub fn fatal<F>(name: &'static str, action: F) -> Self
    where
        F: Future<Output = anyhow::Result<String>> + Send + 'static,
    {
        Self {
            name,
            fatal: true,
            action: action.boxed(),
        }
    }

    /// A step whose failure degrades the service but must not stop it.
    pub fn best_effort<F>(name: &'static str, action: F) -> Self
    where
        F: Future<Output = anyhow::Result<String>> + Send + 'static,
    {
        Self {
            name,
            fatal: false,
            action: action.boxed(),
        }
    }

    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        self.fatal
    }
}

/// Error produced when a fatal step fails; names the step that died.
#[derive(Debug, Error)]
#[error("startup step `{step}` failed: {source:#}")]
pub struct FatalStartupError {
    pub step: &'static str,
    #[source]
    pub source: anyhow::Error,
}

/// What happened to one step during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub name: &'static str,
    pub succeeded: bool,
}

/// Execute the steps in order.
///
/// Steps never overlap and never reorder. A best-effort failure is logged
/// and recorded, then the next step runs regardless; a fatal failure ends
/// the run immediately and the remaining steps are never polled.
pub async fn run_steps(steps: Vec<StartupStep>) -> Result<Vec<StepOutcome>, FatalStartupError> {
    let mut outcomes = Vec::with_capacity(steps.len());

    for step in steps {
        match step.action.await {
            Ok(detail) => {
                info!("{}: {detail}", step.name);
                outcomes.push(StepOutcome {
                    name: step.name,
                    succeeded: true,
                });
            }
            Err(source) if step.fatal => {
                return Err(FatalStartupError {
                    step: step.name,
                    source,
                });
            }
            Err(err) => {
                warn!("{} failed (continuing without it): {err:#}", step.name);
                outcomes.push(StepOutcome {
                    name: step.name,
                    succeeded: false,
                });
            }
        }
    }

    Ok(outcomes)
}

// ── Tests ────────────────────────────────────────────────────────────
