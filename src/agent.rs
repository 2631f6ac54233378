use std::fmt;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::domain::{AgentRun, RunStatus};
use crate::gateway::{AgentGateway, GatewayError};

/// Default wall-clock budget for one agent run.
pub const DEFAULT_RUN_BUDGET: Duration = Duration::from_secs(120);

/// Keeps the run log for the background agent. Runs are appended
/// best-effort: a persistence failure is logged, never surfaced, so an
/// unrecordable run can never break the job that just finished.
pub struct AgentStore {
    gateway: Box<dyn AgentGateway>,
    runs: Vec<AgentRun>,
}

impl AgentStore {
    pub fn new(gateway: Box<dyn AgentGateway>) -> Self {
        Self {
            gateway,
            runs: Vec::new(),
        }
    }

    pub fn runs(&self) -> &[AgentRun] {
        &self.runs
    }

    pub fn load(&mut self) -> Result<(), GatewayError> {
        self.runs = self.gateway.fetch_runs()?;
        Ok(())
    }

    /// Executes one agent job under a wall-clock budget and records the
    /// outcome. The job runs on a worker thread and the wait is bounded: if
    /// no result arrives inside the budget the run is recorded TimedOut and
    /// the caller moves on, leaving the worker to finish (or hang) on its
    /// own. A job error records Failed with the error text.
    pub fn record_run<F, E>(&mut self, trigger: &str, budget: Duration, job: F) -> RunStatus
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let outcome = job().map_err(|err| err.to_string());
            let _ = sender.send(outcome);
        });

        let run = match receiver.recv_timeout(budget) {
            Ok(Ok(())) => AgentRun::record(RunStatus::Succeeded, trigger),
            Ok(Err(detail)) => {
                let mut failed = AgentRun::record(RunStatus::Failed, trigger);
                failed.detail = Some(detail);
                failed
            }
            Err(_) => {
                let mut timed_out = AgentRun::record(RunStatus::TimedOut, trigger);
                timed_out.detail = Some(format!("no result within {}ms", budget.as_millis()));
                timed_out
            }
        };

        let status = run.status;
        if let Err(err) = self.gateway.append_run(&run) {
            log::warn!("agent run not recorded: {}", err);
        }
        self.runs.insert(0, run);
        status
    }

    /// Fires the daily agent trigger under the default budget.
    pub fn trigger_daily_run<F, E>(&mut self, transport: F) -> RunStatus
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        self.record_run("daily", DEFAULT_RUN_BUDGET, transport)
    }
}
