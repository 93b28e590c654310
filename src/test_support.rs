//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::core::failure::{Failure, FailureKind, Outcome};
use crate::core::use_case::UseCase;
use crate::data::fault::DataFault;
use crate::data::source::DataSource;

/// Echoes a label back after sleeping for the given number of milliseconds.
pub struct DelayedEcho;

#[async_trait]
impl UseCase for DelayedEcho {
    type Input = (String, u64);
    type Output = String;

    fn name(&self) -> &str {
        "delayed-echo"
    }

    async fn execute(&self, (label, delay_ms): Self::Input) -> Outcome<String> {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        Ok(label)
    }
}

/// One unit of scripted work for `Probe`.
#[derive(Clone)]
pub struct Job {
    pub label: String,
    pub delay: Duration,
    pub gate: Option<Arc<Notify>>,
    pub fail: Option<FailureKind>,
}

impl Job {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            delay: Duration::ZERO,
            gate: None,
            fail: None,
        }
    }

    pub fn delayed(mut self, millis: u64) -> Self {
        self.delay = Duration::from_millis(millis);
        self
    }

    /// Blocks the job until the gate is notified.
    pub fn gated(mut self, gate: &Arc<Notify>) -> Self {
        self.gate = Some(gate.clone());
        self
    }

    pub fn failing(mut self, kind: FailureKind) -> Self {
        self.fail = Some(kind);
        self
    }
}

/// Scripted use case that counts how many executions ran to completion.
#[derive(Default)]
pub struct Probe {
    pub completed: Arc<AtomicUsize>,
}

impl Probe {
    pub fn completed(&self) -> Arc<AtomicUsize> {
        self.completed.clone()
    }
}

#[async_trait]
impl UseCase for Probe {
    type Input = Job;
    type Output = String;

    fn name(&self) -> &str {
        "probe"
    }

    async fn execute(&self, job: Job) -> Outcome<String> {
        if let Some(gate) = &job.gate {
            gate.notified().await;
        }
        if !job.delay.is_zero() {
            tokio::time::sleep(job.delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        match job.fail {
            Some(kind) => Err(Failure::new(kind, job.label)),
            None => Ok(job.label),
        }
    }
}

/// What a `ScriptedSource` does on each fetch.
#[derive(Clone)]
pub enum Script {
    Succeed(String),
    Fault(DataFault),
    Panic,
}

/// Data source that replays a fixed script, one entry per call.
/// The last entry repeats once the script runs out.
pub struct ScriptedSource {
    script: Vec<Script>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(script: Vec<Script>) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for ScriptedSource {
    type Request = String;
    type Response = String;

    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, _request: &String) -> Result<String, DataFault> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .get(call)
            .or_else(|| self.script.last())
            .cloned()
            .unwrap_or(Script::Panic);
        match step {
            Script::Succeed(body) => Ok(body),
            Script::Fault(fault) => Err(fault),
            Script::Panic => panic!("scripted source exploded"),
        }
    }
}
