//! Coordinator - lifecycle of one validation run
//!
//! Called from the host pipeline's control thread:
//! - `notify_kind` at startup for every configured kind
//! - `on_snippet_encountered` for every fenced block
//! - `on_document_boundary` between documents (non-blocking checkpoint)
//! - `on_run_complete` once at the end (blocking checkpoint + shutdown)
//!
//! Failures are always reported in the order their validations were
//! requested.

use super::cache::ValidationCache;
use super::dispatcher::Dispatcher;
use super::handle::Resolution;
use super::result_queue::{PendingEntry, ResultQueue};
use crate::config::EngineConfig;
use crate::domain::snippet;
use crate::domain::{
    DocumentId, EngineState, KindConfig, KindId, Snippet, ValidationFailure, ValidationRequest,
};
use crate::error::{AppError, Result};
use crate::port::{FailureReporter, ProcessRunner};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Validation engine entry point for the host pipeline
pub struct Coordinator {
    kinds: HashMap<KindId, KindConfig>,
    enabled: bool,
    drain_timeout: Duration,
    cache: Arc<ValidationCache>,
    dispatcher: Dispatcher,
    queue: ResultQueue,
    reporter: Arc<dyn FailureReporter>,
    state: EngineState,
    failures: usize,
}

impl Coordinator {
    /// Create a coordinator and start its worker pool
    ///
    /// `enabled` is the already-resolved switch; see `from_config` for
    /// resolution through the environment.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn new(
        config: &EngineConfig,
        enabled: bool,
        runner: Arc<dyn ProcessRunner>,
        reporter: Arc<dyn FailureReporter>,
    ) -> Self {
        let cache = Arc::new(ValidationCache::new());
        let dispatcher = Dispatcher::start(runner, Arc::clone(&cache), config.workers);

        let mut coordinator = Self {
            kinds: HashMap::new(),
            enabled,
            drain_timeout: config.drain_timeout,
            cache,
            dispatcher,
            queue: ResultQueue::new(),
            reporter,
            state: EngineState::Idle,
            failures: 0,
        };
        for (kind, kind_config) in &config.kinds {
            coordinator.notify_kind(kind.clone(), kind_config.clone());
        }

        info!(
            enabled,
            kinds = coordinator.kinds.len(),
            workers = config.workers,
            "Validation engine ready"
        );
        coordinator
    }

    /// Create a coordinator, resolving `enabled` against the environment
    pub fn from_config(
        config: &EngineConfig,
        runner: Arc<dyn ProcessRunner>,
        reporter: Arc<dyn FailureReporter>,
    ) -> Result<Self> {
        let enabled = config.resolve_enabled()?;
        Ok(Self::new(config, enabled, runner, reporter))
    }

    /// Register (or replace) the configuration for one kind
    pub fn notify_kind(&mut self, kind: impl Into<KindId>, config: KindConfig) {
        let kind = kind.into();
        debug!(kind = %kind, validators = config.validators.len(), "Registered kind");
        self.kinds.insert(kind, config);
    }

    /// A snippet carrying `nocheck` is never validated
    pub fn is_snippet_exempt<S: AsRef<str>>(attributes: &[S]) -> bool {
        snippet::is_exempt(attributes)
    }

    /// Main ingestion call; returns how many validations were queued
    pub fn on_snippet_encountered<S: AsRef<str>>(
        &mut self,
        document: impl Into<DocumentId>,
        content: impl Into<String>,
        kind: &str,
        attributes: &[S],
    ) -> Result<usize> {
        let snippet = Snippet::new(document, kind, content)
            .with_attributes(attributes.iter().map(|a| a.as_ref().to_string()));
        self.on_snippet_processed(&snippet)
    }

    /// Queue every validator configured for the snippet's kind
    pub fn on_snippet_processed(&mut self, snippet: &Snippet) -> Result<usize> {
        if !self.state.accepts_work() {
            return Err(AppError::InvalidState(format!(
                "cannot accept snippets while {}",
                self.state
            )));
        }
        if !self.enabled || snippet.is_exempt() {
            return Ok(0);
        }
        let Some(kind_config) = self.kinds.get(&snippet.kind) else {
            debug!(kind = %snippet.kind, document = %snippet.document, "No validators for kind");
            return Ok(0);
        };

        let mut queued = 0;
        for command in &kind_config.validators {
            let request =
                ValidationRequest::new(snippet.document.clone(), snippet.content.clone(), command);
            let handle = self.dispatcher.enqueue(&request)?;
            self.queue.push(PendingEntry {
                document: request.document,
                content: request.content,
                command: request.command,
                handle,
            });
            queued += 1;
        }

        if queued > 0 {
            self.state = self.state.transition(EngineState::Accumulating)?;
        }
        Ok(queued)
    }

    /// Non-blocking checkpoint between documents; returns failures reported
    pub fn on_document_boundary(&mut self) -> Result<usize> {
        self.checkpoint_ready()
    }

    /// Blocking checkpoint, then stop the pool; must be called exactly once
    pub async fn on_run_complete(&mut self) -> Result<usize> {
        let reported = self.checkpoint_blocking().await?;
        self.shutdown(EngineState::Stopped)?;
        info!(
            failures = self.failures,
            cached = self.cache.len(),
            "Validation run complete"
        );
        Ok(reported)
    }

    /// Abort the run: pending entries are discarded without reports
    ///
    /// Returns the number of discarded entries.
    pub fn cancel(&mut self) -> Result<usize> {
        if self.state == EngineState::Stopped {
            return Ok(0);
        }
        let discarded = self.queue.clear();
        self.shutdown(EngineState::Stopped)?;
        info!(discarded, "Validation run cancelled");
        Ok(discarded)
    }

    /// Drain the queue; `blocking` waits for every entry
    pub async fn checkpoint(&mut self, blocking: bool) -> Result<usize> {
        if blocking {
            self.checkpoint_blocking().await
        } else {
            self.checkpoint_ready()
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Failures reported so far in this run
    pub fn failure_count(&self) -> usize {
        self.failures
    }

    /// Entries still waiting to be reported
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Distinct (content, command) pairs seen in this run
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Report every front entry whose outcome is already known
    fn checkpoint_ready(&mut self) -> Result<usize> {
        self.state = self.state.transition(EngineState::Draining)?;
        let mut reported = 0;
        while let Some(entry) = self.queue.pop_ready() {
            if let Some(resolution) = entry.handle.try_resolution() {
                reported += usize::from(self.settle(&entry, resolution));
            }
        }
        self.finish_drain()?;
        Ok(reported)
    }

    /// Wait for and report every entry, each bounded by the drain timeout
    async fn checkpoint_blocking(&mut self) -> Result<usize> {
        self.state = self.state.transition(EngineState::Draining)?;
        let mut reported = 0;
        while let Some(entry) = self.queue.pop_front() {
            let resolution = entry.handle.wait(self.drain_timeout).await;
            reported += usize::from(self.settle(&entry, resolution));
        }
        self.finish_drain()?;
        Ok(reported)
    }

    fn finish_drain(&mut self) -> Result<()> {
        let next = if self.queue.is_empty() {
            EngineState::Idle
        } else {
            EngineState::Accumulating
        };
        self.state = self.state.transition(next)?;
        Ok(())
    }

    /// Report a finished entry; true if it was a failure
    fn settle(&mut self, entry: &PendingEntry, resolution: Resolution) -> bool {
        let outcome = match resolution {
            Resolution::Done(outcome) => outcome,
            Resolution::Cancelled => {
                debug!(command = %entry.command, "Skipping cancelled validation");
                return false;
            }
        };
        match ValidationFailure::from_outcome(
            entry.document.clone(),
            entry.command.clone(),
            entry.content.clone(),
            &outcome,
        ) {
            Some(failure) => {
                self.reporter.report(&failure);
                self.failures += 1;
                true
            }
            None => false,
        }
    }

    fn shutdown(&mut self, to: EngineState) -> Result<()> {
        self.state = self.state.transition(EngineState::ShuttingDown)?;
        self.dispatcher.cancel_and_stop();
        self.state = self.state.transition(to)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::process_runner::mocks::{MockBehavior, MockProcessRunner};
    use crate::port::reporter::mocks::CollectingReporter;

    fn config(validators: &[&str]) -> EngineConfig {
        let mut config = EngineConfig::default();
        config.kinds.insert(
            "sh".to_string(),
            KindConfig::for_kind("sh", validators.iter().map(|v| v.to_string()).collect()),
        );
        config
    }

    fn coordinator(
        config: &EngineConfig,
        runner: &MockProcessRunner,
        reporter: &CollectingReporter,
    ) -> Coordinator {
        Coordinator::new(
            config,
            true,
            Arc::new(runner.clone()),
            Arc::new(reporter.clone()),
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reports_in_submission_order() {
        // Earlier commands take longer than later ones
        let runner = MockProcessRunner::new()
            .with_behavior(
                "slow",
                MockBehavior::Delay(
                    Duration::from_millis(200),
                    Box::new(MockBehavior::Fail("slow failed".into())),
                ),
            )
            .with_behavior(
                "medium",
                MockBehavior::Delay(
                    Duration::from_millis(100),
                    Box::new(MockBehavior::Fail("medium failed".into())),
                ),
            )
            .with_behavior("fast", MockBehavior::Fail("fast failed".into()));
        let reporter = CollectingReporter::new();
        let mut engine = coordinator(&config(&["slow", "medium", "fast"]), &runner, &reporter);

        assert_eq!(engine.on_snippet_encountered("a.md", "x", "sh", &["title"]).unwrap(), 3);
        assert_eq!(engine.state(), EngineState::Accumulating);

        assert_eq!(engine.on_run_complete().await.unwrap(), 3);
        assert_eq!(reporter.commands(), vec!["slow", "medium", "fast"]);
        assert_eq!(engine.state(), EngineState::Stopped);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_boundary_does_not_overtake_pending_entry() {
        let runner = MockProcessRunner::new()
            .with_behavior(
                "slow",
                MockBehavior::Delay(
                    Duration::from_millis(300),
                    Box::new(MockBehavior::Fail("E-slow".into())),
                ),
            )
            .with_behavior("fast", MockBehavior::Fail("E-fast".into()));
        let reporter = CollectingReporter::new();
        let mut engine = coordinator(&config(&["slow", "fast"]), &runner, &reporter);

        engine.on_snippet_encountered("a.md", "x", "sh", &[] as &[&str]).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // "fast" is done, "slow" is not: nothing may be reported yet
        assert_eq!(engine.on_document_boundary().unwrap(), 0);
        assert_eq!(engine.pending(), 2);
        assert_eq!(engine.state(), EngineState::Accumulating);

        assert_eq!(engine.on_run_complete().await.unwrap(), 2);
        assert_eq!(reporter.commands(), vec!["slow", "fast"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_identical_snippets_share_one_run() {
        let runner = MockProcessRunner::new().with_behavior("lint", MockBehavior::Fail("bad".into()));
        let reporter = CollectingReporter::new();
        let mut engine = coordinator(&config(&["lint"]), &runner, &reporter);

        engine.on_snippet_encountered("a.md", "same", "sh", &[] as &[&str]).unwrap();
        engine.on_snippet_encountered("b.md", "same", "sh", &[] as &[&str]).unwrap();
        engine.on_run_complete().await.unwrap();

        assert_eq!(runner.call_count(), 1);
        assert_eq!(engine.cache_len(), 1);
        // Shared outcome is still reported against both documents
        let documents: Vec<_> = reporter.failures().into_iter().map(|f| f.document).collect();
        assert_eq!(documents, vec!["a.md", "b.md"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_exempt_and_disabled_submit_nothing() {
        let runner = MockProcessRunner::new();
        let reporter = CollectingReporter::new();
        let config = config(&["lint"]);

        let mut engine = coordinator(&config, &runner, &reporter);
        assert_eq!(
            engine.on_snippet_encountered("a.md", "x", "sh", &["nocheck"]).unwrap(),
            0
        );
        assert_eq!(
            engine.on_snippet_encountered("a.md", "x", "unknown", &[] as &[&str]).unwrap(),
            0
        );
        engine.on_run_complete().await.unwrap();

        let mut disabled = Coordinator::new(
            &config,
            false,
            Arc::new(runner.clone()),
            Arc::new(reporter.clone()),
        );
        assert_eq!(
            disabled.on_snippet_encountered("a.md", "x", "sh", &[] as &[&str]).unwrap(),
            0
        );
        assert_eq!(disabled.pending(), 0);
        disabled.on_run_complete().await.unwrap();

        assert_eq!(runner.call_count(), 0);
        assert!(reporter.failures().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_timeout_reported_and_drain_continues() {
        let runner = MockProcessRunner::new()
            .with_behavior(
                "hang",
                MockBehavior::Delay(Duration::from_secs(5), Box::new(MockBehavior::Success)),
            )
            .with_behavior("bad", MockBehavior::Fail("ERROR: x".into()));
        let reporter = CollectingReporter::new();
        let mut config = config(&["hang", "bad"]);
        config.drain_timeout = Duration::from_millis(100);
        let mut engine = coordinator(&config, &runner, &reporter);

        engine.on_snippet_encountered("a.md", "x", "sh", &[] as &[&str]).unwrap();
        assert_eq!(engine.on_run_complete().await.unwrap(), 2);

        let failures = reporter.failures();
        assert!(failures[0].output.contains("Timed out"));
        assert_eq!(failures[1].output, "ERROR: x");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_reports_nothing() {
        let runner = MockProcessRunner::new().with_behavior(
            "bad",
            MockBehavior::Delay(
                Duration::from_millis(100),
                Box::new(MockBehavior::Fail("late".into())),
            ),
        );
        let reporter = CollectingReporter::new();
        let mut engine = coordinator(&config(&["bad"]), &runner, &reporter);

        engine.on_snippet_encountered("a.md", "x", "sh", &[] as &[&str]).unwrap();
        assert_eq!(engine.cancel().unwrap(), 1);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(reporter.failures().is_empty());
        assert_eq!(engine.state(), EngineState::Stopped);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stopped_engine_rejects_work() {
        let runner = MockProcessRunner::new();
        let reporter = CollectingReporter::new();
        let mut engine = coordinator(&config(&["lint"]), &runner, &reporter);

        engine.on_run_complete().await.unwrap();
        assert!(engine
            .on_snippet_encountered("a.md", "x", "sh", &[] as &[&str])
            .is_err());
        assert!(engine.on_run_complete().await.is_err());
    }
}
