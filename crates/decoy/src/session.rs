//! The serving context that ties rules, history and verification together.

use crate::config::Config;
use crate::error::{NoMatchingRule, RegistrationError, VerificationError};
use crate::history::RequestHistory;
use crate::predicate::{Predicate, PredicateSet};
use crate::request::Request;
use crate::rule::{ResponseDefinition, RuleHandle, RuleRepository};
use crate::server::DefaultResponse;
use crate::verify::VerificationEngine;
use std::sync::Arc;

/// One independent mock session.
///
/// Create one per test (or per server); nothing is shared between sessions.
/// Share it across threads with an `Arc`.
#[derive(Debug, Default)]
pub struct MockSession {
    rules: RuleRepository,
    history: RequestHistory,
    defaults: DefaultResponse,
}

impl MockSession {
    /// Session with recording enabled and stock defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recording(recording: bool) -> Self {
        Self {
            history: RequestHistory::new(recording),
            ..Self::default()
        }
    }

    pub fn with_defaults(mut self, defaults: DefaultResponse) -> Self {
        self.defaults = defaults;
        self
    }

    /// Session populated from a configuration file's settings and stubs.
    pub fn from_config(config: &Config) -> Result<Self, RegistrationError> {
        let session =
            Self::with_recording(config.record_requests).with_defaults(config.defaults.clone());
        for stub in &config.stubs {
            let compiled = stub.compile()?;
            session.register_stub(compiled.id, compiled.predicates, compiled.responses)?;
        }
        Ok(session)
    }

    /// Register a rule after all existing ones.
    pub fn register(
        &self,
        predicates: PredicateSet,
        responses: Vec<ResponseDefinition>,
    ) -> Result<RuleHandle, RegistrationError> {
        self.rules.register(predicates, responses)
    }

    /// Register a rule carrying an id that shows up in diagnostics.
    pub fn register_stub(
        &self,
        id: Option<String>,
        predicates: PredicateSet,
        responses: Vec<ResponseDefinition>,
    ) -> Result<RuleHandle, RegistrationError> {
        self.rules.register_with_id(id, predicates, responses)
    }

    /// Record `request` (if recording is on) and return the matching rule's
    /// next response. Does not apply the response delay.
    pub fn dispatch(&self, request: Request) -> Result<ResponseDefinition, NoMatchingRule> {
        let request = Arc::new(request);
        self.history.record(Arc::clone(&request));
        self.rules.dispatch(&request)
    }

    /// [`MockSession::dispatch`], then block the calling thread for the
    /// response delay.
    pub fn respond(&self, request: Request) -> Result<ResponseDefinition, NoMatchingRule> {
        let response = self.dispatch(request)?;
        if !response.delay().is_zero() {
            std::thread::sleep(response.delay());
        }
        Ok(response)
    }

    pub fn set_recording_enabled(&self, enabled: bool) {
        self.history.set_recording_enabled(enabled);
    }

    pub fn is_recording_enabled(&self) -> bool {
        self.history.is_recording_enabled()
    }

    pub fn verifier(&self) -> VerificationEngine<'_> {
        VerificationEngine::new(&self.history)
    }

    pub fn count(&self, predicates: &PredicateSet) -> Result<usize, VerificationError> {
        self.verifier().count(predicates)
    }

    pub fn verify(
        &self,
        predicates: &PredicateSet,
        expected: &dyn Predicate<usize>,
    ) -> Result<(), VerificationError> {
        self.verifier().verify(predicates, expected)
    }

    pub fn received_times(
        &self,
        predicates: &PredicateSet,
        count: i64,
    ) -> Result<(), VerificationError> {
        self.verifier().received_times(predicates, count)
    }

    pub fn received_once(&self, predicates: &PredicateSet) -> Result<(), VerificationError> {
        self.verifier().received_once(predicates)
    }

    pub fn received_never(&self, predicates: &PredicateSet) -> Result<(), VerificationError> {
        self.verifier().received_never(predicates)
    }

    pub fn rules(&self) -> &RuleRepository {
        &self.rules
    }

    pub fn history(&self) -> &RequestHistory {
        &self.history
    }

    pub fn defaults(&self) -> &DefaultResponse {
        &self.defaults
    }

    /// Session boundary: drop recorded requests and re-arm verification.
    /// Registered rules and their cursors are kept.
    pub fn reset(&self) {
        self.history.reset();
    }
}
