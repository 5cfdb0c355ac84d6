//! A single registered stub rule.

use super::cursor::ResponseCursor;
use super::response::ResponseDefinition;
use crate::error::RegistrationError;
use crate::predicate::PredicateSet;
use crate::request::Request;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Predicate set plus an ordered, sticky sequence of responses.
#[derive(Debug)]
pub struct Rule {
    index: usize,
    id: Option<String>,
    predicates: PredicateSet,
    responses: Vec<ResponseDefinition>,
    cursor: ResponseCursor,
    matched: AtomicU64,
}

impl Rule {
    /// Build a rule; fails when `responses` is empty.
    pub fn new(
        index: usize,
        id: Option<String>,
        predicates: PredicateSet,
        responses: Vec<ResponseDefinition>,
    ) -> Result<Self, RegistrationError> {
        if responses.is_empty() {
            return Err(RegistrationError::EmptyResponses);
        }
        Ok(Self {
            index,
            id,
            predicates,
            responses,
            cursor: ResponseCursor::new(),
            matched: AtomicU64::new(0),
        })
    }

    /// Position in registration order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn predicates(&self) -> &PredicateSet {
        &self.predicates
    }

    pub fn responses(&self) -> &[ResponseDefinition] {
        &self.responses
    }

    /// Pure check, safe to call concurrently and repeatedly.
    pub fn matches(&self, request: &Request) -> bool {
        self.predicates.matches(request)
    }

    pub fn describe_mismatch(&self, request: &Request) -> String {
        self.predicates.describe_mismatch(request)
    }

    /// Hand out the current response and advance the cursor.
    pub fn next_response(&self) -> &ResponseDefinition {
        self.next_response_indexed().1
    }

    /// Like [`Rule::next_response`], also returning the response index.
    pub fn next_response_indexed(&self) -> (usize, &ResponseDefinition) {
        let idx = self.cursor.advance(self.responses.len());
        self.matched.fetch_add(1, Ordering::Relaxed);
        (idx, &self.responses[idx])
    }

    /// Index of the response the next dispatch will return.
    pub fn peek_index(&self) -> usize {
        self.cursor.peek(self.responses.len())
    }

    /// Number of dispatches this rule has served.
    pub fn times_matched(&self) -> u64 {
        self.matched.load(Ordering::Relaxed)
    }
}

/// Shared handle to a registered rule, returned by registration.
#[derive(Debug, Clone)]
pub struct RuleHandle(pub(crate) Arc<Rule>);

impl Deref for RuleHandle {
    type Target = Rule;

    fn deref(&self) -> &Rule {
        &self.0
    }
}
