//! Counting and asserting on the request history.

use crate::error::VerificationError;
use crate::history::{RecordedRequest, RequestHistory};
use crate::predicate::{CountMatcher, Predicate, PredicateSet};
use tracing::debug;

/// Read-only view over a [`RequestHistory`] that evaluates predicate sets.
///
/// Every call works on a fresh snapshot of the history and fails with
/// [`VerificationError::RecordingDisabled`] if recording was switched off at
/// any point in the session.
#[derive(Debug, Clone, Copy)]
pub struct VerificationEngine<'a> {
    history: &'a RequestHistory,
}

impl<'a> VerificationEngine<'a> {
    pub fn new(history: &'a RequestHistory) -> Self {
        Self { history }
    }

    fn snapshot(&self) -> Result<Vec<RecordedRequest>, VerificationError> {
        if self.history.was_ever_disabled() {
            return Err(VerificationError::RecordingDisabled);
        }
        Ok(self.history.snapshot())
    }

    /// Number of recorded requests matching every predicate in `predicates`.
    pub fn count(&self, predicates: &PredicateSet) -> Result<usize, VerificationError> {
        Ok(self
            .snapshot()?
            .iter()
            .filter(|entry| predicates.matches(&entry.request))
            .count())
    }

    /// Recorded requests matching `predicates`, in arrival order.
    pub fn find(&self, predicates: &PredicateSet) -> Result<Vec<RecordedRequest>, VerificationError> {
        Ok(self
            .snapshot()?
            .into_iter()
            .filter(|entry| predicates.matches(&entry.request))
            .collect())
    }

    /// Fail unless the number of matching requests satisfies `expected`.
    pub fn verify(
        &self,
        predicates: &PredicateSet,
        expected: &dyn Predicate<usize>,
    ) -> Result<(), VerificationError> {
        let snapshot = self.snapshot()?;
        let actual = snapshot
            .iter()
            .filter(|entry| predicates.matches(&entry.request))
            .count();
        if expected.matches(&actual) {
            return Ok(());
        }

        let message = format!(
            "Expected {} request(s) matching: {}\n    {}\n({} request(s) recorded in total)",
            expected.describe(),
            predicates.describe(),
            expected.describe_mismatch(&actual),
            snapshot.len()
        );
        debug!("Verification failed: {}", message);
        Err(VerificationError::Failure { message })
    }

    /// Exactly `count` matching requests; negative counts are rejected before
    /// the history is consulted.
    pub fn received_times(
        &self,
        predicates: &PredicateSet,
        count: i64,
    ) -> Result<(), VerificationError> {
        let expected = CountMatcher::exactly(count)?;
        self.verify(predicates, &expected)
    }

    pub fn received_once(&self, predicates: &PredicateSet) -> Result<(), VerificationError> {
        self.verify(predicates, &CountMatcher::Exactly(1))
    }

    pub fn received_never(&self, predicates: &PredicateSet) -> Result<(), VerificationError> {
        self.verify(predicates, &CountMatcher::Exactly(0))
    }
}
