//! Predicates over request counts, used by verification.

use super::Predicate;
use crate::error::VerificationError;

/// Expected number of matching requests.
///
/// Constructors take signed counts so that a negative expectation is
/// rejected up front instead of silently never matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMatcher {
    Exactly(usize),
    AtLeast(usize),
    AtMost(usize),
    /// Inclusive range
    Between(usize, usize),
}

fn non_negative(count: i64) -> Result<usize, VerificationError> {
    usize::try_from(count).map_err(|_| VerificationError::NegativeCount(count))
}

impl CountMatcher {
    pub fn exactly(count: i64) -> Result<Self, VerificationError> {
        Ok(CountMatcher::Exactly(non_negative(count)?))
    }

    pub fn at_least(count: i64) -> Result<Self, VerificationError> {
        Ok(CountMatcher::AtLeast(non_negative(count)?))
    }

    pub fn at_most(count: i64) -> Result<Self, VerificationError> {
        Ok(CountMatcher::AtMost(non_negative(count)?))
    }

    pub fn between(min: i64, max: i64) -> Result<Self, VerificationError> {
        let min = non_negative(min)?;
        let max = non_negative(max)?;
        Ok(CountMatcher::Between(min.min(max), min.max(max)))
    }
}

impl Predicate<usize> for CountMatcher {
    fn matches(&self, actual: &usize) -> bool {
        match *self {
            CountMatcher::Exactly(n) => *actual == n,
            CountMatcher::AtLeast(n) => *actual >= n,
            CountMatcher::AtMost(n) => *actual <= n,
            CountMatcher::Between(min, max) => (min..=max).contains(actual),
        }
    }

    fn describe(&self) -> String {
        match *self {
            CountMatcher::Exactly(n) => format!("<{n}>"),
            CountMatcher::AtLeast(n) => format!("at least <{n}>"),
            CountMatcher::AtMost(n) => format!("at most <{n}>"),
            CountMatcher::Between(min, max) => format!("between <{min}> and <{max}>"),
        }
    }

    fn describe_mismatch(&self, actual: &usize) -> String {
        format!("was expected to be {} but was <{actual}>", self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly() {
        let matcher = CountMatcher::exactly(3).unwrap();
        assert!(matcher.matches(&3));
        assert!(!matcher.matches(&1));
        assert_eq!(matcher.describe(), "<3>");
        assert_eq!(
            matcher.describe_mismatch(&1),
            "was expected to be <3> but was <1>"
        );
    }

    #[test]
    fn test_bounds() {
        assert!(CountMatcher::at_least(2).unwrap().matches(&5));
        assert!(!CountMatcher::at_least(2).unwrap().matches(&1));
        assert!(CountMatcher::at_most(2).unwrap().matches(&0));
        assert!(!CountMatcher::at_most(2).unwrap().matches(&3));

        let between = CountMatcher::between(4, 2).unwrap();
        assert_eq!(between, CountMatcher::Between(2, 4));
        assert!(between.matches(&2) && between.matches(&4));
        assert!(!between.matches(&5));
        assert_eq!(
            between.describe_mismatch(&5),
            "was expected to be between <2> and <4> but was <5>"
        );
    }

    #[test]
    fn test_negative_counts_rejected() {
        assert_eq!(
            CountMatcher::exactly(-1),
            Err(VerificationError::NegativeCount(-1))
        );
        assert_eq!(
            CountMatcher::between(0, -3),
            Err(VerificationError::NegativeCount(-3))
        );
    }
}
