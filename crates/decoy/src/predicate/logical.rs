//! Logical operators for combining predicates.
//!
//! NOT, OR and AND over any predicate type, plus closure-backed predicates
//! for conditions the built-in fields cannot express.

use super::Predicate;
use std::fmt;
use std::sync::Arc;

/// Negates the inner predicate.
pub struct Not<T: ?Sized> {
    inner: Arc<dyn Predicate<T>>,
}

/// Matches if ANY of the inner predicates match.
pub struct AnyOf<T: ?Sized> {
    inner: Vec<Arc<dyn Predicate<T>>>,
}

/// Matches if ALL of the inner predicates match.
pub struct AllOf<T: ?Sized> {
    inner: Vec<Arc<dyn Predicate<T>>>,
}

/// Predicate backed by a closure and a fixed description.
pub struct Custom<F> {
    description: String,
    check: F,
}

pub fn not<T: ?Sized>(predicate: impl Predicate<T> + 'static) -> Not<T> {
    Not {
        inner: Arc::new(predicate),
    }
}

pub fn any_of<T: ?Sized>(predicates: Vec<Arc<dyn Predicate<T>>>) -> AnyOf<T> {
    AnyOf { inner: predicates }
}

pub fn all_of<T: ?Sized>(predicates: Vec<Arc<dyn Predicate<T>>>) -> AllOf<T> {
    AllOf { inner: predicates }
}

pub fn custom<T, F>(description: impl Into<String>, check: F) -> Custom<F>
where
    T: ?Sized,
    F: Fn(&T) -> bool + Send + Sync,
{
    Custom {
        description: description.into(),
        check,
    }
}

fn joined<T: ?Sized>(predicates: &[Arc<dyn Predicate<T>>], sep: &str) -> String {
    predicates
        .iter()
        .map(|p| p.describe())
        .collect::<Vec<_>>()
        .join(sep)
}

impl<T: ?Sized> Predicate<T> for Not<T> {
    fn matches(&self, item: &T) -> bool {
        !self.inner.matches(item)
    }

    fn describe(&self) -> String {
        format!("not ({})", self.inner.describe())
    }

    fn describe_mismatch(&self, _item: &T) -> String {
        format!("{} but it matched", self.describe())
    }
}

impl<T: ?Sized> Predicate<T> for AnyOf<T> {
    fn matches(&self, item: &T) -> bool {
        self.inner.iter().any(|p| p.matches(item))
    }

    fn describe(&self) -> String {
        if self.inner.is_empty() {
            return "any of ()".to_string();
        }
        format!("({})", joined(&self.inner, " OR "))
    }

    fn describe_mismatch(&self, item: &T) -> String {
        let reasons = self
            .inner
            .iter()
            .map(|p| p.describe_mismatch(item))
            .collect::<Vec<_>>()
            .join("; ");
        format!("none of {} matched: {reasons}", self.describe())
    }
}

impl<T: ?Sized> Predicate<T> for AllOf<T> {
    fn matches(&self, item: &T) -> bool {
        self.inner.iter().all(|p| p.matches(item))
    }

    fn describe(&self) -> String {
        if self.inner.is_empty() {
            return "no conditions".to_string();
        }
        format!("({})", joined(&self.inner, " AND "))
    }

    fn describe_mismatch(&self, item: &T) -> String {
        self.inner
            .iter()
            .filter(|p| !p.matches(item))
            .map(|p| p.describe_mismatch(item))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

impl<T, F> Predicate<T> for Custom<F>
where
    T: ?Sized,
    F: Fn(&T) -> bool + Send + Sync,
{
    fn matches(&self, item: &T) -> bool {
        (self.check)(item)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }

    fn describe_mismatch(&self, _item: &T) -> String {
        format!("{} was not satisfied", self.description)
    }
}

impl<T: ?Sized> fmt::Debug for Not<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl<T: ?Sized> fmt::Debug for AnyOf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl<T: ?Sized> fmt::Debug for AllOf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
