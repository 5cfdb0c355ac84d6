//! Sticky response cursor.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Lock-free cursor over a response sequence of fixed length.
///
/// Each call to [`ResponseCursor::advance`] hands out the current index and
/// moves forward by one until the last index, where it stays. The
/// read-modify-write is a single `fetch_update`, so concurrent callers each
/// observe a distinct index until the sequence is exhausted.
#[derive(Default)]
pub struct ResponseCursor(AtomicUsize);

impl ResponseCursor {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    /// Index the next call to `advance` will return.
    #[must_use]
    pub fn peek(&self, response_count: usize) -> usize {
        self.0
            .load(Ordering::Acquire)
            .min(response_count.saturating_sub(1))
    }

    /// Return the current index and advance unless it is the last one.
    #[must_use]
    pub fn advance(&self, response_count: usize) -> usize {
        let last = response_count.saturating_sub(1);
        let previous = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |idx| {
                (idx < last).then_some(idx + 1)
            })
            .unwrap_or_else(|idx| idx);
        previous.min(last)
    }
}

impl fmt::Debug for ResponseCursor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("ResponseCursor")
            .field(&self.0.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_advances_then_sticks() {
        let cursor = ResponseCursor::new();
        let seen: Vec<usize> = (0..6).map(|_| cursor.advance(3)).collect();
        assert_eq!(seen, vec![0, 1, 2, 2, 2, 2]);
        assert_eq!(cursor.peek(3), 2);
    }

    #[test]
    fn test_single_response_never_moves() {
        let cursor = ResponseCursor::new();
        assert_eq!(cursor.advance(1), 0);
        assert_eq!(cursor.advance(1), 0);
        assert_eq!(cursor.peek(1), 0);
    }

    #[test]
    fn test_peek_does_not_advance() {
        let cursor = ResponseCursor::new();
        assert_eq!(cursor.peek(2), 0);
        assert_eq!(cursor.peek(2), 0);
        assert_eq!(cursor.advance(2), 0);
        assert_eq!(cursor.peek(2), 1);
    }

    #[test]
    fn test_concurrent_advance_hands_out_each_index_once() {
        let cursor = Arc::new(ResponseCursor::new());
        let mut seen: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let cursor = Arc::clone(&cursor);
                    scope.spawn(move || cursor.advance(5))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        seen.sort_unstable();

        let mut expected = vec![0, 1, 2, 3];
        expected.extend(std::iter::repeat(4).take(12));
        assert_eq!(seen, expected);
    }
}
