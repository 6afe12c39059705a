//! Forward iteration over typed elements.

use std::iter::FusedIterator;
use std::ops::{Add, AddAssign};

use super::Element;

/// A position in a run of elements, usable as a cursor or an `Iterator`.
///
/// Positions are clamped to `[begin, end]`: advancing past the end stops at
/// the end, so `end` is always reachable by repeated increments.
///
/// # Example
/// ```ignore
/// let lock = array.lock()?;
/// let mut it = lock.begin::<u32>()?;
/// it += 10;
/// assert_eq!(it.get(), Some(&lock.at::<u32>(&[10])?));
/// assert_eq!(it + usize::MAX, lock.end::<u32>()?);
/// ```
#[derive(Debug)]
pub struct ElementIter<'a, T: Element> {
    elements: &'a [T],
    pos: usize,
}

impl<'a, T: Element> ElementIter<'a, T> {
    pub(crate) fn begin(elements: &'a [T]) -> Self {
        Self { elements, pos: 0 }
    }

    pub(crate) fn end(elements: &'a [T]) -> Self {
        Self {
            elements,
            pos: elements.len(),
        }
    }

    /// Element under the cursor, or `None` at the end.
    #[inline]
    pub fn get(&self) -> Option<&'a T> {
        self.elements.get(self.pos)
    }

    /// Element index of the cursor.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.pos == self.elements.len()
    }

    /// Move forward by `n` elements, stopping at the end.
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n).min(self.elements.len());
    }
}

impl<T: Element> Clone for ElementIter<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Element> Copy for ElementIter<'_, T> {}

impl<T: Element> PartialEq for ElementIter<'_, T> {
    /// Same run, same position.
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.elements, other.elements) && self.pos == other.pos
    }
}

impl<T: Element> Eq for ElementIter<'_, T> {}

impl<T: Element> AddAssign<usize> for ElementIter<'_, T> {
    fn add_assign(&mut self, n: usize) {
        self.advance(n);
    }
}

impl<T: Element> Add<usize> for ElementIter<'_, T> {
    type Output = Self;

    fn add(mut self, n: usize) -> Self {
        self.advance(n);
        self
    }
}

impl<'a, T: Element> Iterator for ElementIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let item = self.get()?;
        self.pos += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.elements.len() - self.pos;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<&'a T> {
        self.advance(n);
        self.next()
    }
}

impl<T: Element> ExactSizeIterator for ElementIter<'_, T> {}

impl<T: Element> FusedIterator for ElementIter<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iterate_all() {
        let data = [1u32, 2, 3, 4];
        let collected: Vec<u32> = ElementIter::begin(&data).copied().collect();
        assert_eq!(collected, data);
    }

    #[test]
    fn test_end_reachable_by_increment() {
        let data = [0i16; 5];
        let end = ElementIter::end(&data);

        let mut it = ElementIter::begin(&data);
        let mut steps = 0;
        while it != end {
            it += 1;
            steps += 1;
        }
        assert_eq!(steps, 5);
        assert!(it.is_end());
        assert_eq!(it.get(), None);
    }

    #[test]
    fn test_arithmetic_clamps_to_end() {
        let data = [1.0f64, 2.0, 3.0];
        let begin = ElementIter::begin(&data);

        assert_eq!((begin + 2).get(), Some(&3.0));
        assert_eq!(begin + 3, ElementIter::end(&data));
        assert_eq!(begin + usize::MAX, ElementIter::end(&data));
        assert_eq!(begin.position(), 0);
    }

    #[test]
    fn test_restartable() {
        let data = [7u8, 8, 9];
        let begin = ElementIter::begin(&data);

        let first: Vec<u8> = begin.copied().collect();
        let second: Vec<u8> = begin.copied().collect();
        assert_eq!(first, second);
        assert_eq!(begin.len(), 3);
    }

    #[test]
    fn test_different_runs_are_unequal() {
        let a = [0u8; 2];
        let b = [0u8; 2];
        assert_ne!(ElementIter::begin(&a), ElementIter::begin(&b));
    }
}
