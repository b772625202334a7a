//! Matrix stack for hierarchical model transforms.
//!
//! The usual pattern for a composite figure is: push the parent's matrix,
//! peek it to start each child, compose the child's transform onto the
//! peeked copy, draw, and pop once the subtree is done.
//!
//! Entries are always copies. [`TransformStack::push`] stores a snapshot and
//! [`TransformStack::peek`] hands out a copy, so composing onto a peeked
//! matrix never touches the stored parent. To make a child transform the new
//! baseline for its own children, push it.
//!
//! # Example
//!
//! ```
//! use rasterkit::{Matrix4, TransformStack};
//!
//! # fn main() -> Result<(), rasterkit::StackError> {
//! let mut stack = TransformStack::new();
//! stack.push(&Matrix4::identity());
//!
//! let mut upper_arm = stack.peek()?;
//! upper_arm.translate(4.0, 6.0, 0.0).rotate(30.0, 0.0, 0.0, 1.0);
//! stack.push(&upper_arm);
//! // ... draw the forearm relative to the upper arm ...
//! stack.pop()?;
//!
//! // The torso baseline is untouched.
//! assert_eq!(stack.peek()?, Matrix4::identity());
//! # Ok(())
//! # }
//! ```

use crate::error::StackError;
use crate::matrix::Matrix4;

/// LIFO stack of [`Matrix4`] snapshots.
#[derive(Clone, Debug, Default)]
pub struct TransformStack {
    entries: Vec<Matrix4>,
    high_water: usize,
}

impl TransformStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a copy of `matrix`.
    pub fn push(&mut self, matrix: &Matrix4) {
        self.entries.push(*matrix);
        self.high_water = self.high_water.max(self.entries.len());
    }

    /// Returns a copy of the top entry.
    pub fn peek(&self) -> Result<Matrix4, StackError> {
        self.entries.last().copied().ok_or(StackError::Empty)
    }

    /// Removes and returns the top entry.
    pub fn pop(&mut self) -> Result<Matrix4, StackError> {
        self.entries.pop().ok_or(StackError::Empty)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deepest the stack has been since creation or the last
    /// [`reset_high_water`](Self::reset_high_water).
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    pub fn reset_high_water(&mut self) {
        self.high_water = self.entries.len();
    }

    /// Pushes `matrix`, runs `f`, then pops, whether or not `f` failed.
    ///
    /// If `f` leaves extra entries behind they are discarded so the stack
    /// returns to the depth it had before the push.
    pub fn scoped<T, E>(
        &mut self,
        matrix: &Matrix4,
        f: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StackError>,
    {
        let depth = self.entries.len();
        self.push(matrix);
        let result = f(self);
        if self.entries.len() <= depth {
            log::warn!(
                "transform stack underflowed inside scope (depth {} -> {})",
                depth,
                self.entries.len()
            );
            return match result {
                Ok(_) => Err(StackError::Empty.into()),
                Err(e) => Err(e),
            };
        }
        if self.entries.len() > depth + 1 {
            log::warn!(
                "discarding {} unbalanced transform stack entries",
                self.entries.len() - depth - 1
            );
        }
        self.entries.truncate(depth);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translated(x: f32, y: f32, z: f32) -> Matrix4 {
        let mut m = Matrix4::identity();
        m.translate(x, y, z);
        m
    }

    #[test]
    fn push_pop_restores_top() {
        let mut stack = TransformStack::new();
        stack.push(&translated(1.0, 2.0, 3.0));
        let before = stack.peek().unwrap();

        let mut child = stack.peek().unwrap();
        child.rotate(45.0, 0.0, 1.0, 0.0).scale(2.0, 2.0, 2.0);
        stack.push(&child);
        let _ = stack.peek().unwrap();
        stack.pop().unwrap();

        assert_eq!(stack.peek().unwrap(), before);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn pushed_entry_is_isolated_from_caller() {
        let mut stack = TransformStack::new();
        let mut m = translated(1.0, 0.0, 0.0);
        stack.push(&m);

        m.translate(10.0, 10.0, 10.0).scale(3.0, 3.0, 3.0);

        assert_eq!(stack.peek().unwrap(), translated(1.0, 0.0, 0.0));
    }

    #[test]
    fn peeked_copy_does_not_alter_stack() {
        let mut stack = TransformStack::new();
        stack.push(&Matrix4::identity());

        let mut scratch = stack.peek().unwrap();
        scratch.translate(5.0, 0.0, 0.0);

        assert_eq!(stack.peek().unwrap(), Matrix4::identity());
    }

    #[test]
    fn pop_on_empty_fails() {
        let mut stack = TransformStack::new();
        assert_eq!(stack.pop(), Err(StackError::Empty));
        assert_eq!(stack.peek(), Err(StackError::Empty));
    }

    #[test]
    fn pop_after_clear_fails() {
        let mut stack = TransformStack::new();
        stack.push(&Matrix4::identity());
        stack.push(&translated(0.0, 1.0, 0.0));
        stack.clear();

        assert!(stack.is_empty());
        assert_eq!(stack.pop(), Err(StackError::Empty));
        assert_eq!(stack.peek(), Err(StackError::Empty));
    }

    #[test]
    fn sibling_subtrees_do_not_inherit_transforms() {
        let mut stack = TransformStack::new();
        stack.push(&Matrix4::identity());

        let mut right = stack.peek().unwrap();
        right.rotate(60.0, 0.0, 0.0, 1.0);
        stack.push(&right);
        stack.pop().unwrap();

        let left = stack.peek().unwrap();
        assert_eq!(left, Matrix4::identity());
    }

    #[test]
    fn scoped_pops_on_error() {
        let mut stack = TransformStack::new();
        stack.push(&Matrix4::identity());

        let result: Result<(), StackError> = stack.scoped(&translated(1.0, 0.0, 0.0), |s| {
            assert_eq!(s.len(), 2);
            Err(StackError::Empty)
        });

        assert!(result.is_err());
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.high_water(), 2);
    }

    #[test]
    fn scoped_discards_leftover_entries() {
        let mut stack = TransformStack::new();
        let result: Result<usize, StackError> = stack.scoped(&Matrix4::identity(), |s| {
            s.push(&translated(1.0, 0.0, 0.0));
            Ok(s.len())
        });

        assert_eq!(result, Ok(2));
        assert!(stack.is_empty());
    }

    #[test]
    fn scoped_detects_underflow() {
        let mut stack = TransformStack::new();
        let result: Result<(), StackError> = stack.scoped(&Matrix4::identity(), |s| {
            s.pop()?;
            Ok(())
        });

        assert_eq!(result, Err(StackError::Empty));
        assert!(stack.is_empty());
    }
}
