/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

//! Abstract type stack simulated by the typechecker.

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::ast::Type;

/// Construct a [TypeStack] from a list of types. The rightmost element is the
/// top of the stack, i.e. `tc_stk![Type::Nat, Type::Int]` has `int` on top.
#[macro_export]
macro_rules! tc_stk {
    () => {
        $crate::stack::TypeStack::new()
    };
    ($($ty:expr),+ $(,)?) => {
        $crate::stack::TypeStack::from(vec![$($ty),+])
    };
}

/// A stack operation needed more elements than are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("stack too short: expected at least {expected} elements, got {actual}")]
pub struct StackTooShort {
    /// Number of elements the operation needed.
    pub expected: usize,
    /// Number of visible elements.
    pub actual: usize,
}

/// Stack of types. Depth `0` is the most recently pushed element.
///
/// Part of the stack can be hidden with [TypeStack::protect_top]: hidden
/// elements are invisible to every other operation, including [TypeStack::len],
/// until brought back with [TypeStack::restore_top].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeStack {
    // top is the last element
    items: Vec<Type>,
    protected: Vec<Vec<Type>>,
}

impl From<Vec<Type>> for TypeStack {
    /// The last element of the vector ends up on top.
    fn from(items: Vec<Type>) -> Self {
        TypeStack {
            items,
            protected: Vec::new(),
        }
    }
}

impl TypeStack {
    /// Empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of visible elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no element is visible.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Visible elements, bottom first.
    pub fn as_slice(&self) -> &[Type] {
        &self.items
    }

    /// Visible elements, top first.
    pub fn iter(&self) -> impl Iterator<Item = &Type> {
        self.items.iter().rev()
    }

    /// Fails unless at least `expected` elements are visible.
    pub fn ensure_len(&self, expected: usize) -> Result<(), StackTooShort> {
        if self.items.len() < expected {
            Err(StackTooShort {
                expected,
                actual: self.items.len(),
            })
        } else {
            Ok(())
        }
    }

    /// Push `ty` on top.
    pub fn push(&mut self, ty: Type) {
        self.items.push(ty)
    }

    /// Remove and return the top element.
    pub fn pop(&mut self) -> Result<Type, StackTooShort> {
        self.items.pop().ok_or(StackTooShort {
            expected: 1,
            actual: 0,
        })
    }

    /// The top element.
    pub fn top(&self) -> Result<&Type, StackTooShort> {
        self.get_at_depth(0)
    }

    /// The element at `depth`, `0` being the top.
    pub fn get_at_depth(&self, depth: usize) -> Result<&Type, StackTooShort> {
        self.ensure_len(depth.saturating_add(1))?;
        Ok(&self.items[self.items.len() - 1 - depth])
    }

    /// Insert `ty` so that it ends up at `depth`. `depth` may be equal to the
    /// length, which inserts at the bottom.
    pub fn insert_at_depth(&mut self, depth: usize, ty: Type) -> Result<(), StackTooShort> {
        self.ensure_len(depth)?;
        let idx = self.items.len() - depth;
        self.items.insert(idx, ty);
        Ok(())
    }

    /// Remove and return the element at `depth`.
    pub fn delete_at_depth(&mut self, depth: usize) -> Result<Type, StackTooShort> {
        self.ensure_len(depth.saturating_add(1))?;
        let idx = self.items.len() - 1 - depth;
        Ok(self.items.remove(idx))
    }

    /// Remove the top `n` elements.
    pub fn drop_top(&mut self, n: usize) -> Result<(), StackTooShort> {
        self.ensure_len(n)?;
        self.items.truncate(self.items.len() - n);
        Ok(())
    }

    /// Remove every visible element.
    pub fn reset(&mut self) {
        self.items.clear()
    }

    /// Hide the top `n` elements until the matching [TypeStack::restore_top].
    pub fn protect_top(&mut self, n: usize) -> Result<(), StackTooShort> {
        self.ensure_len(n)?;
        let frame = self.items.split_off(self.items.len() - n);
        self.protected.push(frame);
        Ok(())
    }

    /// Put the most recently protected elements back on top. No-op if nothing
    /// is protected.
    pub fn restore_top(&mut self) {
        if let Some(mut frame) = self.protected.pop() {
            self.items.append(&mut frame);
        }
    }

    /// Run `f` with the top `n` elements hidden, restoring them afterwards
    /// whatever `f` returns.
    pub fn protect<R, E: From<StackTooShort>>(
        &mut self,
        n: usize,
        f: impl FnOnce(&mut Self) -> Result<R, E>,
    ) -> Result<R, E> {
        self.protect_top(n)?;
        let res = f(self);
        self.restore_top();
        res
    }

    /// Mark the stack as diverged: the visible part becomes `[universal]`.
    pub fn fail(&mut self) {
        self.items.clear();
        self.items.push(Type::Universal);
    }

    /// Whether the stack has diverged, see [TypeStack::fail].
    pub fn is_failed(&self) -> bool {
        matches!(self.items.as_slice(), [Type::Universal])
    }

    /// Fresh stack holding a copy of the visible elements, for typechecking a
    /// nested sequence independently.
    pub fn fork(&self) -> TypeStack {
        TypeStack::from(self.items.clone())
    }

    /// Replace the visible elements with the visible elements of `other`.
    pub fn replace_visible(&mut self, other: TypeStack) {
        self.items = other.items;
    }

    /// Element-wise [Type::equals] from the top. Stacks rooted in
    /// `universal` at any common depth are equal regardless of what is below.
    pub fn equals(&self, other: &TypeStack) -> bool {
        for (l, r) in self.iter().zip(other.iter()) {
            if matches!(l, Type::Universal) || matches!(r, Type::Universal) {
                return true;
            }
            if !l.equals(r) {
                return false;
            }
        }
        self.len() == other.len()
    }
}

/// Indexed from the top: `stack[0]` is the top element. Panics when out of
/// bounds, callers check the length first.
impl Index<usize> for TypeStack {
    type Output = Type;

    fn index(&self, depth: usize) -> &Type {
        &self.items[self.items.len() - 1 - depth]
    }
}

impl IndexMut<usize> for TypeStack {
    fn index_mut(&mut self, depth: usize) -> &mut Type {
        let len = self.items.len();
        &mut self.items[len - 1 - depth]
    }
}

impl fmt::Display for TypeStack {
    /// Top first, e.g. `[ nat : int ]` for a stack with `nat` on top.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "[]");
        }
        write!(f, "[ ")?;
        for (i, ty) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " : ")?;
            }
            write!(f, "{ty}")?;
        }
        write!(f, " ]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Type as T;

    #[test]
    fn depth_addressing() {
        let mut stk = tc_stk![T::Nat, T::Int, T::String];
        assert_eq!(stk.top(), Ok(&T::String));
        assert_eq!(stk.get_at_depth(2), Ok(&T::Nat));
        assert_eq!(
            stk.get_at_depth(3),
            Err(StackTooShort {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(stk[1], T::Int);
        stk.insert_at_depth(3, T::Unit).unwrap();
        assert_eq!(stk, tc_stk![T::Unit, T::Nat, T::Int, T::String]);
        assert_eq!(stk.delete_at_depth(1), Ok(T::Int));
        assert_eq!(stk, tc_stk![T::Unit, T::Nat, T::String]);
    }

    #[test]
    fn huge_depth_is_too_short() {
        let mut stk = tc_stk![T::Nat];
        assert_eq!(
            stk.get_at_depth(usize::MAX),
            Err(StackTooShort {
                expected: usize::MAX,
                actual: 1
            })
        );
        assert!(stk.delete_at_depth(usize::MAX).is_err());
        assert!(stk.insert_at_depth(usize::MAX, T::Int).is_err());
        assert_eq!(stk, tc_stk![T::Nat]);
    }

    #[test]
    fn pop_empty() {
        assert_eq!(
            tc_stk![].pop(),
            Err(StackTooShort {
                expected: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn drop_top_and_reset() {
        let mut stk = tc_stk![T::Nat, T::Int, T::String];
        stk.drop_top(2).unwrap();
        assert_eq!(stk, tc_stk![T::Nat]);
        assert!(stk.drop_top(2).is_err());
        stk.reset();
        assert!(stk.is_empty());
    }

    #[test]
    fn protected_elements_are_invisible() {
        let mut stk = tc_stk![T::Nat, T::Int, T::String];
        stk.protect_top(2).unwrap();
        assert_eq!(stk.len(), 1);
        assert_eq!(stk.top(), Ok(&T::Nat));
        assert!(stk.get_at_depth(1).is_err());
        stk.push(T::Bool);
        stk.restore_top();
        assert_eq!(stk, tc_stk![T::Nat, T::Bool, T::Int, T::String]);
    }

    #[test]
    fn protect_restores_on_error() {
        let mut stk = tc_stk![T::Nat, T::Int];
        let res: Result<(), StackTooShort> = stk.protect(1, |s| {
            s.pop()?;
            s.pop()?;
            Ok(())
        });
        assert!(res.is_err());
        assert_eq!(stk, tc_stk![T::Int]);
    }

    #[test]
    fn fail_replaces_visible_part() {
        let mut stk = tc_stk![T::Nat, T::Int];
        stk.protect_top(1).unwrap();
        stk.fail();
        assert!(stk.is_failed());
        stk.restore_top();
        assert_eq!(stk, tc_stk![T::Universal, T::Int]);
        assert!(!stk.is_failed());
    }

    #[test]
    fn equality_is_rooted_in_universal() {
        let failed = tc_stk![T::Universal];
        assert!(failed.equals(&tc_stk![T::Nat, T::Int]));
        assert!(tc_stk![T::Nat, T::Int].equals(&failed));
        assert!(tc_stk![T::Nat, T::Universal, T::Int].equals(&tc_stk![T::Bool, T::Int]));
        assert!(!tc_stk![T::Nat, T::Int].equals(&tc_stk![T::Int]));
        assert!(!tc_stk![T::Nat].equals(&tc_stk![T::Int]));
        assert!(tc_stk![].equals(&tc_stk![]));
    }

    #[test]
    fn display_top_first() {
        assert_eq!(tc_stk![T::Nat, T::Int].to_string(), "[ int : nat ]");
        assert_eq!(tc_stk![].to_string(), "[]");
    }
}
