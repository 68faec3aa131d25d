/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

//! Right-comb pair helpers backing `PAIR n`, `GET n` and `UPDATE n`.
//!
//! A comb `pair a (pair b c)` has its leaves at indices `1`, `3` and `4`:
//! even index `2k` is the `k`-th right spine node (with `0` being the whole
//! value), odd index `2k + 1` is the left child of that node.

use super::Type;

/// Fold types into a right comb, the first element ending up leftmost. Returns
/// `None` on an empty input.
pub fn pair_n(tys: Vec<Type>) -> Option<Type> {
    let mut tys = tys.into_iter().rev();
    let last = tys.next()?;
    Some(tys.fold(last, |acc, ty| Type::new_pair(ty, acc)))
}

/// Type at comb index `n`, or `None` if the comb is not deep enough.
pub fn get_n(ty: &Type, n: usize) -> Option<&Type> {
    match (n, ty) {
        (0, _) => Some(ty),
        (1, Type::Pair(p)) => Some(&p.0),
        (_, Type::Pair(p)) => get_n(&p.1, n - 2),
        _ => None,
    }
}

/// Copy of `ty` with the component at comb index `n` replaced by `new`, or
/// `None` if the comb is not deep enough.
pub fn update_n(ty: &Type, n: usize, new: Type) -> Option<Type> {
    match (n, ty) {
        (0, _) => Some(new),
        (1, Type::Pair(p)) => Some(Type::new_pair(new, p.1.clone())),
        (_, Type::Pair(p)) => Some(Type::new_pair(p.0.clone(), update_n(&p.1, n - 2, new)?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Type as T;

    fn abc() -> Type {
        T::new_pair(T::Nat, T::new_pair(T::Int, T::String))
    }

    #[test]
    fn pair_n_builds_right_comb() {
        assert_eq!(pair_n(vec![T::Nat, T::Int, T::String]), Some(abc()));
        assert_eq!(pair_n(vec![T::Nat]), Some(T::Nat));
        assert_eq!(pair_n(vec![]), None);
    }

    #[test]
    fn get_n_leaves() {
        let ty = abc();
        assert_eq!(get_n(&ty, 0), Some(&ty));
        assert_eq!(get_n(&ty, 1), Some(&T::Nat));
        assert_eq!(get_n(&ty, 2), Some(&T::new_pair(T::Int, T::String)));
        assert_eq!(get_n(&ty, 3), Some(&T::Int));
        assert_eq!(get_n(&ty, 4), Some(&T::String));
        assert_eq!(get_n(&ty, 5), None);
        assert_eq!(get_n(&T::Nat, 1), None);
    }

    #[test]
    fn update_n_replaces_one_component() {
        let ty = abc();
        assert_eq!(update_n(&ty, 0, T::Unit), Some(T::Unit));
        assert_eq!(
            update_n(&ty, 3, T::Bool),
            Some(T::new_pair(T::Nat, T::new_pair(T::Bool, T::String)))
        );
        assert_eq!(
            update_n(&ty, 4, T::Bytes),
            Some(T::new_pair(T::Nat, T::new_pair(T::Int, T::Bytes)))
        );
        assert_eq!(update_n(&ty, 6, T::Bytes), None);
    }
}
