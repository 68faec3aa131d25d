/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

use super::arith::binary;
use super::TcError;
use crate::ast::{Opcode, Type};
use crate::stack::TypeStack;

use Type as T;

/// Operations on two amounts. Any other pair of operands is rejected with
/// [TcError::Operand] naming `mutez` as the only accepted type.
fn both_mutez(instr: Opcode, stack: &mut TypeStack, res: Type) -> Result<(), TcError> {
    binary(instr, stack, &[T::Mutez], |l, r| {
        matches!((l, r), (T::Mutez, T::Mutez)).then(|| res.clone())
    })
}

pub(super) fn add(stack: &mut TypeStack) -> Result<(), TcError> {
    both_mutez(Opcode::ADD, stack, T::Mutez)
}

/// `SUB_MUTEZ`: `None` when the result would be negative.
pub(super) fn sub_mutez(stack: &mut TypeStack) -> Result<(), TcError> {
    both_mutez(Opcode::SUB_MUTEZ, stack, T::new_option(T::Mutez))
}

pub(super) fn compare(stack: &mut TypeStack) -> Result<(), TcError> {
    both_mutez(Opcode::COMPARE, stack, T::Int)
}

/// `MUL` of an amount by a natural, in either order.
pub(super) fn mul(stack: &mut TypeStack) -> Result<(), TcError> {
    binary(Opcode::MUL, stack, &[T::Mutez, T::Nat], |l, r| match (l, r) {
        (T::Mutez, T::Nat) | (T::Nat, T::Mutez) => Some(T::Mutez),
        _ => None,
    })
}

/// `EDIV` of an amount, by an amount (`option (pair nat mutez)`) or by a
/// natural (`option (pair mutez mutez)`).
pub(super) fn ediv(stack: &mut TypeStack) -> Result<(), TcError> {
    binary(Opcode::EDIV, stack, &[T::Mutez, T::Nat], |l, r| match (l, r) {
        (T::Mutez, T::Mutez) => Some(T::new_option(T::new_pair(T::Nat, T::Mutez))),
        (T::Mutez, T::Nat) => Some(T::new_option(T::new_pair(T::Mutez, T::Mutez))),
        _ => None,
    })
}
