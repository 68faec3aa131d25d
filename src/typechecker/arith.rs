/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

//! Integer and natural number arithmetic.

use super::{ensure_stack_len, top_types, TcError};
use crate::ast::{Opcode, Type};
use crate::stack::TypeStack;

use Type as T;

/// Replace the top two elements with the result of `rule`, called with the
/// top element first. `rule` returning `None` means the operands are not
/// accepted.
pub(super) fn binary(
    instr: Opcode,
    stack: &mut TypeStack,
    accepted: &[Type],
    rule: impl Fn(&Type, &Type) -> Option<Type>,
) -> Result<(), TcError> {
    ensure_stack_len(instr, stack, 2)?;
    let res = rule(&stack[0], &stack[1]).ok_or_else(|| TcError::Operand {
        instr,
        accepted: accepted.to_vec(),
        actual: top_types(stack, 2),
    })?;
    stack.drop_top(2)?;
    stack.push(res);
    Ok(())
}

pub(super) fn unary(
    instr: Opcode,
    stack: &mut TypeStack,
    accepted: &[Type],
    rule: impl Fn(&Type) -> Option<Type>,
) -> Result<(), TcError> {
    ensure_stack_len(instr, stack, 1)?;
    match rule(&stack[0]) {
        Some(res) => {
            stack[0] = res;
            Ok(())
        }
        None if accepted.len() == 1 => Err(TcError::StackTopType {
            instr,
            expected: accepted.to_vec(),
            actual: vec![stack[0].clone()],
        }),
        None => Err(TcError::Operand {
            instr,
            accepted: accepted.to_vec(),
            actual: vec![stack[0].clone()],
        }),
    }
}

/// `int` unless both operands are naturals.
fn widen(l: &Type, r: &Type) -> Option<Type> {
    match (l, r) {
        (T::Nat, T::Nat) => Some(T::Nat),
        (T::Int | T::Nat, T::Int | T::Nat) => Some(T::Int),
        _ => None,
    }
}

pub(super) fn add(stack: &mut TypeStack) -> Result<(), TcError> {
    binary(Opcode::ADD, stack, &[T::Int, T::Nat, T::Mutez], widen)
}

pub(super) fn mul(stack: &mut TypeStack) -> Result<(), TcError> {
    binary(Opcode::MUL, stack, &[T::Int, T::Nat, T::Mutez], widen)
}

/// There is no natural subtraction: the result is always `int`.
pub(super) fn sub(stack: &mut TypeStack) -> Result<(), TcError> {
    binary(Opcode::SUB, stack, &[T::Int, T::Nat, T::Datetime], |l, r| {
        widen(l, r).map(|_| T::Int)
    })
}

/// `EDIV`: quotient and remainder, or `None` on division by zero.
pub(super) fn ediv(stack: &mut TypeStack) -> Result<(), TcError> {
    binary(Opcode::EDIV, stack, &[T::Int, T::Nat, T::Mutez], |l, r| {
        let quotient = widen(l, r)?;
        Some(T::new_option(T::new_pair(quotient, T::Nat)))
    })
}

pub(super) fn or(stack: &mut TypeStack) -> Result<(), TcError> {
    binary(Opcode::OR, stack, &[T::Nat, T::Bool], |l, r| match (l, r) {
        (T::Nat, T::Nat) => Some(T::Nat),
        _ => None,
    })
}

pub(super) fn xor(stack: &mut TypeStack) -> Result<(), TcError> {
    binary(Opcode::XOR, stack, &[T::Nat, T::Bool], |l, r| match (l, r) {
        (T::Nat, T::Nat) => Some(T::Nat),
        _ => None,
    })
}

/// `AND` on naturals, or an integer masked by a natural.
pub(super) fn and(stack: &mut TypeStack) -> Result<(), TcError> {
    binary(Opcode::AND, stack, &[T::Int, T::Nat, T::Bool], |l, r| {
        match (l, r) {
            (T::Nat | T::Int, T::Nat) => Some(T::Nat),
            _ => None,
        }
    })
}

pub(super) fn not(stack: &mut TypeStack) -> Result<(), TcError> {
    unary(Opcode::NOT, stack, &[T::Int, T::Nat, T::Bool], |t| {
        matches!(t, T::Int | T::Nat).then_some(T::Int)
    })
}

pub(super) fn neg(stack: &mut TypeStack) -> Result<(), TcError> {
    unary(Opcode::NEG, stack, &[T::Int, T::Nat], |t| {
        matches!(t, T::Int | T::Nat).then_some(T::Int)
    })
}

pub(super) fn abs(stack: &mut TypeStack) -> Result<(), TcError> {
    unary(Opcode::ABS, stack, &[T::Int], |t| {
        (*t == T::Int).then_some(T::Nat)
    })
}

pub(super) fn isnat(stack: &mut TypeStack) -> Result<(), TcError> {
    unary(Opcode::ISNAT, stack, &[T::Int], |t| {
        (*t == T::Int).then(|| T::new_option(T::Nat))
    })
}

pub(super) fn int(stack: &mut TypeStack) -> Result<(), TcError> {
    unary(Opcode::INT, stack, &[T::Nat], |t| {
        (*t == T::Nat).then_some(T::Int)
    })
}

/// `COMPARE` on two integers or two naturals.
pub(super) fn compare(stack: &mut TypeStack) -> Result<(), TcError> {
    binary(Opcode::COMPARE, stack, &[T::Int, T::Nat], |l, r| match (l, r) {
        (T::Int, T::Int) | (T::Nat, T::Nat) => Some(T::Int),
        _ => None,
    })
}
