/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

//! Strings and bytes, plus serialization.
//!
//! Instructions shared between both take the operand type they were routed
//! with, `string` or `bytes`.

use super::arith::{binary, unary};
use super::{ensure_stack_len, top_types, type_arg, TcError};
use crate::ast::{Instr, Opcode, Type};
use crate::stack::TypeStack;

pub(super) fn pack(stack: &mut TypeStack) -> Result<(), TcError> {
    ensure_stack_len(Opcode::PACK, stack, 1)?;
    stack[0] = Type::Bytes;
    Ok(())
}

/// `UNPACK T`: `bytes -> option T`.
pub(super) fn unpack(stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    let ty = type_arg(i, 0)?;
    unary(Opcode::UNPACK, stack, &[Type::Bytes], |t| {
        (*t == Type::Bytes).then(|| Type::new_option(ty.clone()))
    })
}

pub(super) fn compare(stack: &mut TypeStack, ty: Type) -> Result<(), TcError> {
    binary(Opcode::COMPARE, stack, &[ty.clone()], |l, r| {
        (*l == ty && *r == ty).then_some(Type::Int)
    })
}

pub(super) fn concat(stack: &mut TypeStack, ty: Type) -> Result<(), TcError> {
    binary(Opcode::CONCAT, stack, &[ty.clone()], |l, r| {
        (*l == ty && *r == ty).then(|| ty.clone())
    })
}

/// `SLICE`: `offset : length : s -> option s`.
pub(super) fn slice(stack: &mut TypeStack, ty: Type) -> Result<(), TcError> {
    ensure_stack_len(Opcode::SLICE, stack, 3)?;
    if stack.iter().take(3).ne([&Type::Nat, &Type::Nat, &ty]) {
        return Err(TcError::StackTopType {
            instr: Opcode::SLICE,
            expected: vec![Type::Nat, Type::Nat, ty],
            actual: top_types(stack, 3),
        });
    }
    stack.drop_top(3)?;
    stack.push(Type::new_option(ty));
    Ok(())
}

pub(super) fn size(stack: &mut TypeStack, ty: Type) -> Result<(), TcError> {
    unary(Opcode::SIZE, stack, &[ty.clone()], |t| {
        (*t == ty).then_some(Type::Nat)
    })
}
