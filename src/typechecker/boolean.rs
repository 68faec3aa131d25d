/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

use super::arith::{binary, unary};
use super::TcError;
use crate::ast::{Opcode, Type};
use crate::stack::TypeStack;

fn logical(instr: Opcode, stack: &mut TypeStack) -> Result<(), TcError> {
    binary(instr, stack, &[Type::Bool, Type::Nat], |l, r| {
        matches!((l, r), (Type::Bool, Type::Bool)).then_some(Type::Bool)
    })
}

pub(super) fn or(stack: &mut TypeStack) -> Result<(), TcError> {
    logical(Opcode::OR, stack)
}

pub(super) fn and(stack: &mut TypeStack) -> Result<(), TcError> {
    logical(Opcode::AND, stack)
}

pub(super) fn xor(stack: &mut TypeStack) -> Result<(), TcError> {
    logical(Opcode::XOR, stack)
}

pub(super) fn not(stack: &mut TypeStack) -> Result<(), TcError> {
    unary(Opcode::NOT, stack, &[Type::Bool], |t| {
        (*t == Type::Bool).then_some(Type::Bool)
    })
}
