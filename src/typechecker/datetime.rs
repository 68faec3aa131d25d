/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

//! Timestamps.

use super::arith::binary;
use super::TcError;
use crate::ast::{Opcode, Type};
use crate::stack::TypeStack;

pub(super) fn now(stack: &mut TypeStack) {
    stack.push(Type::Datetime)
}

fn both_timestamps(instr: Opcode, stack: &mut TypeStack) -> Result<(), TcError> {
    binary(instr, stack, &[Type::Datetime], |l, r| {
        matches!((l, r), (Type::Datetime, Type::Datetime)).then_some(Type::Int)
    })
}

/// Difference in seconds.
pub(super) fn sub(stack: &mut TypeStack) -> Result<(), TcError> {
    both_timestamps(Opcode::SUB, stack)
}

pub(super) fn compare(stack: &mut TypeStack) -> Result<(), TcError> {
    both_timestamps(Opcode::COMPARE, stack)
}
