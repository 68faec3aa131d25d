/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

use super::arith::unary;
use super::TcError;
use crate::ast::{Opcode, Type};
use crate::stack::TypeStack;

/// Hash functions: `bytes -> bytes`.
pub(super) fn hash(stack: &mut TypeStack, instr: Opcode) -> Result<(), TcError> {
    unary(instr, stack, &[Type::Bytes], |t| {
        (*t == Type::Bytes).then_some(Type::Bytes)
    })
}
