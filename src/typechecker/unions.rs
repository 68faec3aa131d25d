/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

use super::branch::{generic_if, BranchPrep};
use super::{ensure_stack_len, type_arg, TcError};
use crate::ast::{Instr, Opcode, Type};
use crate::context::Ctx;
use crate::stack::TypeStack;

/// `IF_LEFT { left } { right }`: each branch sees the payload of its arm.
pub(super) fn if_left(ctx: &mut Ctx, stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    generic_if(
        ctx,
        stack,
        i,
        BranchPrep::PopOrPushLeft,
        BranchPrep::PopOrPushRight,
    )
}

/// `LEFT r`: `l -> or l r`.
pub(super) fn left(stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    let r = type_arg(i, 0)?;
    ensure_stack_len(Opcode::LEFT, stack, 1)?;
    let l = stack.pop()?;
    stack.push(Type::new_or(l, r.clone()));
    Ok(())
}

/// `RIGHT l`: `r -> or l r`.
pub(super) fn right(stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    let l = type_arg(i, 0)?;
    ensure_stack_len(Opcode::RIGHT, stack, 1)?;
    let r = stack.pop()?;
    stack.push(Type::new_or(l.clone(), r));
    Ok(())
}
