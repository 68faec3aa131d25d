/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

use super::branch::{generic_if, BranchPrep};
use super::{ensure_stack_len, top_types, type_arg, TcError};
use crate::ast::{Instr, Opcode, Type};
use crate::context::Ctx;
use crate::stack::TypeStack;

/// `IF_NONE { none } { some }`: the second branch sees the unwrapped value.
pub(super) fn if_none(ctx: &mut Ctx, stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    generic_if(
        ctx,
        stack,
        i,
        BranchPrep::PopOption,
        BranchPrep::PopOptionPushInner,
    )
}

pub(super) fn some(stack: &mut TypeStack) -> Result<(), TcError> {
    ensure_stack_len(Opcode::SOME, stack, 1)?;
    let ty = stack.pop()?;
    stack.push(Type::new_option(ty));
    Ok(())
}

pub(super) fn none(stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    let ty = type_arg(i, 0)?;
    stack.push(Type::new_option(ty.clone()));
    Ok(())
}

/// `COMPARE` on two options of the same type.
pub(super) fn compare(stack: &mut TypeStack) -> Result<(), TcError> {
    ensure_stack_len(Opcode::COMPARE, stack, 2)?;
    match (&stack[0], &stack[1]) {
        (Type::Option(l), Type::Option(r)) if l.equals(r) => {
            stack.drop_top(2)?;
            stack.push(Type::Int);
            Ok(())
        }
        (Type::Option(l), _) => Err(TcError::StackTopType {
            instr: Opcode::COMPARE,
            expected: vec![Type::new_option((**l).clone()); 2],
            actual: top_types(stack, 2),
        }),
        _ => Err(TcError::StackTopType {
            instr: Opcode::COMPARE,
            expected: vec![Type::new_option(Type::type_var("a")); 2],
            actual: top_types(stack, 2),
        }),
    }
}
