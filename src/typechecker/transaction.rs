/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

//! Addresses, contract handles and operations.

use super::arith::{binary, unary};
use super::{ensure_stack_len, top_types, type_arg, TcError};
use crate::ast::{Instr, Opcode, Type};
use crate::stack::TypeStack;

/// `ADDRESS`: `contract a -> address`.
pub(super) fn address(stack: &mut TypeStack) -> Result<(), TcError> {
    ensure_stack_len(Opcode::ADDRESS, stack, 1)?;
    match &stack[0] {
        Type::Contract(_) => {
            stack[0] = Type::Address;
            Ok(())
        }
        t => Err(TcError::StackTopType {
            instr: Opcode::ADDRESS,
            expected: vec![Type::new_contract(Type::type_var("a"))],
            actual: vec![t.clone()],
        }),
    }
}

/// `CONTRACT T`: `address -> option (contract T)`.
pub(super) fn contract(stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    let ty = type_arg(i, 0)?;
    unary(Opcode::CONTRACT, stack, &[Type::Address], |t| {
        (*t == Type::Address).then(|| Type::new_option(Type::new_contract(ty.clone())))
    })
}

/// `TRANSFER_TOKENS`: `arg : mutez : contract arg -> operation`.
pub(super) fn transfer_tokens(stack: &mut TypeStack) -> Result<(), TcError> {
    ensure_stack_len(Opcode::TRANSFER_TOKENS, stack, 3)?;
    let ok = match (&stack[0], &stack[1], &stack[2]) {
        (arg, Type::Mutez, Type::Contract(param)) => arg.equals(param),
        _ => false,
    };
    if !ok {
        let a = || Type::type_var("a");
        return Err(TcError::StackTopType {
            instr: Opcode::TRANSFER_TOKENS,
            expected: vec![a(), Type::Mutez, Type::new_contract(a())],
            actual: top_types(stack, 3),
        });
    }
    stack.drop_top(3)?;
    stack.push(Type::Operation);
    Ok(())
}

pub(super) fn compare_address(stack: &mut TypeStack) -> Result<(), TcError> {
    binary(Opcode::COMPARE, stack, &[Type::Address], |l, r| {
        matches!((l, r), (Type::Address, Type::Address)).then_some(Type::Int)
    })
}
