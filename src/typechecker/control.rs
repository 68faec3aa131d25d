/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

use super::branch::{generic_if, BranchPrep};
use super::{ensure_stack_len, nat_arg, seq_arg, top_types, typecheck, TcError};
use crate::ast::{Arg, Instr, Opcode, Type};
use crate::context::Ctx;
use crate::stack::TypeStack;

pub(super) fn if_(ctx: &mut Ctx, stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    generic_if(ctx, stack, i, BranchPrep::PopBool, BranchPrep::PopBool)
}

/// `DIP n { body }`, `n` defaulting to 1. If the body diverges, so does the
/// whole stack.
pub(super) fn dip(ctx: &mut Ctx, stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    let (height, body) = match i.args.as_slice() {
        [Arg::Seq(body)] => (1, body.as_slice()),
        [_, _] => (nat_arg(i, 0)?, seq_arg(i, 1)?),
        _ => (1, seq_arg(i, 0)?),
    };
    ensure_stack_len(Opcode::DIP, stack, height)?;
    let failed = stack.protect(height, |protected| {
        ctx.scoped(Opcode::DIP, |ctx| typecheck(ctx, protected, body))?;
        Ok::<_, TcError>(protected.is_failed())
    })?;
    if failed {
        stack.fail();
    }
    Ok(())
}

/// `LOOP { body }`: pops a bool; the body must leave the stack as it found it
/// with a bool on top.
pub(super) fn loop_(ctx: &mut Ctx, stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    let body = seq_arg(i, 0)?;
    ensure_stack_len(Opcode::LOOP, stack, 1)?;
    if stack[0] != Type::Bool {
        return Err(TcError::StackTopType {
            instr: Opcode::LOOP,
            expected: vec![Type::Bool],
            actual: vec![stack[0].clone()],
        });
    }
    stack.pop()?;
    let mut body_stack = stack.fork();
    ctx.scoped(Opcode::LOOP, |ctx| typecheck(ctx, &mut body_stack, body))?;
    if body_stack.is_failed() {
        return Ok(());
    }
    let mut expected = stack.fork();
    expected.push(Type::Bool);
    if body_stack.len() != expected.len() {
        return Err(TcError::StackLength {
            instr: Some(Opcode::LOOP),
            expected: expected.len(),
            actual: body_stack.len(),
        });
    }
    if !body_stack.equals(&expected) {
        return Err(TcError::StackTopType {
            instr: Opcode::LOOP,
            expected: top_types(&expected, expected.len()),
            actual: top_types(&body_stack, body_stack.len()),
        });
    }
    Ok(())
}

pub(super) fn failwith(stack: &mut TypeStack) -> Result<(), TcError> {
    ensure_stack_len(Opcode::FAILWITH, stack, 1)?;
    stack.fail();
    Ok(())
}

/// `EQ`, `NEQ`, `LT`, `GT`, `LE`, `GE`: `int -> bool`.
pub(super) fn compare_result(stack: &mut TypeStack, instr: Opcode) -> Result<(), TcError> {
    ensure_stack_len(instr, stack, 1)?;
    match &stack[0] {
        Type::Int => {
            stack[0] = Type::Bool;
            Ok(())
        }
        t => Err(TcError::StackTopType {
            instr,
            expected: vec![Type::Int],
            actual: vec![t.clone()],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typechecker::{typecheck_instruction, ErrorKind};
    use crate::{instr, tc_stk};
    use Type as T;

    fn check(stack: &mut TypeStack, i: Instr) -> Result<(), TcError> {
        typecheck_instruction(&mut Ctx::default(), stack, &i)
    }

    #[test]
    fn dip_default_height() {
        let mut stk = tc_stk![T::Nat, T::String];
        assert_eq!(check(&mut stk, instr!(DIP, vec![instr!(INT)])), Ok(()));
        assert_eq!(stk, tc_stk![T::Int, T::String]);
    }

    #[test]
    fn dip_n() {
        let mut stk = tc_stk![T::Nat, T::Bool, T::String];
        assert_eq!(
            check(&mut stk, instr!(DIP, 2, vec![instr!(DROP), instr!(UNIT)])),
            Ok(())
        );
        assert_eq!(stk, tc_stk![T::Unit, T::Bool, T::String]);
    }

    #[test]
    fn dip_zero() {
        let mut stk = tc_stk![T::Nat];
        assert_eq!(check(&mut stk, instr!(DIP, 0, vec![instr!(INT)])), Ok(()));
        assert_eq!(stk, tc_stk![T::Int]);
    }

    #[test]
    fn dip_body_cannot_see_protected() {
        let mut stk = tc_stk![T::Nat];
        assert_eq!(
            check(&mut stk, instr!(DIP, vec![instr!(DROP)])),
            Err(TcError::StackLength {
                instr: Some(Opcode::DROP),
                expected: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn dip_too_short() {
        let mut stk = tc_stk![T::Nat];
        assert_eq!(
            check(&mut stk, instr!(DIP, 2, vec![])),
            Err(TcError::StackLength {
                instr: Some(Opcode::DIP),
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn dip_failing_body() {
        let mut stk = tc_stk![T::String, T::Nat];
        assert_eq!(check(&mut stk, instr!(DIP, vec![instr!(FAILWITH)])), Ok(()));
        assert!(stk.is_failed());
    }

    #[test]
    fn dip_malformed() {
        let mut stk = tc_stk![T::Nat];
        assert_eq!(
            check(&mut stk, instr!(DIP, 1, T::Nat)).unwrap_err().kind(),
            ErrorKind::InvalidMichelson
        );
        assert_eq!(
            check(&mut stk, instr!(DIP, -1, vec![])).unwrap_err().kind(),
            ErrorKind::InvalidMichelson
        );
    }

    #[test]
    fn loop_ok() {
        let mut stk = tc_stk![T::Nat, T::Bool];
        let body = vec![instr!(PUSH, T::Nat, 1), instr!(ADD), instr!(PUSH, T::Bool, false)];
        assert_eq!(check(&mut stk, instr!(LOOP, body)), Ok(()));
        assert_eq!(stk, tc_stk![T::Nat]);
    }

    #[test]
    fn loop_body_mismatch() {
        let mut stk = tc_stk![T::Nat, T::Bool];
        assert_eq!(
            check(&mut stk, instr!(LOOP, vec![instr!(DROP)])),
            Err(TcError::StackLength {
                instr: Some(Opcode::LOOP),
                expected: 2,
                actual: 0
            })
        );
        let mut stk = tc_stk![T::Nat, T::Bool];
        assert_eq!(
            check(&mut stk, instr!(LOOP, vec![instr!(INT), instr!(PUSH, T::Bool, true)])),
            Err(TcError::StackTopType {
                instr: Opcode::LOOP,
                expected: vec![T::Bool, T::Nat],
                actual: vec![T::Bool, T::Int],
            })
        );
    }

    #[test]
    fn loop_not_bool() {
        let mut stk = tc_stk![T::Nat];
        assert_eq!(
            check(&mut stk, instr!(LOOP, vec![])).unwrap_err().kind(),
            ErrorKind::StackTopType
        );
    }

    #[test]
    fn loop_failing_body() {
        let mut stk = tc_stk![T::Nat, T::Bool];
        assert_eq!(check(&mut stk, instr!(LOOP, vec![instr!(FAILWITH)])), Ok(()));
        assert_eq!(stk, tc_stk![T::Nat]);
    }

    #[test]
    fn failwith() {
        let mut stk = tc_stk![T::Nat, T::String];
        assert_eq!(check(&mut stk, instr!(FAILWITH)), Ok(()));
        assert_eq!(stk, tc_stk![T::Universal]);
        assert_eq!(
            check(&mut tc_stk![], instr!(FAILWITH)),
            Err(TcError::StackLength {
                instr: Some(Opcode::FAILWITH),
                expected: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn comparison_results() {
        for i in [instr!(EQ), instr!(NEQ), instr!(LT), instr!(GT), instr!(LE), instr!(GE)] {
            let mut stk = tc_stk![T::Int];
            assert_eq!(check(&mut stk, i), Ok(()));
            assert_eq!(stk, tc_stk![T::Bool]);
        }
        let mut stk = tc_stk![T::Nat];
        assert_eq!(
            check(&mut stk, instr!(GT)),
            Err(TcError::StackTopType {
                instr: Opcode::GT,
                expected: vec![T::Int],
                actual: vec![T::Nat],
            })
        );
    }

    #[test]
    fn if_uses_bool() {
        let mut stk = tc_stk![T::Bool];
        assert_eq!(
            check(&mut stk, instr!(IF, vec![instr!(UNIT)], vec![instr!(UNIT)])),
            Ok(())
        );
        assert_eq!(stk, tc_stk![T::Unit]);
    }
}
