/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

//! Stack manipulation and lambdas.

use super::{
    ensure_stack_len, invalid, nat_arg, opt_nat_arg, seq_arg, type_arg, typecheck, TcError,
};
use crate::ast::{Arg, Instr, Literal, Opcode, Type};
use crate::context::Ctx;
use crate::stack::TypeStack;
use crate::tc_stk;

/// Whether a literal of this kind may be pushed with type `ty`. Only the kind
/// is checked, not the value.
fn literal_fits(ty: &Type, lit: &Literal) -> bool {
    use Type as T;
    matches!(
        (ty, lit),
        (T::Int | T::Nat | T::Mutez, Literal::Int(_))
            | (T::String | T::Address, Literal::String(_))
            | (T::Bool, Literal::Bool(_))
            | (T::Unit, Literal::Unit)
            | (T::Bytes, Literal::Bytes(_))
            | (T::Datetime, Literal::Int(_) | Literal::String(_))
    )
}

pub(super) fn push(stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    let ty = type_arg(i, 0)?;
    let Some(Arg::Literal(lit)) = i.args.get(1) else {
        return Err(invalid(Opcode::PUSH, "argument 1 must be a literal"));
    };
    if !literal_fits(ty, lit) {
        return Err(TcError::PushType {
            ty: ty.clone(),
            literal: lit.clone(),
        });
    }
    stack.push(ty.clone());
    Ok(())
}

pub(super) fn drop(stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    let n = opt_nat_arg(i)?.unwrap_or(1);
    ensure_stack_len(Opcode::DROP, stack, n)?;
    stack.drop_top(n)?;
    Ok(())
}

pub(super) fn dup(stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    let n = opt_nat_arg(i)?.unwrap_or(1);
    if n == 0 {
        return Err(invalid(Opcode::DUP, "DUP 0 is forbidden"));
    }
    ensure_stack_len(Opcode::DUP, stack, n)?;
    let ty = stack[n - 1].clone();
    stack.push(ty);
    Ok(())
}

pub(super) fn dig(stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    let n = nat_arg(i, 0)?;
    ensure_stack_len(Opcode::DIG, stack, n.saturating_add(1))?;
    let ty = stack.delete_at_depth(n)?;
    stack.push(ty);
    Ok(())
}

pub(super) fn dug(stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    let n = nat_arg(i, 0)?;
    ensure_stack_len(Opcode::DUG, stack, n.saturating_add(1))?;
    let ty = stack.pop()?;
    stack.insert_at_depth(n, ty)?;
    Ok(())
}

pub(super) fn swap(stack: &mut TypeStack) -> Result<(), TcError> {
    ensure_stack_len(Opcode::SWAP, stack, 2)?;
    let top = stack.pop()?;
    stack.insert_at_depth(1, top)?;
    Ok(())
}

/// `LAMBDA arg ret { body }`. The body is checked on a stack holding only
/// `arg` and must leave exactly `ret`.
pub(super) fn lambda(ctx: &mut Ctx, stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    let arg = type_arg(i, 0)?;
    let ret = type_arg(i, 1)?;
    let body = seq_arg(i, 2)?;
    let mut body_stack = tc_stk![arg.clone()];
    ctx.scoped(Opcode::LAMBDA, |ctx| typecheck(ctx, &mut body_stack, body))?;
    if !body_stack.is_failed() {
        if body_stack.len() != 1 {
            return Err(TcError::StackLength {
                instr: Some(Opcode::LAMBDA),
                expected: 1,
                actual: body_stack.len(),
            });
        }
        if !body_stack[0].equals(ret) {
            return Err(TcError::LambdaArgumentType {
                instr: Opcode::LAMBDA,
                expected: ret.clone(),
                actual: body_stack[0].clone(),
            });
        }
    }
    stack.push(Type::new_function(arg.clone(), ret.clone(), body.to_vec()));
    Ok(())
}

fn any_lambda() -> Type {
    Type::new_function(Type::type_var("a"), Type::type_var("b"), Vec::new())
}

/// `EXEC`: `arg : lambda arg ret -> ret`.
pub(super) fn exec(stack: &mut TypeStack) -> Result<(), TcError> {
    ensure_stack_len(Opcode::EXEC, stack, 2)?;
    let Type::FunctionPrototype(fp) = &stack[1] else {
        return Err(TcError::WrongConstructor {
            instr: Opcode::EXEC,
            expected: any_lambda(),
            actual: stack[1].clone(),
        });
    };
    let arg = stack[0].simplify();
    if !arg.equals(&fp.arg.simplify()) {
        return Err(TcError::LambdaArgumentType {
            instr: Opcode::EXEC,
            expected: fp.arg.clone(),
            actual: stack[0].clone(),
        });
    }
    let ret = fp.ret.clone();
    stack.drop_top(2)?;
    stack.push(ret);
    Ok(())
}

/// `APPLY`: `'T : lambda (pair 'T 'U) 'V -> lambda 'U 'V`. The lambda
/// argument may also be a record, standing for its pair shape.
pub(super) fn apply(stack: &mut TypeStack) -> Result<(), TcError> {
    ensure_stack_len(Opcode::APPLY, stack, 2)?;
    let mismatch = |stack: &TypeStack| {
        let var = Type::type_var;
        TcError::StackTopType {
            instr: Opcode::APPLY,
            expected: vec![
                var("T"),
                Type::new_function(Type::new_pair(var("T"), var("U")), var("V"), Vec::new()),
            ],
            actual: vec![stack[0].clone(), stack[1].clone()],
        }
    };
    let Type::FunctionPrototype(fp) = &stack[1] else {
        return Err(mismatch(stack));
    };
    let Type::Pair(arg) = fp.arg.simplify() else {
        return Err(mismatch(stack));
    };
    let (car, cdr) = *arg;
    if !car.equals(&stack[0].simplify()) {
        return Err(mismatch(stack));
    }
    let mut applied = (**fp).clone();
    applied.arg = cdr;
    let partial = stack.pop()?;
    applied.applied_args.push(partial);
    stack[0] = Type::FunctionPrototype(Box::new(applied));
    Ok(())
}
