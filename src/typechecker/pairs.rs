/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

use super::{ensure_stack_len, invalid, TcError};
use crate::ast::{comb, Opcode, Type};
use crate::stack::TypeStack;

fn any_pair() -> Type {
    Type::new_pair(Type::type_var("a"), Type::type_var("b"))
}

/// Components of a pair, looking through one level of record.
fn split_pair(ty: &Type) -> Option<(Type, Type)> {
    match ty {
        Type::Pair(p) => Some((**p).clone()),
        Type::Record(r) => match r.shape() {
            Type::Pair(p) => Some(*p),
            _ => None,
        },
        _ => None,
    }
}

fn top_pair(instr: Opcode, stack: &TypeStack) -> Result<(Type, Type), TcError> {
    ensure_stack_len(instr, stack, 1)?;
    split_pair(&stack[0]).ok_or_else(|| TcError::StackTopType {
        instr,
        expected: vec![any_pair()],
        actual: vec![stack[0].clone()],
    })
}

pub(super) fn car(stack: &mut TypeStack) -> Result<(), TcError> {
    let (l, _) = top_pair(Opcode::CAR, stack)?;
    stack[0] = l;
    Ok(())
}

pub(super) fn cdr(stack: &mut TypeStack) -> Result<(), TcError> {
    let (_, r) = top_pair(Opcode::CDR, stack)?;
    stack[0] = r;
    Ok(())
}

pub(super) fn unpair(stack: &mut TypeStack) -> Result<(), TcError> {
    ensure_stack_len(Opcode::UNPAIR, stack, 1)?;
    let (l, r) = split_pair(&stack[0]).ok_or_else(|| TcError::WrongConstructor {
        instr: Opcode::UNPAIR,
        expected: any_pair(),
        actual: stack[0].clone(),
    })?;
    stack[0] = r;
    stack.push(l);
    Ok(())
}

/// `PAIR`: `a : b -> pair a b`.
pub(super) fn pair(stack: &mut TypeStack) -> Result<(), TcError> {
    ensure_stack_len(Opcode::PAIR, stack, 2)?;
    let l = stack.pop()?;
    let r = stack.pop()?;
    stack.push(Type::new_pair(l, r));
    Ok(())
}

/// `PAIR n`: folds the top `n` elements into a right comb, the top one
/// leftmost.
pub(super) fn pair_n(stack: &mut TypeStack, n: usize) -> Result<(), TcError> {
    if n < 2 {
        return Err(invalid(Opcode::PAIR, format!("PAIR {n} is forbidden, need at least 2")));
    }
    ensure_stack_len(Opcode::PAIR, stack, n)?;
    let tys = (0..n).map(|_| stack.pop()).collect::<Result<Vec<_>, _>>()?;
    let paired = comb::pair_n(tys).ok_or_else(|| invalid(Opcode::PAIR, "nothing to pair"))?;
    stack.push(paired);
    Ok(())
}

pub(super) fn get_n(stack: &mut TypeStack, n: usize) -> Result<(), TcError> {
    top_pair(Opcode::GET, stack)?;
    let whole = stack[0].simplify();
    let field = comb::get_n(&whole, n)
        .ok_or_else(|| invalid(Opcode::GET, format!("index {n} is out of range for {whole}")))?;
    stack[0] = field.clone();
    Ok(())
}

/// `UPDATE n`: `x : comb -> comb'`, with comb index `n` replaced by `x`.
pub(super) fn update_n(stack: &mut TypeStack, n: usize) -> Result<(), TcError> {
    ensure_stack_len(Opcode::UPDATE, stack, 2)?;
    if split_pair(&stack[1]).is_none() {
        return Err(TcError::StackTopType {
            instr: Opcode::UPDATE,
            expected: vec![Type::type_var("c"), any_pair()],
            actual: vec![stack[0].clone(), stack[1].clone()],
        });
    }
    let whole = stack[1].simplify();
    let updated = comb::update_n(&whole, n, stack[0].clone()).ok_or_else(|| {
        invalid(
            Opcode::UPDATE,
            format!("index {n} is out of range for {whole}"),
        )
    })?;
    stack.pop()?;
    stack[0] = updated;
    Ok(())
}
