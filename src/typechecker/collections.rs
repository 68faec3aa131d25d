/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

//! Lists, sets, maps and big maps.

use super::branch::{generic_if, BranchPrep};
use super::{ensure_stack_len, seq_arg, top_types, type_arg, typecheck, TcError};
use crate::ast::{Instr, Opcode, Type};
use crate::context::Ctx;
use crate::stack::TypeStack;

fn var(name: &str) -> Type {
    Type::type_var(name)
}

/// Key and value types of a map or big map.
fn map_kv(ty: &Type) -> Option<&(Type, Type)> {
    match ty {
        Type::Dict(kv) | Type::BigMap(kv) => Some(kv),
        _ => None,
    }
}

fn not_a_map(instr: Opcode, stack: &TypeStack, n: usize) -> TcError {
    TcError::Operand {
        instr,
        accepted: vec![
            Type::new_dict(var("k"), var("v")),
            Type::new_big_map(var("k"), var("v")),
        ],
        actual: top_types(stack, n),
    }
}

fn not_updatable(stack: &TypeStack) -> TcError {
    TcError::Operand {
        instr: Opcode::UPDATE,
        accepted: vec![
            Type::new_set(var("a")),
            Type::new_dict(var("k"), var("v")),
            Type::new_big_map(var("k"), var("v")),
        ],
        actual: top_types(stack, 3),
    }
}

/// `IF_CONS { cons } { nil }`: the first branch sees the head on top of the
/// tail.
pub(super) fn if_cons(ctx: &mut Ctx, stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    generic_if(
        ctx,
        stack,
        i,
        BranchPrep::PopListPushHeadTail,
        BranchPrep::PopList,
    )
}

/// `ITER { body }` over a list, a set or a map. The body gets each element on
/// top of the stack and must consume it, leaving the rest unchanged.
pub(super) fn iter(ctx: &mut Ctx, stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    let body = seq_arg(i, 0)?;
    ensure_stack_len(Opcode::ITER, stack, 1)?;
    let elem = match &stack[0] {
        Type::List(t) | Type::Set(t) => (**t).clone(),
        Type::Dict(kv) => Type::new_pair(kv.0.clone(), kv.1.clone()),
        t => {
            return Err(TcError::Operand {
                instr: Opcode::ITER,
                accepted: vec![
                    Type::new_list(var("a")),
                    Type::new_set(var("a")),
                    Type::new_dict(var("k"), var("v")),
                ],
                actual: vec![t.clone()],
            })
        }
    };
    stack.pop()?;
    let mut body_stack = stack.fork();
    body_stack.push(elem);
    ctx.scoped(Opcode::ITER, |ctx| typecheck(ctx, &mut body_stack, body))?;
    if body_stack.is_failed() {
        return Ok(());
    }
    if body_stack.len() != stack.len() {
        return Err(TcError::StackLength {
            instr: Some(Opcode::ITER),
            expected: stack.len(),
            actual: body_stack.len(),
        });
    }
    if !body_stack.equals(stack) {
        return Err(TcError::StackTopType {
            instr: Opcode::ITER,
            expected: top_types(stack, stack.len()),
            actual: top_types(&body_stack, body_stack.len()),
        });
    }
    Ok(())
}

pub(super) fn nil(stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    stack.push(Type::new_list(type_arg(i, 0)?.clone()));
    Ok(())
}

/// `CONS`: `a : list a -> list a`.
pub(super) fn cons(stack: &mut TypeStack) -> Result<(), TcError> {
    ensure_stack_len(Opcode::CONS, stack, 2)?;
    match (&stack[0], &stack[1]) {
        (elem, Type::List(t)) if elem.equals(t) => {
            stack.pop()?;
            Ok(())
        }
        _ => Err(TcError::StackTopType {
            instr: Opcode::CONS,
            expected: vec![var("a"), Type::new_list(var("a"))],
            actual: top_types(stack, 2),
        }),
    }
}

pub(super) fn empty_set(stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    stack.push(Type::new_set(type_arg(i, 0)?.clone()));
    Ok(())
}

pub(super) fn empty_map(stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    let (k, v) = (type_arg(i, 0)?, type_arg(i, 1)?);
    stack.push(Type::new_dict(k.clone(), v.clone()));
    Ok(())
}

pub(super) fn empty_big_map(stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    let (k, v) = (type_arg(i, 0)?, type_arg(i, 1)?);
    stack.push(Type::new_big_map(k.clone(), v.clone()));
    Ok(())
}

/// `SIZE` on a list, a set or a map. Strings and bytes are handled with the
/// other string instructions.
pub(super) fn size(stack: &mut TypeStack) -> Result<(), TcError> {
    ensure_stack_len(Opcode::SIZE, stack, 1)?;
    match &stack[0] {
        Type::List(_) | Type::Set(_) | Type::Dict(_) => {
            stack[0] = Type::Nat;
            Ok(())
        }
        t => Err(TcError::Operand {
            instr: Opcode::SIZE,
            accepted: vec![
                Type::String,
                Type::Bytes,
                Type::new_list(var("a")),
                Type::new_set(var("a")),
                Type::new_dict(var("k"), var("v")),
            ],
            actual: vec![t.clone()],
        }),
    }
}

/// `MEM`: `a : set a -> bool`.
pub(super) fn mem_set(stack: &mut TypeStack) -> Result<(), TcError> {
    ensure_stack_len(Opcode::MEM, stack, 2)?;
    let Type::Set(elem) = &stack[1] else {
        return Err(TcError::StackTopType {
            instr: Opcode::MEM,
            expected: vec![var("a"), Type::new_set(var("a"))],
            actual: top_types(stack, 2),
        });
    };
    if !stack[0].equals(elem) {
        return Err(TcError::SetElementType {
            instr: Opcode::MEM,
            element: stack[0].clone(),
            set: stack[1].clone(),
        });
    }
    stack.drop_top(2)?;
    stack.push(Type::Bool);
    Ok(())
}

/// Checks `key : map` on top of the stack, returning the map value type.
fn check_key(instr: Opcode, stack: &TypeStack) -> Result<Type, TcError> {
    let (k, v) = map_kv(&stack[1]).ok_or_else(|| not_a_map(instr, stack, 2))?;
    if !stack[0].equals(k) {
        return Err(TcError::MapKeyType {
            instr,
            key: stack[0].clone(),
            map: stack[1].clone(),
        });
    }
    Ok(v.clone())
}

/// `MEM`: `k : map k v -> bool`, also on big maps.
pub(super) fn mem_map(stack: &mut TypeStack) -> Result<(), TcError> {
    ensure_stack_len(Opcode::MEM, stack, 2)?;
    check_key(Opcode::MEM, stack)?;
    stack.drop_top(2)?;
    stack.push(Type::Bool);
    Ok(())
}

/// `GET`: `k : map k v -> option v`, also on big maps.
pub(super) fn get_map(stack: &mut TypeStack) -> Result<(), TcError> {
    ensure_stack_len(Opcode::GET, stack, 2)?;
    let v = check_key(Opcode::GET, stack)?;
    stack.drop_top(2)?;
    stack.push(Type::new_option(v));
    Ok(())
}

/// `UPDATE`: `a : bool : set a -> set a`.
pub(super) fn update_set(stack: &mut TypeStack) -> Result<(), TcError> {
    ensure_stack_len(Opcode::UPDATE, stack, 3)?;
    let Type::Set(elem) = &stack[2] else {
        return Err(not_updatable(stack));
    };
    if !stack[0].equals(elem) {
        return Err(TcError::SetElementType {
            instr: Opcode::UPDATE,
            element: stack[0].clone(),
            set: stack[2].clone(),
        });
    }
    if stack[1] != Type::Bool {
        return Err(TcError::StackTopType {
            instr: Opcode::UPDATE,
            expected: vec![(**elem).clone(), Type::Bool, stack[2].clone()],
            actual: top_types(stack, 3),
        });
    }
    stack.drop_top(2)?;
    Ok(())
}

/// `UPDATE`: `k : option v : map k v -> map k v`, also on big maps.
pub(super) fn update_map(stack: &mut TypeStack) -> Result<(), TcError> {
    ensure_stack_len(Opcode::UPDATE, stack, 3)?;
    let (k, v) = map_kv(&stack[2]).ok_or_else(|| not_updatable(stack))?;
    if !stack[0].equals(k) {
        return Err(TcError::MapKeyType {
            instr: Opcode::UPDATE,
            key: stack[0].clone(),
            map: stack[2].clone(),
        });
    }
    match &stack[1] {
        Type::Option(val) if val.equals(v) => {}
        val => {
            return Err(TcError::MapValueType {
                instr: Opcode::UPDATE,
                value: val.clone(),
                map: stack[2].clone(),
            })
        }
    }
    stack.drop_top(2)?;
    Ok(())
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
    fn nil_and_cons() {
        let mut stk = tc_stk![T::Nat];
        assert_eq!(check(&mut stk, instr!(NIL, T::Nat)), Ok(()));
        assert_eq!(check(&mut stk, instr!(SWAP)), Ok(()));
        assert_eq!(check(&mut stk, instr!(CONS)), Ok(()));
        assert_eq!(stk, tc_stk![T::new_list(T::Nat)]);
    }

    #[test]
    fn cons_mismatch() {
        let mut stk = tc_stk![T::new_list(T::Nat), T::Int];
        assert_eq!(
            check(&mut stk, instr!(CONS)),
            Err(TcError::StackTopType {
                instr: Opcode::CONS,
                expected: vec![var("a"), T::new_list(var("a"))],
                actual: vec![T::Int, T::new_list(T::Nat)],
            })
        );
    }

    #[test]
    fn empty_collections() {
        let mut stk = tc_stk![];
        assert_eq!(check(&mut stk, instr!(EMPTY_SET, T::Nat)), Ok(()));
        assert_eq!(check(&mut stk, instr!(EMPTY_MAP, T::String, T::Int)), Ok(()));
        assert_eq!(
            check(&mut stk, instr!(EMPTY_BIG_MAP, T::Address, T::Mutez)),
            Ok(())
        );
        assert_eq!(
            stk,
            tc_stk![
                T::new_set(T::Nat),
                T::new_dict(T::String, T::Int),
                T::new_big_map(T::Address, T::Mutez)
            ]
        );
        assert_eq!(
            check(&mut stk, instr!(EMPTY_MAP, T::String)).unwrap_err().kind(),
            ErrorKind::InvalidMichelson
        );
    }

    #[test]
    fn iter_over_collections() {
        for (coll, body) in [
            (T::new_list(T::Nat), vec![instr!(DROP)]),
            (T::new_set(T::Int), vec![instr!(DROP)]),
            (T::new_dict(T::String, T::Nat), vec![instr!(CDR), instr!(DROP)]),
        ] {
            let mut stk = tc_stk![T::Unit, coll];
            assert_eq!(check(&mut stk, instr!(ITER, body)), Ok(()));
            assert_eq!(stk, tc_stk![T::Unit]);
        }
    }

    #[test]
    fn iter_accumulates() {
        let mut stk = tc_stk![T::Int, T::new_list(T::Nat)];
        assert_eq!(check(&mut stk, instr!(ITER, vec![instr!(ADD)])), Ok(()));
        assert_eq!(stk, tc_stk![T::Int]);
    }

    #[test]
    fn iter_must_keep_length() {
        let mut stk = tc_stk![T::new_list(T::Nat)];
        assert_eq!(
            check(&mut stk, instr!(ITER, vec![])),
            Err(TcError::StackLength {
                instr: Some(Opcode::ITER),
                expected: 0,
                actual: 1
            })
        );
        let mut stk = tc_stk![T::Nat, T::new_list(T::Nat)];
        assert_eq!(
            check(&mut stk, instr!(ITER, vec![instr!(DROP), instr!(INT)])),
            Err(TcError::StackTopType {
                instr: Opcode::ITER,
                expected: vec![T::Nat],
                actual: vec![T::Int],
            })
        );
    }

    #[test]
    fn iter_not_iterable() {
        let mut stk = tc_stk![T::Nat];
        assert_eq!(
            check(&mut stk, instr!(ITER, vec![])).unwrap_err().kind(),
            ErrorKind::Operand
        );
    }

    #[test]
    fn iter_failing_body() {
        let mut stk = tc_stk![T::Unit, T::new_list(T::String)];
        assert_eq!(check(&mut stk, instr!(ITER, vec![instr!(FAILWITH)])), Ok(()));
        assert_eq!(stk, tc_stk![T::Unit]);
    }

    #[test]
    fn if_cons() {
        let mut stk = tc_stk![T::new_list(T::Nat)];
        let i = instr!(
            IF_CONS,
            vec![instr!(DROP), instr!(SIZE)],
            vec![instr!(PUSH, T::Nat, 0)]
        );
        assert_eq!(check(&mut stk, i), Ok(()));
        assert_eq!(stk, tc_stk![T::Nat]);

        let mut stk = tc_stk![T::new_list(T::Nat)];
        let i = instr!(IF_CONS, vec![instr!(SWAP), instr!(DROP)], vec![]);
        assert_eq!(
            check(&mut stk, i),
            Err(TcError::ConditionBranchesMismatch {
                instr: Opcode::IF_CONS,
                true_branch: tc_stk![T::Nat],
                false_branch: tc_stk![],
            })
        );
    }

    #[test]
    fn size() {
        let mut stk = tc_stk![T::new_big_map(T::Nat, T::Nat)];
        assert_eq!(
            check(&mut stk, instr!(SIZE)).unwrap_err().kind(),
            ErrorKind::Operand
        );
    }

    #[test]
    fn mem() {
        let mut stk = tc_stk![T::new_set(T::Nat), T::Nat];
        assert_eq!(check(&mut stk, instr!(MEM)), Ok(()));
        assert_eq!(stk, tc_stk![T::Bool]);
        let mut stk = tc_stk![T::new_big_map(T::Address, T::Nat), T::Address];
        assert_eq!(check(&mut stk, instr!(MEM)), Ok(()));
        assert_eq!(stk, tc_stk![T::Bool]);

        let mut stk = tc_stk![T::new_set(T::Nat), T::Int];
        assert_eq!(
            check(&mut stk, instr!(MEM)),
            Err(TcError::SetElementType {
                instr: Opcode::MEM,
                element: T::Int,
                set: T::new_set(T::Nat),
            })
        );
        let mut stk = tc_stk![T::new_dict(T::Nat, T::Unit), T::Int];
        assert_eq!(
            check(&mut stk, instr!(MEM)),
            Err(TcError::MapKeyType {
                instr: Opcode::MEM,
                key: T::Int,
                map: T::new_dict(T::Nat, T::Unit),
            })
        );
        let mut stk = tc_stk![T::new_list(T::Nat), T::Nat];
        assert_eq!(
            check(&mut stk, instr!(MEM)).unwrap_err().kind(),
            ErrorKind::Operand
        );
    }

    #[test]
    fn get_map() {
        let mut stk = tc_stk![T::new_dict(T::String, T::Int), T::String];
        assert_eq!(check(&mut stk, instr!(GET)), Ok(()));
        assert_eq!(stk, tc_stk![T::new_option(T::Int)]);
        let mut stk = tc_stk![T::new_dict(T::String, T::Int), T::Nat];
        assert_eq!(
            check(&mut stk, instr!(GET)).unwrap_err().kind(),
            ErrorKind::MapKeyType
        );
        assert_eq!(
            check(&mut tc_stk![T::Nat], instr!(GET)),
            Err(TcError::StackLength {
                instr: Some(Opcode::GET),
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn update_set() {
        let set = T::new_set(T::String);
        let mut stk = tc_stk![set.clone(), T::Bool, T::Nat];
        assert_eq!(
            check(&mut stk, instr!(UPDATE)),
            Err(TcError::SetElementType {
                instr: Opcode::UPDATE,
                element: T::Nat,
                set: set.clone(),
            })
        );
        let mut stk = tc_stk![set.clone(), T::Nat, T::String];
        assert_eq!(
            check(&mut stk, instr!(UPDATE)),
            Err(TcError::StackTopType {
                instr: Opcode::UPDATE,
                expected: vec![T::String, T::Bool, set.clone()],
                actual: vec![T::String, T::Nat, set],
            })
        );
    }

    #[test]
    fn update_map() {
        let map = T::new_dict(T::String, T::Nat);
        let mut stk = tc_stk![map.clone(), T::new_option(T::Int), T::String];
        assert_eq!(
            check(&mut stk, instr!(UPDATE)),
            Err(TcError::MapValueType {
                instr: Opcode::UPDATE,
                value: T::new_option(T::Int),
                map: map.clone(),
            })
        );
        let mut stk = tc_stk![map.clone(), T::Nat, T::String];
        assert_eq!(
            check(&mut stk, instr!(UPDATE)).unwrap_err().kind(),
            ErrorKind::MapValueType
        );
        let mut stk = tc_stk![map, T::new_option(T::Nat), T::Nat];
        assert_eq!(
            check(&mut stk, instr!(UPDATE)).unwrap_err().kind(),
            ErrorKind::MapKeyType
        );
        let mut stk = tc_stk![T::Nat, T::new_option(T::Nat), T::Nat];
        assert_eq!(
            check(&mut stk, instr!(UPDATE)).unwrap_err().kind(),
            ErrorKind::Operand
        );
    }
}
