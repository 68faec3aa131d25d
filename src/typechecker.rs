/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

//! Dispatch engine: walks an instruction sequence, routing every instruction
//! to its family checker, and the contract-level entry point.

mod arith;
mod boolean;
mod branch;
mod collections;
mod control;
mod crypto;
mod datetime;
mod mutez;
mod options;
mod pairs;
mod stack_ops;
mod strings;
mod transaction;
mod unions;

use std::{panic, thread};

use strum_macros::Display;
use tracing::{debug, warn, Dispatch};

use crate::ast::*;
use crate::context::Ctx;
use crate::stack::*;
use crate::tc_stk;

/// Typechecker error type.
///
/// Lists of types (`expected`, `actual`, `accepted`) describing stack
/// contents are written top first.
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
pub enum TcError {
    /// An instruction needs more elements than the stack holds.
    #[error("stack length mismatch{}: expected {expected}, got {actual}", in_instr(.instr))]
    StackLength {
        /// Failing instruction, if known.
        instr: Option<Opcode>,
        /// Required number of elements.
        expected: usize,
        /// Number of visible elements.
        actual: usize,
    },
    /// The top of the stack does not have the shape an instruction expects.
    #[error("{instr}: expected stack top [ {} ], got [ {} ]", types(.expected), types(.actual))]
    StackTopType {
        /// Failing instruction.
        instr: Opcode,
        /// Expected top types.
        expected: Vec<Type>,
        /// Actual top types.
        actual: Vec<Type>,
    },
    /// The operand combination is not one an overloaded instruction accepts.
    #[error("{instr}: operands [ {} ] are not accepted, expected {}", types(.actual), alternatives(.accepted))]
    Operand {
        /// Failing instruction.
        instr: Opcode,
        /// Types the instruction accepts.
        accepted: Vec<Type>,
        /// Actual operand types.
        actual: Vec<Type>,
    },
    /// A type is not an instance of the required type constructor.
    #[error("{instr}: expected a value of type {expected}, got {actual}")]
    WrongConstructor {
        /// Failing instruction.
        instr: Opcode,
        /// Required constructor, with type variables for its arguments.
        expected: Type,
        /// Actual type.
        actual: Type,
    },
    /// Malformed instruction: wrong arguments, or nesting too deep.
    #[error("invalid {instr}: {reason}")]
    InvalidMichelson {
        /// Malformed instruction.
        instr: Opcode,
        /// What is wrong with it.
        reason: String,
    },
    /// The branches of a conditional end with different stacks.
    #[error("{instr}: branches end with different stacks: {true_branch} and {false_branch}")]
    ConditionBranchesMismatch {
        /// The conditional.
        instr: Opcode,
        /// Stack at the end of the first branch.
        true_branch: TypeStack,
        /// Stack at the end of the second branch.
        false_branch: TypeStack,
    },
    /// A lambda body or argument does not match the declared lambda type.
    #[error("{instr}: expected lambda type {expected}, got {actual}")]
    LambdaArgumentType {
        /// Failing instruction.
        instr: Opcode,
        /// Declared type.
        expected: Type,
        /// Actual type.
        actual: Type,
    },
    /// The contract code does not end with `pair (list operation) storage`.
    #[error("contract must end with {expected}, got {actual}")]
    ContractReturnType {
        /// Final stack.
        actual: TypeStack,
        /// Required final stack.
        expected: TypeStack,
    },
    /// A key does not match the key type of a map.
    #[error("{instr}: key of type {key} does not match {map}")]
    MapKeyType {
        /// Failing instruction.
        instr: Opcode,
        /// Key type on the stack.
        key: Type,
        /// The map type.
        map: Type,
    },
    /// A value does not match the value type of a map.
    #[error("{instr}: value of type {value} does not match {map}")]
    MapValueType {
        /// Failing instruction.
        instr: Opcode,
        /// Value type on the stack.
        value: Type,
        /// The map type.
        map: Type,
    },
    /// An element does not match the element type of a set.
    #[error("{instr}: element of type {element} does not match {set}")]
    SetElementType {
        /// Failing instruction.
        instr: Opcode,
        /// Element type on the stack.
        element: Type,
        /// The set type.
        set: Type,
    },
    /// `PUSH` of a literal of the wrong kind.
    #[error("PUSH: literal {literal:?} is not a value of type {ty}")]
    PushType {
        /// Declared type.
        ty: Type,
        /// Pushed literal.
        literal: Literal,
    },
}

/// Kind of a [TcError], without its payload. Displays as the diagnostic name
/// the compiler driver reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorKind {
    /// [TcError::StackLength].
    #[strum(to_string = "StackLengthException")]
    StackLength,
    /// [TcError::StackTopType].
    #[strum(to_string = "StackTopTypeException")]
    StackTopType,
    /// [TcError::Operand].
    #[strum(to_string = "OperandException")]
    Operand,
    /// [TcError::WrongConstructor].
    #[strum(to_string = "TypeException")]
    WrongConstructor,
    /// [TcError::InvalidMichelson].
    #[strum(to_string = "InvalidMichelsonException")]
    InvalidMichelson,
    /// [TcError::ConditionBranchesMismatch].
    #[strum(to_string = "ConditionBranchesTypeMismatch")]
    ConditionBranchesMismatch,
    /// [TcError::LambdaArgumentType].
    #[strum(to_string = "LambdaArgumentTypeException")]
    LambdaArgumentType,
    /// [TcError::ContractReturnType].
    #[strum(to_string = "ContractReturnTypeException")]
    ContractReturnType,
    /// [TcError::MapKeyType].
    #[strum(to_string = "MapKeyTypeException")]
    MapKeyType,
    /// [TcError::MapValueType].
    #[strum(to_string = "MapValueTypeException")]
    MapValueType,
    /// [TcError::SetElementType].
    #[strum(to_string = "SetElementTypeException")]
    SetElementType,
    /// [TcError::PushType].
    #[strum(to_string = "PushTypeException")]
    PushType,
}

impl TcError {
    /// Kind of this error, see [ErrorKind].
    pub fn kind(&self) -> ErrorKind {
        use TcError::*;
        match self {
            StackLength { .. } => ErrorKind::StackLength,
            StackTopType { .. } => ErrorKind::StackTopType,
            Operand { .. } => ErrorKind::Operand,
            WrongConstructor { .. } => ErrorKind::WrongConstructor,
            InvalidMichelson { .. } => ErrorKind::InvalidMichelson,
            ConditionBranchesMismatch { .. } => ErrorKind::ConditionBranchesMismatch,
            LambdaArgumentType { .. } => ErrorKind::LambdaArgumentType,
            ContractReturnType { .. } => ErrorKind::ContractReturnType,
            MapKeyType { .. } => ErrorKind::MapKeyType,
            MapValueType { .. } => ErrorKind::MapValueType,
            SetElementType { .. } => ErrorKind::SetElementType,
            PushType { .. } => ErrorKind::PushType,
        }
    }
}

impl From<StackTooShort> for TcError {
    fn from(e: StackTooShort) -> Self {
        TcError::StackLength {
            instr: None,
            expected: e.expected,
            actual: e.actual,
        }
    }
}

fn in_instr(instr: &Option<Opcode>) -> String {
    instr.map_or_else(String::new, |i| format!(" in {i}"))
}

fn types(tys: &[Type]) -> String {
    tys.iter()
        .map(Type::to_string)
        .collect::<Vec<_>>()
        .join(" : ")
}

fn alternatives(tys: &[Type]) -> String {
    tys.iter()
        .map(Type::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Ensures type stack is at least of the required length, otherwise returns
/// `Err(StackLength)` naming the instruction.
pub(crate) fn ensure_stack_len(instr: Opcode, stack: &TypeStack, l: usize) -> Result<(), TcError> {
    stack.ensure_len(l).map_err(|e| TcError::StackLength {
        instr: Some(instr),
        expected: e.expected,
        actual: e.actual,
    })
}

/// Copies of the top `n` elements, top first. The stack must be long enough.
pub(crate) fn top_types(stack: &TypeStack, n: usize) -> Vec<Type> {
    stack.iter().take(n).cloned().collect()
}

pub(crate) fn invalid(instr: Opcode, reason: impl Into<String>) -> TcError {
    TcError::InvalidMichelson {
        instr,
        reason: reason.into(),
    }
}

pub(crate) fn type_arg(instr: &Instr, idx: usize) -> Result<&Type, TcError> {
    match instr.args.get(idx) {
        Some(Arg::Type(ty)) => Ok(ty),
        _ => Err(invalid(
            instr.opcode,
            format!("argument {idx} must be a type"),
        )),
    }
}

pub(crate) fn seq_arg(instr: &Instr, idx: usize) -> Result<&[Instr], TcError> {
    match instr.args.get(idx) {
        Some(Arg::Seq(body)) => Ok(body),
        _ => Err(invalid(
            instr.opcode,
            format!("argument {idx} must be a code sequence"),
        )),
    }
}

pub(crate) fn nat_arg(instr: &Instr, idx: usize) -> Result<usize, TcError> {
    let err = || {
        invalid(
            instr.opcode,
            format!("argument {idx} must be a non-negative integer"),
        )
    };
    match instr.args.get(idx) {
        Some(Arg::Literal(Literal::Int(n))) => usize::try_from(n).map_err(|_| err()),
        _ => Err(err()),
    }
}

/// Numeric argument of instructions that accept an optional one, like `DUP`
/// and `DROP`.
pub(crate) fn opt_nat_arg(instr: &Instr) -> Result<Option<usize>, TcError> {
    match instr.args.as_slice() {
        [] => Ok(None),
        [_] => nat_arg(instr, 0).map(Some),
        _ => Err(invalid(instr.opcode, "expected at most one argument")),
    }
}

fn check_arity(instr: &Instr) -> Result<(), TcError> {
    use Opcode::*;
    let (min, max) = match instr.opcode {
        // conditionals check their branches after the discriminant
        COMMENT | IF | IF_NONE | IF_LEFT | IF_CONS => return Ok(()),
        LAMBDA => (3, 3),
        PUSH | EMPTY_MAP | EMPTY_BIG_MAP => (2, 2),
        DIP => (1, 2),
        NONE | LEFT | RIGHT | NIL | EMPTY_SET | UNPACK | CONTRACT | ITER | LOOP | DIG | DUG => {
            (1, 1)
        }
        DUP | DROP | PAIR | GET | UPDATE => (0, 1),
        _ => (0, 0),
    };
    let n = instr.args.len();
    if n < min || n > max {
        return Err(invalid(
            instr.opcode,
            if min == max {
                format!("expected {min} arguments, got {n}")
            } else {
                format!("expected {min} to {max} arguments, got {n}")
            },
        ));
    }
    Ok(())
}

/// Typecheck a sequence in place. The rest of the sequence is skipped once
/// the stack has diverged.
///
/// Nested code is checked recursively on the caller's stack, so the caller
/// must provide room for [crate::context::TcConfig::max_nesting_depth]
/// levels, see [crate::context::TcConfig::stack_size]. [typecheck_fragment] and [typecheck_contract] take
/// care of that.
pub fn typecheck(ctx: &mut Ctx, stack: &mut TypeStack, instrs: &[Instr]) -> Result<(), TcError> {
    for i in instrs {
        typecheck_instruction(ctx, stack, i)?;
        if stack.is_failed() {
            break;
        }
    }
    Ok(())
}

/// Run [typecheck] on a thread whose stack fits the configured nesting depth.
/// Falls back to the current thread if it cannot be spawned.
fn typecheck_on_sized_stack(
    ctx: &mut Ctx,
    stack: &mut TypeStack,
    instrs: &[Instr],
) -> Result<(), TcError> {
    let size = ctx.config.stack_size();
    let dispatch = tracing::dispatcher::get_default(Dispatch::clone);
    let spawned = thread::scope(|s| {
        thread::Builder::new()
            .name("typechecker".into())
            .stack_size(size)
            .spawn_scoped(s, || {
                tracing::dispatcher::with_default(&dispatch, || typecheck(ctx, stack, instrs))
            })
            .map(|handle| handle.join().unwrap_or_else(|e| panic::resume_unwind(e)))
    });
    match spawned {
        Ok(res) => res,
        Err(err) => {
            warn!(%err, size, "cannot spawn typechecker thread, using the current one");
            typecheck(ctx, stack, instrs)
        }
    }
}

/// Typecheck a sequence against `stack`, returning the resulting stack.
pub fn typecheck_fragment(
    ctx: &mut Ctx,
    mut stack: TypeStack,
    instrs: &[Instr],
) -> Result<TypeStack, TcError> {
    typecheck_on_sized_stack(ctx, &mut stack, instrs)?;
    Ok(stack)
}

/// Typecheck a contract: its code must turn `pair parameter storage` into
/// `pair (list operation) storage`.
pub fn typecheck_contract(ctx: &mut Ctx, contract: &Contract) -> Result<(), TcError> {
    let mut stack = tc_stk![Type::new_pair(
        contract.parameter.clone(),
        contract.storage.clone()
    )];
    typecheck_on_sized_stack(ctx, &mut stack, &contract.code)?;
    let expected = tc_stk![Type::new_pair(
        Type::new_list(Type::Operation),
        contract.storage.simplify()
    )];
    if stack.len() != 1 || !stack.equals(&expected) {
        return Err(TcError::ContractReturnType {
            actual: stack,
            expected,
        });
    }
    Ok(())
}

/// Typecheck a single instruction, updating `stack`.
pub fn typecheck_instruction(
    ctx: &mut Ctx,
    stack: &mut TypeStack,
    i: &Instr,
) -> Result<(), TcError> {
    use Opcode::*;

    check_arity(i)?;

    match i.opcode {
        LAMBDA => stack_ops::lambda(ctx, stack, i)?,
        DIP => control::dip(ctx, stack, i)?,
        IF => control::if_(ctx, stack, i)?,
        LOOP => control::loop_(ctx, stack, i)?,
        IF_NONE => options::if_none(ctx, stack, i)?,
        IF_LEFT => unions::if_left(ctx, stack, i)?,
        IF_CONS => collections::if_cons(ctx, stack, i)?,
        ITER => collections::iter(ctx, stack, i)?,
        _ => typecheck_flat(stack, i)?,
    }

    debug!(instr = %i.opcode, %stack, "typechecked");
    Ok(())
}

/// Instructions without nested code. Out of line, so that each nesting level
/// of [typecheck_instruction] only costs a small frame.
#[inline(never)]
fn typecheck_flat(stack: &mut TypeStack, i: &Instr) -> Result<(), TcError> {
    use Opcode::*;
    use Type as T;

    match i.opcode {
        LAMBDA | DIP | IF | LOOP | IF_NONE | IF_LEFT | IF_CONS | ITER => {
            unreachable!("{} is checked by typecheck_instruction", i.opcode)
        }

        PUSH => stack_ops::push(stack, i)?,
        DROP => stack_ops::drop(stack, i)?,
        DUP => stack_ops::dup(stack, i)?,
        DIG => stack_ops::dig(stack, i)?,
        DUG => stack_ops::dug(stack, i)?,
        SWAP => stack_ops::swap(stack)?,
        EXEC => stack_ops::exec(stack)?,
        APPLY => stack_ops::apply(stack)?,

        FAILWITH => control::failwith(stack)?,
        EQ | NEQ | LT | GT | LE | GE => control::compare_result(stack, i.opcode)?,
        COMMENT => {}

        SOME => options::some(stack)?,
        NONE => options::none(stack, i)?,

        LEFT => unions::left(stack, i)?,
        RIGHT => unions::right(stack, i)?,

        CAR => pairs::car(stack)?,
        CDR => pairs::cdr(stack)?,
        UNPAIR => pairs::unpair(stack)?,
        PAIR => match i.args.as_slice() {
            [] => pairs::pair(stack)?,
            _ => pairs::pair_n(stack, nat_arg(i, 0)?)?,
        },

        NIL => collections::nil(stack, i)?,
        CONS => collections::cons(stack)?,
        EMPTY_SET => collections::empty_set(stack, i)?,
        EMPTY_MAP => collections::empty_map(stack, i)?,
        EMPTY_BIG_MAP => collections::empty_big_map(stack, i)?,

        PACK => strings::pack(stack)?,
        UNPACK => strings::unpack(stack, i)?,
        BLAKE2B | KECCAK | SHA256 | SHA512 | SHA3 => crypto::hash(stack, i.opcode)?,

        NEG => arith::neg(stack)?,
        ABS => arith::abs(stack)?,
        ISNAT => arith::isnat(stack)?,
        INT => arith::int(stack)?,
        SUB_MUTEZ => mutez::sub_mutez(stack)?,

        UNIT => stack.push(T::Unit),
        NOW => datetime::now(stack),
        SELF_ADDRESS | SENDER | SOURCE => stack.push(T::Address),
        AMOUNT | BALANCE => stack.push(T::Mutez),
        ADDRESS => transaction::address(stack)?,
        CONTRACT => transaction::contract(stack, i)?,
        TRANSFER_TOKENS => transaction::transfer_tokens(stack)?,

        // Overloaded instructions, routed by the operands on the stack.
        ADD => match stack.as_slice() {
            [.., T::Mutez, T::Mutez] => mutez::add(stack)?,
            _ => arith::add(stack)?,
        },
        SUB => match stack.as_slice() {
            [.., T::Datetime, T::Datetime] => datetime::sub(stack)?,
            _ => arith::sub(stack)?,
        },
        MUL => match stack.as_slice() {
            [.., T::Mutez, _] | [.., _, T::Mutez] => mutez::mul(stack)?,
            _ => arith::mul(stack)?,
        },
        EDIV => match stack.as_slice() {
            [.., T::Mutez] => mutez::ediv(stack)?,
            _ => arith::ediv(stack)?,
        },
        OR => match stack.as_slice() {
            [.., T::Bool, T::Bool] => boolean::or(stack)?,
            _ => arith::or(stack)?,
        },
        AND => match stack.as_slice() {
            [.., T::Bool, T::Bool] => boolean::and(stack)?,
            _ => arith::and(stack)?,
        },
        XOR => match stack.as_slice() {
            [.., T::Bool, T::Bool] => boolean::xor(stack)?,
            _ => arith::xor(stack)?,
        },
        NOT => match stack.as_slice() {
            [.., T::Bool] => boolean::not(stack)?,
            _ => arith::not(stack)?,
        },
        COMPARE => match stack.as_slice() {
            [.., T::Int, T::Int] | [.., T::Nat, T::Nat] => arith::compare(stack)?,
            [.., T::String, T::String] => strings::compare(stack, T::String)?,
            [.., T::Bytes, T::Bytes] => strings::compare(stack, T::Bytes)?,
            [.., T::Address, T::Address] => transaction::compare_address(stack)?,
            [.., T::Mutez, T::Mutez] => mutez::compare(stack)?,
            [.., T::Option(_), T::Option(_)] => options::compare(stack)?,
            [.., T::Datetime, T::Datetime] => datetime::compare(stack)?,
            [.., _, _] => {
                return Err(TcError::Operand {
                    instr: COMPARE,
                    accepted: vec![
                        T::Int,
                        T::Nat,
                        T::String,
                        T::Bytes,
                        T::Address,
                        T::Mutez,
                        T::new_option(T::type_var("a")),
                        T::Datetime,
                    ],
                    actual: top_types(stack, 2),
                })
            }
            _ => ensure_stack_len(COMPARE, stack, 2)?,
        },
        CONCAT => match stack.as_slice() {
            [.., T::String, T::String] => strings::concat(stack, T::String)?,
            [.., T::Bytes, T::Bytes] => strings::concat(stack, T::Bytes)?,
            [.., _, _] => {
                return Err(TcError::Operand {
                    instr: CONCAT,
                    accepted: vec![T::String, T::Bytes],
                    actual: top_types(stack, 2),
                })
            }
            _ => ensure_stack_len(CONCAT, stack, 2)?,
        },
        SLICE => match stack.as_slice() {
            [.., T::String, T::Nat, T::Nat] => strings::slice(stack, T::String)?,
            [.., T::Bytes, T::Nat, T::Nat] => strings::slice(stack, T::Bytes)?,
            [.., _, _, _] => {
                return Err(TcError::Operand {
                    instr: SLICE,
                    accepted: vec![T::String, T::Bytes],
                    actual: top_types(stack, 3),
                })
            }
            _ => ensure_stack_len(SLICE, stack, 3)?,
        },
        SIZE => match stack.as_slice() {
            [.., T::String] => strings::size(stack, T::String)?,
            [.., T::Bytes] => strings::size(stack, T::Bytes)?,
            _ => collections::size(stack)?,
        },
        MEM => match stack.as_slice() {
            [.., T::Set(_), _] => collections::mem_set(stack)?,
            _ => collections::mem_map(stack)?,
        },
        GET => match i.args.as_slice() {
            [] => collections::get_map(stack)?,
            _ => pairs::get_n(stack, nat_arg(i, 0)?)?,
        },
        UPDATE => match (i.args.as_slice(), stack.as_slice()) {
            ([], [.., T::Set(_), _, _]) => collections::update_set(stack)?,
            ([], _) => collections::update_map(stack)?,
            (_, _) => pairs::update_n(stack, nat_arg(i, 0)?)?,
        },
    }
    Ok(())
}
