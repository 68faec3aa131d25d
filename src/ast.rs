/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

//! Types, instruction nodes and contract descriptors consumed by the
//! typechecker.

pub mod comb;
pub mod display;
pub mod opcode;
pub mod type_eq;

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

pub use opcode::Opcode;

/// Michelson type, as seen by the typechecker.
///
/// [Type::Universal] is the bottom type: it is assigned to the stack of a
/// diverging branch and compares equal to every other type, see
/// [Type::equals]. [Type::TypeVar] only ever appears in error payloads, to
/// describe the shape an instruction expected.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Type {
    /// `unit`
    Unit,
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `nat`
    Nat,
    /// `mutez`
    Mutez,
    /// `string`
    String,
    /// `bytes`
    Bytes,
    /// `address`
    Address,
    /// `timestamp`
    Datetime,
    /// `operation`
    Operation,
    /// `option t`
    Option(Box<Type>),
    /// `or l r`
    Or(Box<(Type, Type)>),
    /// `pair l r`
    Pair(Box<(Type, Type)>),
    /// `list t`
    List(Box<Type>),
    /// `set t`
    Set(Box<Type>),
    /// `map k v`
    Dict(Box<(Type, Type)>),
    /// `big_map k v`
    BigMap(Box<(Type, Type)>),
    /// `contract t`
    Contract(Box<Type>),
    /// `lambda arg ret`, with the body and any applied arguments.
    FunctionPrototype(Box<FunctionPrototype>),
    /// Named record, standing for its [Record::shape].
    Record(Box<Record>),
    /// Bottom type of diverged stacks.
    Universal,
    /// Type variable in error payloads, e.g. `'a`.
    TypeVar(String),
}

/// Type of a lambda pushed by `LAMBDA`, possibly partially applied with
/// `APPLY`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FunctionPrototype {
    /// Type of the (remaining) argument.
    pub arg: Type,
    /// Return type.
    pub ret: Type,
    /// Lambda body, kept for diagnostics.
    pub body: Vec<Instr>,
    /// Types of the arguments supplied by `APPLY`, oldest first.
    pub applied_args: Vec<Type>,
}

/// Named record. Its runtime shape is the right comb of its field types.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Record name, only used for display.
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<(String, Type)>,
}

impl Record {
    /// Build a record from a name and `(field name, field type)` pairs.
    pub fn new(name: impl Into<String>, fields: Vec<(String, Type)>) -> Self {
        Record {
            name: name.into(),
            fields,
        }
    }

    /// The right-nested `pair` this record stands for. Field types are
    /// returned as-is; use [Type::simplify] to also expand nested records.
    ///
    /// An empty record is `unit`, a single-field record is its field type.
    pub fn shape(&self) -> Type {
        let mut tys = self.fields.iter().rev().map(|(_, ty)| ty.clone());
        match tys.next() {
            None => Type::Unit,
            Some(last) => tys.fold(last, |acc, ty| Type::new_pair(ty, acc)),
        }
    }
}

impl Type {
    /// `pair l r`
    pub fn new_pair(l: Self, r: Self) -> Self {
        Self::Pair(Box::new((l, r)))
    }

    /// `option x`
    pub fn new_option(x: Self) -> Self {
        Self::Option(Box::new(x))
    }

    /// `or l r`
    pub fn new_or(l: Self, r: Self) -> Self {
        Self::Or(Box::new((l, r)))
    }

    /// `list x`
    pub fn new_list(x: Self) -> Self {
        Self::List(Box::new(x))
    }

    /// `set x`
    pub fn new_set(x: Self) -> Self {
        Self::Set(Box::new(x))
    }

    /// `map k v`
    pub fn new_dict(k: Self, v: Self) -> Self {
        Self::Dict(Box::new((k, v)))
    }

    /// `big_map k v`
    pub fn new_big_map(k: Self, v: Self) -> Self {
        Self::BigMap(Box::new((k, v)))
    }

    /// `contract ty`
    pub fn new_contract(ty: Self) -> Self {
        Self::Contract(Box::new(ty))
    }

    /// Record type.
    pub fn new_record(record: Record) -> Self {
        Self::Record(Box::new(record))
    }

    /// Prototype of a lambda not applied to anything yet.
    pub fn new_function(arg: Self, ret: Self, body: Vec<Instr>) -> Self {
        Self::FunctionPrototype(Box::new(FunctionPrototype {
            arg,
            ret,
            body,
            applied_args: Vec::new(),
        }))
    }

    /// Type variable `'name`.
    pub fn type_var(name: &str) -> Self {
        Self::TypeVar(name.to_owned())
    }

    /// Replace records with their `pair` shape, recursively through records
    /// and pairs. Other types are returned unchanged.
    pub fn simplify(&self) -> Type {
        match self {
            Type::Record(r) => r.shape().simplify(),
            Type::Pair(p) => Type::new_pair(p.0.simplify(), p.1.simplify()),
            ty => ty.clone(),
        }
    }
}

/// Literal argument of an instruction.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// Integer literal, also used for `nat`, `mutez` and timestamps.
    Int(BigInt),
    /// String literal, also used for addresses and timestamps.
    String(String),
    /// `True` or `False`.
    Bool(bool),
    /// Bytes literal.
    Bytes(Vec<u8>),
    /// `Unit`.
    Unit,
}

/// Argument of an instruction node.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Arg {
    /// Nested instruction sequence: branch, loop, `DIP` or `LAMBDA` body.
    Seq(Vec<Instr>),
    /// Type argument of `PUSH`, `NIL`, `NONE`, `LEFT`, `LAMBDA`, etc.
    Type(Type),
    /// Literal value of `PUSH`, or a numeric argument of `DIG`, `DUP`, etc.
    Literal(Literal),
}

/// One node of the instruction sequence: an opcode and its arguments.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Instr {
    /// Mnemonic.
    pub opcode: Opcode,
    /// Arguments, in source order.
    pub args: Vec<Arg>,
}

impl Instr {
    /// Instruction with the given arguments.
    pub fn new(opcode: Opcode, args: Vec<Arg>) -> Self {
        Instr { opcode, args }
    }

    /// Instruction without arguments.
    pub fn simple(opcode: Opcode) -> Self {
        Instr::new(opcode, Vec::new())
    }
}

impl From<Vec<Instr>> for Arg {
    fn from(value: Vec<Instr>) -> Self {
        Arg::Seq(value)
    }
}

impl From<Type> for Arg {
    fn from(value: Type) -> Self {
        Arg::Type(value)
    }
}

impl From<Literal> for Arg {
    fn from(value: Literal) -> Self {
        Arg::Literal(value)
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Arg::Literal(Literal::Int(value.into()))
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Literal(Literal::Bool(value))
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Literal(Literal::String(value.to_owned()))
    }
}

/// Build an [Instr] from an opcode mnemonic and arguments convertible into
/// [Arg]:
///
/// ```
/// use mtc::ast::*;
/// use mtc::instr;
/// let push = instr!(PUSH, Type::Nat, 1);
/// let dip = instr!(DIP, 1, vec![instr!(DROP)]);
/// assert_eq!(push.opcode, Opcode::PUSH);
/// assert_eq!(dip.args.len(), 2);
/// ```
#[macro_export]
macro_rules! instr {
    ($op:ident $(, $arg:expr)* $(,)?) => {
        $crate::ast::Instr::new(
            $crate::ast::Opcode::$op,
            vec![$($crate::ast::Arg::from($arg)),*],
        )
    };
}

/// Contract descriptor produced by the code generator.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Parameter type.
    pub parameter: Type,
    /// Storage type.
    pub storage: Type,
    /// Contract code.
    pub code: Vec<Instr>,
}
