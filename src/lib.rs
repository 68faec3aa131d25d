// SPDX-FileCopyrightText: [2023] Serokell <hi@serokell.io>
//
// SPDX-License-Identifier: MIT
#![warn(clippy::redundant_clone)]
#![warn(missing_docs)]

//! # Michelson stack typechecker
//!
//! Static typechecker for the Michelson instruction sequences emitted by the
//! contract compiler. Instructions are never executed: their effect is
//! simulated on a stack of types, see [stack::TypeStack].
//!
//! # Usage
//!
//! The code generator hands over an [ast::Contract] (parameter type, storage
//! type and code). [typechecker::typecheck_contract] checks that the code
//! turns `pair parameter storage` into `pair (list operation) storage`.
//!
//! A fragment can be checked in isolation with
//! [typechecker::typecheck_fragment], starting from any stack:
//!
//! ```
//! use mtc::ast::Type;
//! use mtc::context::Ctx;
//! use mtc::typechecker::typecheck_fragment;
//! use mtc::{instr, tc_stk};
//!
//! let res = typecheck_fragment(
//!     &mut Ctx::default(),
//!     tc_stk![],
//!     &[instr!(PUSH, Type::Nat, 1), instr!(PUSH, Type::Nat, 2), instr!(ADD)],
//! );
//! assert_eq!(res, Ok(tc_stk![Type::Nat]));
//! ```
//!
//! All of these take a [context::Ctx], which carries the configuration (see
//! [context::TcConfig]). Errors are [typechecker::TcError]; the first
//! ill-typed instruction aborts the whole check.
//!
//! Every typechecked instruction is reported as a `tracing` event at the
//! `debug` level, with the resulting stack.

pub mod ast;
pub mod context;
pub mod stack;
pub mod typechecker;
