/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

//! Instruction mnemonics.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// Instruction mnemonics understood by the typechecker. Displayed and parsed
/// as the mnemonic itself, e.g. `IF_NONE`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[allow(non_camel_case_types, clippy::upper_case_acronyms, missing_docs)]
pub enum Opcode {
    // stack manipulation
    PUSH,
    DROP,
    DUP,
    DIG,
    DUG,
    SWAP,
    LAMBDA,
    EXEC,
    APPLY,
    // control structures
    DIP,
    IF,
    IF_NONE,
    IF_LEFT,
    IF_CONS,
    LOOP,
    ITER,
    FAILWITH,
    COMMENT,
    // pairs
    CAR,
    CDR,
    PAIR,
    UNPAIR,
    GET,
    UPDATE,
    // options and unions
    SOME,
    NONE,
    LEFT,
    RIGHT,
    // bytes and strings
    PACK,
    UNPACK,
    CONCAT,
    SLICE,
    SIZE,
    // cryptography
    BLAKE2B,
    KECCAK,
    SHA256,
    SHA512,
    SHA3,
    // collections
    EMPTY_SET,
    EMPTY_MAP,
    EMPTY_BIG_MAP,
    NIL,
    CONS,
    MEM,
    // arithmetic and logic
    COMPARE,
    ADD,
    SUB,
    SUB_MUTEZ,
    MUL,
    EDIV,
    NEG,
    ABS,
    ISNAT,
    INT,
    OR,
    AND,
    XOR,
    NOT,
    EQ,
    NEQ,
    LT,
    GT,
    LE,
    GE,
    // constants and transactions
    UNIT,
    NOW,
    SELF_ADDRESS,
    SENDER,
    SOURCE,
    AMOUNT,
    BALANCE,
    ADDRESS,
    CONTRACT,
    TRANSFER_TOKENS,
}
