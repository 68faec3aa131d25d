/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

//! Michelson notation for types, used in diagnostics and logs.

use std::fmt;

use super::Type;

/// Wraps a type in parentheses when it is not atomic, i.e. when it is printed
/// as an argument of another type constructor.
struct Parens<'a>(&'a Type);

impl fmt::Display for Parens<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if is_atomic(self.0) {
            write!(f, "{}", self.0)
        } else {
            write!(f, "({})", self.0)
        }
    }
}

fn is_atomic(ty: &Type) -> bool {
    match ty {
        Type::Record(r) => r.fields.is_empty(),
        Type::Option(_)
        | Type::Or(_)
        | Type::Pair(_)
        | Type::List(_)
        | Type::Set(_)
        | Type::Dict(_)
        | Type::BigMap(_)
        | Type::Contract(_)
        | Type::FunctionPrototype(_) => false,
        _ => true,
    }
}

// Records print as their comb, fields tagged with Michelson field annotations.
fn fmt_fields(f: &mut fmt::Formatter<'_>, fields: &[(String, Type)]) -> fmt::Result {
    match fields {
        [] => write!(f, "unit"),
        [(name, ty)] => write!(f, "{} %{name}", Parens(ty)),
        [(name, ty), rest @ ..] => {
            write!(f, "pair ({} %{name}) (", Parens(ty))?;
            fmt_fields(f, rest)?;
            write!(f, ")")
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Type::*;
        match self {
            Unit => write!(f, "unit"),
            Bool => write!(f, "bool"),
            Int => write!(f, "int"),
            Nat => write!(f, "nat"),
            Mutez => write!(f, "mutez"),
            String => write!(f, "string"),
            Bytes => write!(f, "bytes"),
            Address => write!(f, "address"),
            Datetime => write!(f, "timestamp"),
            Operation => write!(f, "operation"),
            Option(t) => write!(f, "option {}", Parens(t)),
            Or(p) => write!(f, "or {} {}", Parens(&p.0), Parens(&p.1)),
            Pair(p) => write!(f, "pair {} {}", Parens(&p.0), Parens(&p.1)),
            List(t) => write!(f, "list {}", Parens(t)),
            Set(t) => write!(f, "set {}", Parens(t)),
            Dict(p) => write!(f, "map {} {}", Parens(&p.0), Parens(&p.1)),
            BigMap(p) => write!(f, "big_map {} {}", Parens(&p.0), Parens(&p.1)),
            Contract(t) => write!(f, "contract {}", Parens(t)),
            FunctionPrototype(fp) => write!(f, "lambda {} {}", Parens(&fp.arg), Parens(&fp.ret)),
            Record(r) => fmt_fields(f, &r.fields),
            Universal => write!(f, "universal"),
            TypeVar(name) => write!(f, "'{name}"),
        }
    }
}
