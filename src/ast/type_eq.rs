/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

//! Type equality with the bottom type.

use super::Type;

impl Type {
    /// Type equality as used by the typechecker.
    ///
    /// Structural, except that:
    /// - [Type::Universal] is equal to any type, on either side and at any
    ///   depth;
    /// - a record is compared by field names and types against another
    ///   record, and by its `pair` shape against anything else;
    /// - lambdas are compared by argument and return types only.
    ///
    /// This relation is not transitive because of `Universal`, so it is
    /// deliberately not a `PartialEq` impl.
    pub fn equals(&self, other: &Type) -> bool {
        use Type::*;
        match (self, other) {
            (Universal, _) | (_, Universal) => true,
            (Record(l), Record(r)) => {
                l.fields.len() == r.fields.len()
                    && l.fields
                        .iter()
                        .zip(&r.fields)
                        .all(|((ln, lt), (rn, rt))| ln == rn && lt.equals(rt))
            }
            (Record(_), _) => self.simplify().equals(other),
            (_, Record(_)) => self.equals(&other.simplify()),
            (Unit, Unit)
            | (Bool, Bool)
            | (Int, Int)
            | (Nat, Nat)
            | (Mutez, Mutez)
            | (String, String)
            | (Bytes, Bytes)
            | (Address, Address)
            | (Datetime, Datetime)
            | (Operation, Operation) => true,
            (Option(l), Option(r))
            | (List(l), List(r))
            | (Set(l), Set(r))
            | (Contract(l), Contract(r)) => l.equals(r),
            (Or(l), Or(r)) | (Pair(l), Pair(r)) | (Dict(l), Dict(r)) | (BigMap(l), BigMap(r)) => {
                l.0.equals(&r.0) && l.1.equals(&r.1)
            }
            (FunctionPrototype(l), FunctionPrototype(r)) => {
                l.arg.equals(&r.arg) && l.ret.equals(&r.ret)
            }
            (TypeVar(l), TypeVar(r)) => l == r,
            _ => false,
        }
    }
}
