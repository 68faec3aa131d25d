/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

//! Branch unification shared by `IF`, `IF_NONE`, `IF_LEFT` and `IF_CONS`.

use tracing::debug;

use super::{ensure_stack_len, invalid, seq_arg, typecheck, TcError};
use crate::ast::{Instr, Opcode, Type};
use crate::context::Ctx;
use crate::stack::TypeStack;

/// How the stack is prepared before typechecking one branch. Every strategy
/// consumes the discriminant on top of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchPrep {
    PopBool,
    PopOption,
    PopOptionPushInner,
    PopOrPushLeft,
    PopOrPushRight,
    /// Push the list tail, then its head on top.
    PopListPushHeadTail,
    PopList,
}

impl BranchPrep {
    /// Shape the discriminant must have, for diagnostics.
    fn expected(self) -> Type {
        use BranchPrep::*;
        let a = || Type::type_var("a");
        match self {
            PopBool => Type::Bool,
            PopOption | PopOptionPushInner => Type::new_option(a()),
            PopOrPushLeft | PopOrPushRight => Type::new_or(a(), Type::type_var("b")),
            PopListPushHeadTail | PopList => Type::new_list(a()),
        }
    }

    fn accepts(self, ty: &Type) -> bool {
        use BranchPrep::*;
        matches!(
            (self, ty),
            (PopBool, Type::Bool)
                | (PopOption | PopOptionPushInner, Type::Option(_))
                | (PopOrPushLeft | PopOrPushRight, Type::Or(_))
                | (PopListPushHeadTail | PopList, Type::List(_))
        )
    }

    /// Apply to a stack whose top was checked with [BranchPrep::accepts].
    fn apply(self, instr: Opcode, stack: &mut TypeStack) -> Result<(), TcError> {
        use BranchPrep::*;
        match (self, stack.pop()?) {
            (PopBool | PopOption | PopList, _) => {}
            (PopOptionPushInner, Type::Option(t)) => stack.push(*t),
            (PopOrPushLeft, Type::Or(lr)) => stack.push(lr.0),
            (PopOrPushRight, Type::Or(lr)) => stack.push(lr.1),
            (PopListPushHeadTail, Type::List(t)) => {
                stack.push(Type::List(t.clone()));
                stack.push(*t);
            }
            (_, ty) => {
                return Err(TcError::StackTopType {
                    instr,
                    expected: vec![self.expected()],
                    actual: vec![ty],
                })
            }
        }
        Ok(())
    }
}

fn is_rooted_in_universal(stack: &TypeStack) -> bool {
    matches!(stack.top(), Ok(Type::Universal))
}

/// Typecheck both branches of a conditional against independent copies of
/// the stack, prepared by `on_true` and `on_false`, then unify the results
/// into `stack`.
///
/// A branch ending in `universal` takes the shape of the other one, so a
/// branch that fails unifies with anything.
pub(super) fn generic_if(
    ctx: &mut Ctx,
    stack: &mut TypeStack,
    i: &Instr,
    on_true: BranchPrep,
    on_false: BranchPrep,
) -> Result<(), TcError> {
    ensure_stack_len(i.opcode, stack, 1)?;
    if !on_true.accepts(&stack[0]) {
        return Err(TcError::StackTopType {
            instr: i.opcode,
            expected: vec![on_true.expected()],
            actual: vec![stack[0].clone()],
        });
    }
    if i.args.len() != 2 {
        return Err(invalid(i.opcode, "expected two code sequences"));
    }
    let (body_true, body_false) = (seq_arg(i, 0)?, seq_arg(i, 1)?);

    let mut branch_true = run_branch(ctx, stack, i, on_true, body_true)?;
    let mut branch_false = run_branch(ctx, stack, i, on_false, body_false)?;

    if is_rooted_in_universal(&branch_true) {
        debug!(instr = %i.opcode, "true branch diverges");
        branch_true = branch_false.clone();
    }
    if is_rooted_in_universal(&branch_false) {
        debug!(instr = %i.opcode, "false branch diverges");
        branch_false = branch_true.clone();
    }
    if !branch_true.equals(&branch_false) {
        return Err(TcError::ConditionBranchesMismatch {
            instr: i.opcode,
            true_branch: branch_true,
            false_branch: branch_false,
        });
    }
    stack.replace_visible(branch_true);
    Ok(())
}

fn run_branch(
    ctx: &mut Ctx,
    stack: &TypeStack,
    i: &Instr,
    prep: BranchPrep,
    body: &[Instr],
) -> Result<TypeStack, TcError> {
    let mut branch = stack.fork();
    prep.apply(i.opcode, &mut branch)?;
    ctx.scoped(i.opcode, |ctx| typecheck(ctx, &mut branch, body))?;
    Ok(branch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{instr, tc_stk};
    use Type as T;

    fn run(stack: &mut TypeStack, i: Instr, t: BranchPrep, f: BranchPrep) -> Result<(), TcError> {
        generic_if(&mut Ctx::default(), stack, &i, t, f)
    }

    #[test]
    fn both_branches_agree() {
        let mut stk = tc_stk![T::Nat, T::Bool];
        let i = instr!(IF, vec![instr!(INT)], vec![instr!(DROP), instr!(PUSH, T::Int, 0)]);
        assert_eq!(run(&mut stk, i, BranchPrep::PopBool, BranchPrep::PopBool), Ok(()));
        assert_eq!(stk, tc_stk![T::Int]);
    }

    #[test]
    fn failing_branch_is_absorbed() {
        let mut stk = tc_stk![T::Nat, T::Bool];
        let i = instr!(IF, vec![instr!(FAILWITH)], vec![instr!(INT)]);
        assert_eq!(run(&mut stk, i, BranchPrep::PopBool, BranchPrep::PopBool), Ok(()));
        assert_eq!(stk, tc_stk![T::Int]);

        let mut stk = tc_stk![T::Nat, T::Bool];
        let i = instr!(IF, vec![instr!(INT)], vec![instr!(FAILWITH)]);
        assert_eq!(run(&mut stk, i, BranchPrep::PopBool, BranchPrep::PopBool), Ok(()));
        assert_eq!(stk, tc_stk![T::Int]);
    }

    #[test]
    fn both_branches_fail() {
        let mut stk = tc_stk![T::Nat, T::Bool];
        let i = instr!(IF, vec![instr!(FAILWITH)], vec![instr!(FAILWITH)]);
        assert_eq!(run(&mut stk, i, BranchPrep::PopBool, BranchPrep::PopBool), Ok(()));
        assert!(stk.is_failed());
    }

    #[test]
    fn discriminant_checked_first() {
        let mut stk = tc_stk![T::Nat];
        let i = instr!(IF, vec![], vec![]);
        assert_eq!(
            run(&mut stk, i, BranchPrep::PopBool, BranchPrep::PopBool),
            Err(TcError::StackTopType {
                instr: Opcode::IF,
                expected: vec![T::Bool],
                actual: vec![T::Nat],
            })
        );
        let mut stk = tc_stk![];
        let i = instr!(IF, vec![], vec![]);
        assert_eq!(
            run(&mut stk, i, BranchPrep::PopBool, BranchPrep::PopBool),
            Err(TcError::StackLength {
                instr: Some(Opcode::IF),
                expected: 1,
                actual: 0,
            })
        );
    }

    #[test]
    fn branches_must_be_sequences() {
        let mut stk = tc_stk![T::Bool];
        let i = instr!(IF, vec![]);
        assert_eq!(
            run(&mut stk, i, BranchPrep::PopBool, BranchPrep::PopBool)
                .unwrap_err()
                .kind(),
            crate::typechecker::ErrorKind::InvalidMichelson
        );
        let mut stk = tc_stk![T::Bool];
        let i = instr!(IF, vec![], T::Nat);
        assert_eq!(
            run(&mut stk, i, BranchPrep::PopBool, BranchPrep::PopBool)
                .unwrap_err()
                .kind(),
            crate::typechecker::ErrorKind::InvalidMichelson
        );
    }

    #[test]
    fn branch_stacks_are_independent() {
        let mut stk = tc_stk![T::Nat, T::Bool];
        let i = instr!(IF, vec![instr!(DROP)], vec![]);
        assert_eq!(
            run(&mut stk, i, BranchPrep::PopBool, BranchPrep::PopBool),
            Err(TcError::ConditionBranchesMismatch {
                instr: Opcode::IF,
                true_branch: tc_stk![],
                false_branch: tc_stk![T::Nat],
            })
        );
    }

    #[test]
    fn protected_part_is_kept() {
        let mut stk = tc_stk![T::String, T::Bool];
        stk.protect_top(1).unwrap();
        stk.push(T::Bool);
        let i = instr!(IF, vec![], vec![]);
        assert_eq!(run(&mut stk, i, BranchPrep::PopBool, BranchPrep::PopBool), Ok(()));
        stk.restore_top();
        assert_eq!(stk, tc_stk![T::String, T::Bool]);
    }
}
