/******************************************************************************/
/*                                                                            */
/* SPDX-License-Identifier: MIT                                               */
/* Copyright (c) [2023] Serokell <hi@serokell.io>                             */
/*                                                                            */
/******************************************************************************/

//! Configuration and mutable state threaded through typechecking.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::ast::Opcode;
use crate::typechecker::TcError;

/// Default bound on nested scopes, see [TcConfig::max_nesting_depth].
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 1000;

/// Native stack reserved per nesting level by [TcConfig::stack_size]. Covers
/// the frames of one level in unoptimized builds.
pub const STACK_BYTES_PER_LEVEL: usize = 128 * 1024;

/// Native stack reserved by [TcConfig::stack_size] on top of the nesting
/// levels.
pub const BASE_STACK_BYTES: usize = 1024 * 1024;

/// Upper bound of [TcConfig::stack_size].
pub const MAX_STACK_BYTES: usize = 1024 * 1024 * 1024;

/// Typechecker settings. Missing fields take their default values when
/// deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TcConfig {
    /// Maximal number of nested scopes (branch, `DIP`, `ITER`, `LOOP` and
    /// `LAMBDA` bodies) that are typechecked recursively. Defaults to
    /// [DEFAULT_MAX_NESTING_DEPTH].
    pub max_nesting_depth: usize,
}

impl Default for TcConfig {
    fn default() -> Self {
        TcConfig {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// Errors loading a [TcConfig].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The input is not a JSON config object.
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
    /// `max_nesting_depth` is `0`, which would reject every nested sequence.
    #[error("max_nesting_depth must be positive")]
    ZeroNestingDepth,
    /// `max_nesting_depth` needs more than [MAX_STACK_BYTES] of stack.
    #[error("max_nesting_depth {0} is too large")]
    NestingDepthTooLarge(usize),
}

impl TcConfig {
    /// Parse a JSON config, e.g. `{"max_nesting_depth": 64}`.
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let config: TcConfig = serde_json::from_str(s)?;
        if config.max_nesting_depth == 0 {
            return Err(ConfigError::ZeroNestingDepth);
        }
        if config.required_stack() > MAX_STACK_BYTES {
            return Err(ConfigError::NestingDepthTooLarge(config.max_nesting_depth));
        }
        Ok(config)
    }

    /// Native stack size, in bytes, enough to typecheck code nested
    /// [TcConfig::max_nesting_depth] levels deep. Capped at
    /// [MAX_STACK_BYTES], which [TcConfig::from_json] enforces.
    pub fn stack_size(&self) -> usize {
        self.required_stack().min(MAX_STACK_BYTES)
    }

    fn required_stack(&self) -> usize {
        self.max_nesting_depth
            .saturating_mul(STACK_BYTES_PER_LEVEL)
            .saturating_add(BASE_STACK_BYTES)
    }
}

/// [Ctx] holds the configuration and the current nesting depth.
#[derive(Debug, Clone, Default)]
pub struct Ctx {
    /// Settings for this run.
    pub config: TcConfig,
    depth: usize,
}

impl Ctx {
    /// Context at nesting depth `0`.
    pub fn new(config: TcConfig) -> Self {
        Ctx { config, depth: 0 }
    }

    /// Number of nested scopes currently being typechecked.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Run `f` one nesting level deeper. Fails with
    /// [TcError::InvalidMichelson] if that exceeds
    /// [TcConfig::max_nesting_depth].
    pub fn scoped<R>(
        &mut self,
        instr: Opcode,
        f: impl FnOnce(&mut Ctx) -> Result<R, TcError>,
    ) -> Result<R, TcError> {
        if self.depth >= self.config.max_nesting_depth {
            return Err(TcError::InvalidMichelson {
                instr,
                reason: format!(
                    "nesting depth exceeds the limit of {}",
                    self.config.max_nesting_depth
                ),
            });
        }
        self.depth += 1;
        trace!(%instr, depth = self.depth, "entering scope");
        let res = f(self);
        trace!(%instr, depth = self.depth, "leaving scope");
        self.depth -= 1;
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        assert_eq!(TcConfig::from_json("{}").unwrap(), TcConfig::default());
        assert_eq!(
            TcConfig::from_json(r#"{"max_nesting_depth": 3}"#)
                .unwrap()
                .max_nesting_depth,
            3
        );
    }

    #[test]
    fn config_errors() {
        assert!(matches!(
            TcConfig::from_json(r#"{"max_nesting_depth": 0}"#),
            Err(ConfigError::ZeroNestingDepth)
        ));
        assert!(matches!(
            TcConfig::from_json(r#"{"max_nesting_depth": "deep"}"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            TcConfig::from_json(r#"{"max_nesting_depth": 1000000}"#),
            Err(ConfigError::NestingDepthTooLarge(1_000_000))
        ));
        assert!(TcConfig::from_json(r#"{"max_nesting_depth": 8000}"#).is_ok());
    }

    #[test]
    fn stack_size_grows_with_depth() {
        let shallow = TcConfig {
            max_nesting_depth: 1,
        };
        assert_eq!(shallow.stack_size(), BASE_STACK_BYTES + STACK_BYTES_PER_LEVEL);
        assert!(TcConfig::default().stack_size() > shallow.stack_size());
        let unbounded = TcConfig {
            max_nesting_depth: usize::MAX,
        };
        assert_eq!(unbounded.stack_size(), MAX_STACK_BYTES);
    }

    #[test]
    fn scoped_tracks_depth() {
        let mut ctx = Ctx::new(TcConfig {
            max_nesting_depth: 2,
        });
        let res = ctx.scoped(Opcode::DIP, |ctx| {
            assert_eq!(ctx.depth(), 1);
            ctx.scoped(Opcode::IF, |ctx| Ok(ctx.depth()))
        });
        assert_eq!(res, Ok(2));
        assert_eq!(ctx.depth(), 0);
        let res = ctx.scoped(Opcode::DIP, |ctx| {
            ctx.scoped(Opcode::DIP, |ctx| ctx.scoped(Opcode::LOOP, |_| Ok(())))
        });
        assert!(matches!(
            res,
            Err(TcError::InvalidMichelson {
                instr: Opcode::LOOP,
                ..
            })
        ));
        assert_eq!(ctx.depth(), 0);
    }
}
