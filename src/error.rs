use thiserror::Error;

use crate::aig::Literal;

pub type Result<T> = std::result::Result<T, Error>;

/// Structural faults in a circuit handed to the synthesis pipeline.
///
/// Losing the game is not an error: an unrealizable arena yields the zero
/// function from [`GameSolver::solve`][crate::solver::GameSolver::solve].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A latch is reset to something other than constant 0 or 1.
    #[error("latch {latch} has reset value {reset}, only 0 and 1 are allowed")]
    InvalidReset { latch: Literal, reset: u32 },

    /// An input, latch or AND gate is defined on a negated or constant literal.
    #[error("literal {literal} cannot be defined, expected a positive non-constant literal")]
    InvalidDefinition { literal: Literal },

    /// A literal is used but never defined by an input, latch or AND gate.
    #[error("literal {literal} is not defined by any input, latch or AND gate")]
    DanglingLiteral { literal: Literal },

    /// An AND gate transitively depends on itself.
    #[error("cyclic dependency through AND gate {literal}")]
    CyclicDependency { literal: Literal },

    /// A strategy signal cannot be matched against the arena.
    #[error("strategy symbol {name:?} does not match any arena signal")]
    UnknownSymbol { name: String },
}

impl Error {
    /// Whether this is a malformed-input fault (bad reset, bad or dangling literal).
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidReset { .. } | Error::InvalidDefinition { .. } | Error::DanglingLiteral { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::InvalidReset {
            latch: Literal::new(4),
            reset: 7,
        };
        assert_eq!(
            err.to_string(),
            "latch 4 has reset value 7, only 0 and 1 are allowed"
        );

        let err = Error::UnknownSymbol {
            name: "42".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "strategy symbol \"42\" does not match any arena signal"
        );
    }

    #[test]
    fn test_classification() {
        let lit = Literal::new(2);
        assert!(Error::InvalidReset { latch: lit, reset: 2 }.is_malformed_input());
        assert!(Error::DanglingLiteral { literal: lit }.is_malformed_input());
        assert!(!Error::CyclicDependency { literal: lit }.is_malformed_input());
        assert!(!Error::UnknownSymbol { name: String::new() }.is_malformed_input());
    }
}
