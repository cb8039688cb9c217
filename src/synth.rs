//! End-to-end synthesis pipeline.
//!
//! ```text
//! Aig --build--> Arena --solve--> winning region --synthesize--> Strategy
//!     --encode--> strategy Aig --merge--> closed-loop Aig
//! ```
//!
//! Each stage is exposed on its own. [`run`] chains all of them.

use log::info;

use crate::aig::{Aig, CONTROLLABLE_MARKER};
use crate::arena::Arena;
use crate::bdd::Bdd;
use crate::encode::encode_strategy;
use crate::error::Result;
use crate::reference::Ref;
use crate::solver::{FixpointMode, GameSolver, Minimization, SafetySolver, Strategy};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SynthConfig {
    pub mode: FixpointMode,
    pub minimization: Minimization,
    /// Inputs whose name contains this fragment are controllable.
    pub controllable_marker: String,
    /// Number of index bits of the computed table.
    pub cache_bits: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            mode: FixpointMode::default(),
            minimization: Minimization::default(),
            controllable_marker: CONTROLLABLE_MARKER.to_string(),
            cache_bits: 16,
        }
    }
}

impl SynthConfig {
    pub fn with_mode(mut self, mode: FixpointMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_minimization(mut self, minimization: Minimization) -> Self {
        self.minimization = minimization;
        self
    }

    pub fn with_controllable_marker(mut self, marker: impl Into<String>) -> Self {
        self.controllable_marker = marker.into();
        self
    }

    pub fn with_cache_bits(mut self, cache_bits: usize) -> Self {
        self.cache_bits = cache_bits;
        self
    }

    fn solver<'a>(&self, arena: &'a Arena<'a>) -> SafetySolver<'a> {
        SafetySolver::new(arena)
            .with_mode(self.mode)
            .with_minimization(self.minimization)
    }
}

pub fn build<'a>(aig: &Aig, bdd: &'a Bdd, config: &SynthConfig) -> Result<Arena<'a>> {
    Arena::with_marker(aig, bdd, &config.controllable_marker)
}

/// Winning region of the arena, zero when the game is lost.
pub fn solve(arena: &Arena<'_>, config: &SynthConfig) -> Ref {
    config.solver(arena).solve()
}

pub fn is_realizable(bdd: &Bdd, winning_region: Ref) -> bool {
    !bdd.is_zero(winning_region)
}

pub fn synthesize(arena: &Arena<'_>, winning_region: Ref, config: &SynthConfig) -> Strategy {
    config.solver(arena).extract_strategy(winning_region)
}

pub fn encode(arena: &Arena<'_>, strategy: &Strategy) -> Aig {
    encode_strategy(arena, strategy)
}

pub fn merge(arena: &Aig, strategy: &Aig, config: &SynthConfig) -> Result<Aig> {
    crate::merge::merge_with_marker(arena, strategy, &config.controllable_marker)
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Unrealizable,
    Realizable {
        /// Combinational circuit computing the controllable inputs.
        strategy: Aig,
        /// The arena with its controllable inputs driven by the strategy.
        merged: Aig,
    },
}

impl Outcome {
    pub fn is_realizable(&self) -> bool {
        matches!(self, Outcome::Realizable { .. })
    }
}

/// Run the whole pipeline on a fresh decision diagram context.
pub fn run(aig: &Aig, config: &SynthConfig) -> Result<Outcome> {
    let bdd = Bdd::new(config.cache_bits);
    let arena = build(aig, &bdd, config)?;

    let winning_region = solve(&arena, config);
    if !is_realizable(&bdd, winning_region) {
        return Ok(Outcome::Unrealizable);
    }

    let strategy = synthesize(&arena, winning_region, config);
    let strategy = encode(&arena, &strategy);
    let merged = merge(aig, &strategy, config)?;
    info!("Synthesis finished with {} decision diagram nodes", bdd.num_nodes());

    Ok(Outcome::Realizable { strategy, merged })
}
