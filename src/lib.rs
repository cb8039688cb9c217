//! # safety-synth: Symbolic synthesis for safety games
//!
//! **`safety-synth`** decides two-player safety games given as sequential
//! and-inverter graphs and, when the controller wins, builds a circuit that
//! implements a winning strategy.
//!
//! Inputs whose name contains a marker (by default [`controllable_`][crate::aig::CONTROLLABLE_MARKER])
//! belong to the controller, the others to the environment. Every output is a
//! "bad" signal: the controller wins if it can keep all of them low forever.
//!
//! ## Key Features
//!
//! - **Symbolic**: states, inputs and transitions live in a [`Bdd`][crate::bdd::Bdd] context with complement edges and an operation cache.
//! - **Two fixpoints**: a descending greatest fixpoint and an ascending attractor, see [`FixpointMode`][crate::solver::FixpointMode].
//! - **Small strategies**: policies are minimized with Coudert-Madre restriction to the care set of forced choices.
//! - **Closed loop**: the strategy is encoded back into AND gates and merged into the original circuit.
//!
//! ## Basic Usage
//!
//! ```rust
//! use safety_synth::aig::{Aig, Literal};
//! use safety_synth::synth::{run, Outcome, SynthConfig};
//!
//! // One controllable input `x`, bad whenever `x` is low.
//! let mut aig = Aig::new();
//! aig.add_input(Literal::new(2), Some("controllable_x"));
//! aig.add_output(Literal::new(3), Some("bad"));
//!
//! match run(&aig, &SynthConfig::default()).unwrap() {
//!     Outcome::Realizable { strategy, merged } => {
//!         // The strategy keeps `x` high.
//!         assert_eq!(strategy.outputs()[0].lit, Literal::TRUE);
//!         assert!(merged.inputs().is_empty());
//!     }
//!     Outcome::Unrealizable => unreachable!(),
//! }
//! ```
//!
//! ## Core Components
//!
//! - **[`arena`]**: symbolic game built from a circuit.
//! - **[`solver`]**: winning region computation and strategy extraction.
//! - **[`encode`]**: decision diagrams back to AND gates.
//! - **[`merge`]**: splicing the strategy into the arena circuit.
//! - **[`synth`]**: the whole pipeline behind one configuration.

pub mod aig;
pub mod arena;
pub mod bdd;
pub mod cache;
pub mod encode;
pub mod error;
pub mod eval;
pub mod merge;
pub mod node;
pub mod reference;
pub mod sat;
pub mod sim;
pub mod solver;
pub mod storage;
pub mod synth;
pub mod utils;
