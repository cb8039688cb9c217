//! Safety game solving and strategy extraction.
//!
//! The controller picks the controllable inputs after seeing the
//! uncontrollable ones, so one step of the game reads
//! `∀ uncontrollable. ∃ controllable. next-state`. Two fixpoint formulations
//! are available and compute the same winning region:
//!
//! - [`FixpointMode::Greatest`]: shrink `safe` from `1` by intersecting it with
//!   its controlled predecessor `∀u. ∃c. safe[next] ∧ safety`.
//! - [`FixpointMode::Attractor`]: grow `bad` by the uncontrolled predecessor
//!   `∃u. ∀c. ¬safety ∨ bad[next]` and take the complement at the end.
//!
//! Unrealizability is reported by returning the zero function.

use std::fmt::{Display, Formatter};

use log::{debug, info};

use crate::aig::Aig;
use crate::arena::Arena;
use crate::bdd::Bdd;
use crate::encode::encode_strategy;
use crate::reference::Ref;

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum FixpointMode {
    /// Descending greatest fixpoint over the safe states.
    #[default]
    Greatest,
    /// Ascending least fixpoint over the states the adversary wins from.
    Attractor,
}

impl Display for FixpointMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FixpointMode::Greatest => write!(f, "greatest"),
            FixpointMode::Attractor => write!(f, "attractor"),
        }
    }
}

/// How a single controllable's policy is picked from its forced choices.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum Minimization {
    /// Take the raw "may be true" cofactor.
    None,
    /// Restrict the "must be true" predicate to the care set.
    ForcedTrue,
    /// Restrict both "must be true" and "not must be false" to the care set,
    /// keep whichever has fewer nodes.
    #[default]
    Smallest,
}

impl Minimization {
    fn select(self, bdd: &Bdd, maybe_true: Ref, must_be_true: Ref, must_be_false: Ref, care: Ref) -> Ref {
        match self {
            Minimization::None => maybe_true,
            Minimization::ForcedTrue => bdd.restrict(must_be_true, care),
            Minimization::Smallest => {
                let model_true = bdd.restrict(must_be_true, care);
                let model_false = bdd.restrict(-must_be_false, care);
                if bdd.size(model_false) < bdd.size(model_true) {
                    model_false
                } else {
                    model_true
                }
            }
        }
    }
}

impl Display for Minimization {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Minimization::None => write!(f, "none"),
            Minimization::ForcedTrue => write!(f, "forced-true"),
            Minimization::Smallest => write!(f, "smallest"),
        }
    }
}

/// One policy per controllable input, in arena order.
///
/// Each policy depends only on latch and uncontrollable variables.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Strategy {
    policies: Vec<Ref>,
}

impl Strategy {
    pub fn new(policies: Vec<Ref>) -> Self {
        Self { policies }
    }

    pub fn policies(&self) -> &[Ref] {
        &self.policies
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

pub trait GameSolver {
    fn arena(&self) -> &Arena<'_>;

    /// Compute the winning region, or zero if the initial state is losing.
    fn solve(&self) -> Ref;

    /// Derive a deterministic strategy from a non-zero winning region.
    fn extract_strategy(&self, winning_region: Ref) -> Strategy;

    /// Extract the strategy and encode it as a combinational circuit.
    fn synthesize(&self, winning_region: Ref) -> Aig {
        let strategy = self.extract_strategy(winning_region);
        encode_strategy(self.arena(), &strategy)
    }
}

pub struct SafetySolver<'a> {
    arena: &'a Arena<'a>,
    controllable_cube: Ref,
    uncontrollable_cube: Ref,
    mode: FixpointMode,
    minimization: Minimization,
}

impl<'a> SafetySolver<'a> {
    pub fn new(arena: &'a Arena<'a>) -> Self {
        let bdd = arena.bdd();
        Self {
            arena,
            controllable_cube: bdd.mk_cube(arena.controllables().iter().copied()),
            uncontrollable_cube: bdd.mk_cube(arena.uncontrollables().iter().copied()),
            mode: FixpointMode::default(),
            minimization: Minimization::default(),
        }
    }

    pub fn with_mode(mut self, mode: FixpointMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_minimization(mut self, minimization: Minimization) -> Self {
        self.minimization = minimization;
        self
    }

    pub fn mode(&self) -> FixpointMode {
        self.mode
    }

    fn bdd(&self) -> &'a Bdd {
        self.arena.bdd()
    }

    /// States from which the controller can keep the next step safe and inside `states`.
    pub fn controlled_predecessor(&self, states: Ref) -> Ref {
        let bdd = self.bdd();
        let next = bdd.vector_compose(states, self.arena.compose());
        let good = bdd.apply_and(next, self.arena.safety_condition());
        let choice = bdd.exists(good, self.controllable_cube);
        bdd.forall(choice, self.uncontrollable_cube)
    }

    /// States from which the adversary can force a violation now or a step into `states`.
    pub fn uncontrolled_predecessor(&self, states: Ref) -> Ref {
        let bdd = self.bdd();
        let next = bdd.vector_compose(states, self.arena.compose());
        let bad = bdd.apply_or(-self.arena.safety_condition(), next);
        let forced = bdd.forall(bad, self.controllable_cube);
        bdd.exists(forced, self.uncontrollable_cube)
    }

    /// Every iterate of the greatest fixpoint, from `1` down to the fixpoint.
    pub fn iterates(&self) -> Vec<Ref> {
        let bdd = self.bdd();
        let mut iterates = vec![bdd.one];
        let mut safe = bdd.one;
        loop {
            let next = bdd.apply_and(safe, self.controlled_predecessor(safe));
            if next == safe {
                return iterates;
            }
            iterates.push(next);
            safe = next;
        }
    }

    /// Every attractor level, from the immediately losing states up to the full attractor.
    pub fn attractor_levels(&self) -> Vec<Ref> {
        let bdd = self.bdd();
        let mut bad = self.uncontrolled_predecessor(bdd.zero);
        let mut levels = vec![bad];
        loop {
            let next = bdd.apply_or(bad, self.uncontrolled_predecessor(bad));
            if next == bad {
                return levels;
            }
            levels.push(next);
            bad = next;
        }
    }

    fn solve_greatest(&self) -> Ref {
        let bdd = self.bdd();
        let initial = self.arena.initial();

        let mut safe = bdd.one;
        let mut round = 0;
        loop {
            round += 1;
            let next = bdd.apply_and(safe, self.controlled_predecessor(safe));
            debug!("Round {}: safe states of size {}", round, bdd.size(next));

            // The iterates only shrink, so losing the initial state is final.
            if !bdd.is_implies(initial, next) {
                info!("Unrealizable: initial state lost in round {}", round);
                return bdd.zero;
            }
            if next == safe {
                self.report(safe, round);
                return safe;
            }
            safe = next;
        }
    }

    fn solve_attractor(&self) -> Ref {
        let bdd = self.bdd();
        let initial = self.arena.initial();

        let mut bad = bdd.zero;
        let mut round = 0;
        loop {
            round += 1;
            let next = bdd.apply_or(bad, self.uncontrolled_predecessor(bad));
            debug!("Round {}: attractor of size {}", round, bdd.size(next));

            // The attractor only grows, so catching the initial state is final.
            if !bdd.is_zero(bdd.apply_and(initial, next)) {
                info!("Unrealizable: initial state attracted in round {}", round);
                return bdd.zero;
            }
            if next == bad {
                self.report(-bad, round);
                return -bad;
            }
            bad = next;
        }
    }

    fn report(&self, winning_region: Ref, rounds: usize) {
        let bdd = self.bdd();
        // The region only mentions latches, inputs double the raw count.
        let num_vars = self.arena.compose().len();
        let num_inputs = num_vars - self.arena.latches().len();
        let states = bdd.sat_count(winning_region, num_vars) >> num_inputs;
        info!(
            "Realizable ({} fixpoint): {} rounds, {} winning states, region of size {}",
            self.mode,
            rounds,
            states,
            bdd.size(winning_region)
        );
    }

    /// Check that substituting `strategy` keeps every winning state winning
    /// against every uncontrollable move.
    pub fn verify(&self, winning_region: Ref, strategy: &Strategy) -> bool {
        let bdd = self.bdd();
        let mut vector: Vec<Ref> = (1..=self.arena.compose().len() as u32)
            .map(|v| bdd.mk_var(v))
            .collect();
        for (&c, &policy) in self.arena.controllables().iter().zip(strategy.policies()) {
            vector[c as usize - 1] = policy;
        }
        let next = bdd.vector_compose(winning_region, self.arena.compose());
        let step = bdd.apply_and(next, self.arena.safety_condition());
        let closed = bdd.vector_compose(step, &vector);
        bdd.is_implies(winning_region, bdd.forall(closed, self.uncontrollable_cube))
    }
}

impl GameSolver for SafetySolver<'_> {
    fn arena(&self) -> &Arena<'_> {
        self.arena
    }

    fn solve(&self) -> Ref {
        match self.mode {
            FixpointMode::Greatest => self.solve_greatest(),
            FixpointMode::Attractor => self.solve_attractor(),
        }
    }

    fn extract_strategy(&self, winning_region: Ref) -> Strategy {
        let bdd = self.bdd();
        let controllables = self.arena.controllables();

        let next = bdd.vector_compose(winning_region, self.arena.compose());
        let mut nondeterministic = bdd.apply_and(next, self.arena.safety_condition());

        let mut policies = Vec::with_capacity(controllables.len());
        for &c in controllables {
            let others = bdd.mk_cube(controllables.iter().copied().filter(|&o| o != c));
            let winning = bdd.exists(nondeterministic, others);

            let maybe_true = bdd.cofactor(winning, c, true);
            let maybe_false = bdd.cofactor(winning, c, false);
            let must_be_true = bdd.apply_and(maybe_true, -maybe_false);
            let must_be_false = bdd.apply_and(maybe_false, -maybe_true);
            let care = bdd.apply_and(winning_region, bdd.apply_or(must_be_true, must_be_false));

            let policy = self
                .minimization
                .select(bdd, maybe_true, must_be_true, must_be_false, care);
            debug!("Policy for x{} of size {}", c, bdd.size(policy));
            policies.push(policy);

            // Later controllables must agree with the policy just fixed.
            nondeterministic = bdd.apply_and(nondeterministic, bdd.apply_eq(bdd.mk_var(c), policy));
        }

        Strategy::new(policies)
    }
}
