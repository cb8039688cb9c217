//! Symbolic safety arena built from an [`Aig`].
//!
//! Every input and every latch gets its own BDD variable, in declaration
//! order: inputs take variables `1..=I`, latches take `I+1..=I+L`. The
//! transition vector is laid out on the same index space, so a single
//! [`Bdd::vector_compose`] call advances a state predicate by one step.

use std::collections::{HashMap, HashSet};

use log::{debug, info};

use crate::aig::{Aig, AndGate, Literal, CONTROLLABLE_MARKER};
use crate::bdd::Bdd;
use crate::error::{Error, Result};
use crate::reference::Ref;

pub struct Arena<'a> {
    bdd: &'a Bdd,

    controllables: Vec<u32>,
    uncontrollables: Vec<u32>,
    latches: Vec<u32>,

    /// Arena literals of the controllable inputs, parallel to `controllables`.
    controllable_lits: Vec<Literal>,
    uncontrollable_lits: Vec<Literal>,
    latch_lits: Vec<Literal>,

    compose: Vec<Ref>,
    outputs: Vec<Ref>,
    initial: Ref,
    safety_condition: Ref,
}

impl<'a> Arena<'a> {
    /// Build the arena, treating inputs named with [`CONTROLLABLE_MARKER`] as controllable.
    pub fn new(aig: &Aig, bdd: &'a Bdd) -> Result<Self> {
        Self::with_marker(aig, bdd, CONTROLLABLE_MARKER)
    }

    pub fn with_marker(aig: &Aig, bdd: &'a Bdd, marker: &str) -> Result<Self> {
        let mut arena = Arena {
            bdd,
            controllables: Vec::new(),
            uncontrollables: Vec::new(),
            latches: Vec::new(),
            controllable_lits: Vec::new(),
            uncontrollable_lits: Vec::new(),
            latch_lits: Vec::new(),
            compose: Vec::new(),
            outputs: Vec::new(),
            initial: bdd.one,
            safety_condition: bdd.one,
        };

        let mut cache: HashMap<Literal, Ref> = HashMap::new();
        cache.insert(Literal::FALSE, bdd.zero);
        let mut var_index = 0;

        for input in aig.inputs() {
            check_definition(input.lit, &cache)?;
            var_index += 1;
            let node = bdd.mk_var(var_index);
            if input.is_controllable(marker) {
                arena.controllables.push(var_index);
                arena.controllable_lits.push(input.lit);
            } else {
                arena.uncontrollables.push(var_index);
                arena.uncontrollable_lits.push(input.lit);
            }
            cache.insert(input.lit, node);
            arena.compose.push(node);
        }

        for latch in aig.latches() {
            check_definition(latch.lit, &cache)?;
            var_index += 1;
            let node = bdd.mk_var(var_index);
            let init = match latch.reset {
                0 => -node,
                1 => node,
                reset => {
                    return Err(Error::InvalidReset {
                        latch: latch.lit,
                        reset,
                    })
                }
            };
            arena.initial = bdd.apply_and(arena.initial, init);
            arena.latches.push(var_index);
            arena.latch_lits.push(latch.lit);
            cache.insert(latch.lit, node);
        }

        let mut gates: HashMap<Literal, AndGate> = HashMap::new();
        for gate in aig.ands() {
            check_definition(gate.lhs, &cache)?;
            if gates.insert(gate.lhs, *gate).is_some() {
                return Err(Error::InvalidDefinition { literal: gate.lhs });
            }
        }
        let mut in_progress = HashSet::new();
        for gate in aig.ands() {
            eval_gate(bdd, gate.lhs, &gates, &mut in_progress, &mut cache)?;
        }

        for latch in aig.latches() {
            let next = lookup(bdd, latch.next, &cache)?;
            arena.compose.push(next);
        }

        for output in aig.outputs() {
            let f = lookup(bdd, output.lit, &cache)?;
            arena.outputs.push(f);
            arena.safety_condition = bdd.apply_and(arena.safety_condition, -f);
        }

        info!(
            "Built arena: {} controllable, {} uncontrollable, {} latches, {} AND gates, {} outputs",
            arena.controllables.len(),
            arena.uncontrollables.len(),
            arena.latches.len(),
            aig.ands().len(),
            arena.outputs.len()
        );
        debug!(
            "initial of size {}, safety condition of size {}",
            bdd.size(arena.initial),
            bdd.size(arena.safety_condition)
        );

        Ok(arena)
    }

    pub fn bdd(&self) -> &'a Bdd {
        self.bdd
    }

    /// Predicate over latch variables that holds exactly in the reset state.
    pub fn initial(&self) -> Ref {
        self.initial
    }

    /// Conjunction of the negated outputs, over latch and input variables.
    pub fn safety_condition(&self) -> Ref {
        self.safety_condition
    }

    /// Substitution vector: position `v - 1` holds the next-step value of variable `v`.
    pub fn compose(&self) -> &[Ref] {
        &self.compose
    }

    /// Output functions, in declaration order.
    pub fn outputs(&self) -> &[Ref] {
        &self.outputs
    }

    pub fn controllables(&self) -> &[u32] {
        &self.controllables
    }
    pub fn uncontrollables(&self) -> &[u32] {
        &self.uncontrollables
    }
    pub fn latches(&self) -> &[u32] {
        &self.latches
    }

    pub fn controllable_lits(&self) -> &[Literal] {
        &self.controllable_lits
    }
    pub fn uncontrollable_lits(&self) -> &[Literal] {
        &self.uncontrollable_lits
    }
    pub fn latch_lits(&self) -> &[Literal] {
        &self.latch_lits
    }
}

fn check_definition(lit: Literal, cache: &HashMap<Literal, Ref>) -> Result<()> {
    if lit.is_negated() || lit.is_constant() || cache.contains_key(&lit) {
        return Err(Error::InvalidDefinition { literal: lit });
    }
    Ok(())
}

fn lookup(bdd: &Bdd, lit: Literal, cache: &HashMap<Literal, Ref>) -> Result<Ref> {
    match cache.get(&lit.normalized()) {
        Some(&f) if lit.is_negated() => Ok(bdd.apply_not(f)),
        Some(&f) => Ok(f),
        None => Err(Error::DanglingLiteral { literal: lit }),
    }
}

fn eval_gate(
    bdd: &Bdd,
    lhs: Literal,
    gates: &HashMap<Literal, AndGate>,
    in_progress: &mut HashSet<Literal>,
    cache: &mut HashMap<Literal, Ref>,
) -> Result<Ref> {
    if let Some(&f) = cache.get(&lhs) {
        return Ok(f);
    }
    if !in_progress.insert(lhs) {
        return Err(Error::CyclicDependency { literal: lhs });
    }

    let gate = gates[&lhs];
    let mut operands = [bdd.one; 2];
    for (operand, rhs) in operands.iter_mut().zip([gate.rhs0, gate.rhs1]) {
        let normalized = rhs.normalized();
        if !cache.contains_key(&normalized) && gates.contains_key(&normalized) {
            eval_gate(bdd, normalized, gates, in_progress, cache)?;
        }
        *operand = lookup(bdd, rhs, cache)?;
    }

    let f = bdd.apply_and(operands[0], operands[1]);
    debug!("AND gate {} of size {}", lhs, bdd.size(f));
    in_progress.remove(&lhs);
    cache.insert(lhs, f);
    Ok(f)
}
