//! Translation of decision diagrams into AND gates.
//!
//! Every internal node becomes a multiplexer on its variable:
//! `ite = ¬(¬(v ∧ then) ∧ ¬(¬v ∧ else))`. Complemented edges turn into
//! negated literals, so each stored node costs at most three gates and is
//! emitted once.

use std::collections::HashMap;

use log::{info, warn};

use crate::aig::{Aig, Literal};
use crate::arena::Arena;
use crate::bdd::Bdd;
use crate::reference::Ref;
use crate::solver::Strategy;

pub struct AigEncoder<'a> {
    bdd: &'a Bdd,
    aig: Aig,
    /// Circuit signal of each bound variable.
    bound: HashMap<u32, Literal>,
    /// Literal of each already encoded (non-complemented) node.
    memo: HashMap<Ref, Literal>,
}

impl<'a> AigEncoder<'a> {
    pub fn new(bdd: &'a Bdd) -> Self {
        let mut memo = HashMap::new();
        memo.insert(bdd.one, Literal::TRUE);
        Self {
            bdd,
            aig: Aig::new(),
            bound: HashMap::new(),
            memo,
        }
    }

    /// Declare a fresh circuit input for variable `v`.
    pub fn add_input(&mut self, v: u32, name: Option<&str>) -> Literal {
        let lit = self.aig.mk_input(name);
        self.bind(v, lit);
        lit
    }

    /// Declare a fresh latch for variable `v`, holding zero until its next
    /// state is assigned by the caller.
    pub fn add_latch(&mut self, v: u32, name: Option<&str>) -> Literal {
        let lit = self.aig.next_literal();
        self.aig.add_latch(lit, Literal::FALSE, 0, name);
        self.bind(v, lit);
        lit
    }

    fn bind(&mut self, v: u32, lit: Literal) {
        self.bound.insert(v, lit);
        self.memo.insert(self.bdd.mk_var(v), lit);
    }

    /// Encode `f` and expose it as an output.
    pub fn add_output(&mut self, f: Ref, name: Option<&str>) -> Literal {
        let lit = self.encode(f);
        self.aig.add_output(lit, name);
        lit
    }

    pub fn encode(&mut self, f: Ref) -> Literal {
        if self.bdd.is_zero(f) {
            return Literal::FALSE;
        }
        let node = f.regular();
        let lit = match self.memo.get(&node) {
            Some(&lit) => lit,
            None => {
                let index = node.index();
                let var = self.variable_literal(self.bdd.variable(index));
                let then_lit = self.encode(self.bdd.high(index));
                let else_lit = self.encode(self.bdd.low(index));

                let left = self.aig.mk_and(var, then_lit);
                let right = self.aig.mk_and(!var, else_lit);
                let lit = !self.aig.mk_and(!left, !right);
                self.memo.insert(node, lit);
                lit
            }
        };
        if f.is_negated() {
            !lit
        } else {
            lit
        }
    }

    fn variable_literal(&mut self, v: u32) -> Literal {
        match self.bound.get(&v) {
            Some(&lit) => lit,
            None => {
                warn!("Variable x{} is not bound to any signal, declaring a fresh input", v);
                self.add_input(v, None)
            }
        }
    }

    pub fn finish(self) -> Aig {
        self.aig
    }
}

/// Encode a strategy as a combinational circuit.
///
/// Uncontrollable inputs and latches of the arena become inputs, and each
/// policy becomes an output. Both are named with the arena literal they stand
/// for, which is how [`merge`][crate::merge::merge] finds them again.
pub fn encode_strategy(arena: &Arena<'_>, strategy: &Strategy) -> Aig {
    let mut encoder = AigEncoder::new(arena.bdd());

    for (&v, lit) in arena.uncontrollables().iter().zip(arena.uncontrollable_lits()) {
        encoder.add_input(v, Some(&lit.to_string()));
    }
    for (&v, lit) in arena.latches().iter().zip(arena.latch_lits()) {
        encoder.add_input(v, Some(&lit.to_string()));
    }
    for (&policy, lit) in strategy.policies().iter().zip(arena.controllable_lits()) {
        encoder.add_output(policy, Some(&lit.to_string()));
    }

    let aig = encoder.finish();
    info!(
        "Encoded strategy: {} inputs, {} outputs, {} AND gates",
        aig.inputs().len(),
        aig.outputs().len(),
        aig.ands().len()
    );
    aig
}
