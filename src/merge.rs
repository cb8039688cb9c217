//! Closing the loop: feed the strategy circuit back into the arena.
//!
//! The merged circuit keeps every uncontrollable input, latch, output and
//! AND gate of the arena as is. Controllable inputs disappear. Each of them
//! is redefined as an AND gate driven by the strategy output of the same
//! name. Strategy gates are shifted past the arena's variables, and strategy
//! inputs are wired to the arena signals their names refer to.

use std::collections::HashMap;

use log::{debug, info};

use crate::aig::{Aig, Literal, Tag, CONTROLLABLE_MARKER};
use crate::error::{Error, Result};

/// Merge with the default controllable marker.
pub fn merge(arena: &Aig, strategy: &Aig) -> Result<Aig> {
    merge_with_marker(arena, strategy, CONTROLLABLE_MARKER)
}

pub fn merge_with_marker(arena: &Aig, strategy: &Aig, marker: &str) -> Result<Aig> {
    let mut merged = Aig::new();

    let mut controllables: Vec<Literal> = Vec::new();
    for input in arena.inputs() {
        if input.is_controllable(marker) {
            controllables.push(input.lit);
        } else {
            merged.add_input(input.lit, input.name.as_deref());
        }
    }
    for latch in arena.latches() {
        merged.add_latch(latch.lit, latch.next, latch.reset, latch.name.as_deref());
    }
    for output in arena.outputs() {
        merged.add_output(output.lit, output.name.as_deref());
    }
    for gate in arena.ands() {
        merged.add_and(gate.lhs, gate.rhs0, gate.rhs1);
    }

    let offset = arena.next_literal().raw();
    debug!("Shifting strategy gates by {}", offset);

    // Strategy input literal -> arena signal.
    let mut wires: HashMap<Literal, Literal> = HashMap::new();
    for input in strategy.inputs() {
        let target = resolve(input.name.as_deref())
            .filter(|&lit| match arena.tag(lit) {
                Some(Tag::Input) => !controllables.contains(&lit),
                Some(Tag::Latch) => true,
                _ => false,
            })
            .ok_or_else(|| unknown(input.name.as_deref()))?;
        wires.insert(input.lit, target);
    }

    let translate = |lit: Literal| -> Result<Literal> {
        let normalized = lit.normalized();
        match strategy.tag(normalized) {
            Some(Tag::Constant) => Ok(lit),
            Some(Tag::And) => Ok(lit.offset(offset)),
            Some(Tag::Input) => match wires.get(&normalized) {
                Some(&target) if lit.is_negated() => Ok(!target),
                Some(&target) => Ok(target),
                None => Err(Error::DanglingLiteral { literal: lit }),
            },
            Some(Tag::Latch) | None => Err(Error::DanglingLiteral { literal: lit }),
        }
    };

    for gate in strategy.ands() {
        merged.add_and(translate(gate.lhs)?, translate(gate.rhs0)?, translate(gate.rhs1)?);
    }

    let mut driven: Vec<Literal> = Vec::new();
    for output in strategy.outputs() {
        let target = resolve(output.name.as_deref())
            .filter(|lit| controllables.contains(lit) && !driven.contains(lit))
            .ok_or_else(|| unknown(output.name.as_deref()))?;
        merged.add_and(target, translate(output.lit)?, Literal::TRUE);
        driven.push(target);
    }

    if let Some(&lit) = controllables.iter().find(|lit| !driven.contains(lit)) {
        return Err(Error::DanglingLiteral { literal: lit });
    }

    info!(
        "Merged circuit: {} inputs, {} latches, {} AND gates",
        merged.inputs().len(),
        merged.latches().len(),
        merged.ands().len()
    );
    Ok(merged)
}

/// Arena literal a strategy signal is named after.
fn resolve(name: Option<&str>) -> Option<Literal> {
    name?.parse().ok().map(Literal::new)
}

fn unknown(name: Option<&str>) -> Error {
    Error::UnknownSymbol {
        name: name.unwrap_or_default().to_string(),
    }
}
