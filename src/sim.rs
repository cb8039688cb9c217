//! Concrete cycle-by-cycle simulation of an [`Aig`].

use std::collections::HashMap;

use crate::aig::{Aig, AndGate, Literal, Tag};
use crate::error::{Error, Result};

pub struct Simulator<'a> {
    aig: &'a Aig,
    gates: HashMap<Literal, AndGate>,
    state: Vec<bool>,
}

impl<'a> Simulator<'a> {
    /// Start a simulation with every latch at its reset value.
    pub fn new(aig: &'a Aig) -> Result<Self> {
        let state = aig
            .latches()
            .iter()
            .map(|latch| match latch.reset {
                0 => Ok(false),
                1 => Ok(true),
                reset => Err(Error::InvalidReset {
                    latch: latch.lit,
                    reset,
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        let gates = aig.ands().iter().map(|gate| (gate.lhs, *gate)).collect();
        Ok(Self { aig, gates, state })
    }

    /// Current latch values, in declaration order.
    pub fn state(&self) -> &[bool] {
        &self.state
    }

    /// Apply one input vector (in input declaration order), return the output
    /// values of this cycle and advance the latches.
    pub fn step(&mut self, inputs: &[bool]) -> Result<Vec<bool>> {
        assert_eq!(
            inputs.len(),
            self.aig.inputs().len(),
            "Expected one value per input"
        );

        let mut values: HashMap<Literal, bool> = HashMap::new();
        values.insert(Literal::FALSE, false);
        for (input, &value) in self.aig.inputs().iter().zip(inputs) {
            values.insert(input.lit, value);
        }
        for (latch, &value) in self.aig.latches().iter().zip(&self.state) {
            values.insert(latch.lit, value);
        }

        let mut in_progress = Vec::new();
        let outputs = self
            .aig
            .outputs()
            .iter()
            .map(|output| self.value(output.lit, &mut values, &mut in_progress))
            .collect::<Result<Vec<_>>>()?;
        let next = self
            .aig
            .latches()
            .iter()
            .map(|latch| self.value(latch.next, &mut values, &mut in_progress))
            .collect::<Result<Vec<_>>>()?;

        self.state = next;
        Ok(outputs)
    }

    fn value(
        &self,
        lit: Literal,
        values: &mut HashMap<Literal, bool>,
        in_progress: &mut Vec<Literal>,
    ) -> Result<bool> {
        let normalized = lit.normalized();
        let value = match values.get(&normalized) {
            Some(&value) => value,
            None => {
                if self.aig.tag(normalized) != Some(Tag::And) {
                    return Err(Error::DanglingLiteral { literal: lit });
                }
                let gate = match self.gates.get(&normalized) {
                    Some(gate) => *gate,
                    None => return Err(Error::DanglingLiteral { literal: lit }),
                };
                if in_progress.contains(&normalized) {
                    return Err(Error::CyclicDependency {
                        literal: normalized,
                    });
                }
                in_progress.push(normalized);
                let left = self.value(gate.rhs0, values, in_progress)?;
                let right = self.value(gate.rhs1, values, in_progress)?;
                in_progress.pop();
                let value = left && right;
                values.insert(normalized, value);
                value
            }
        };
        Ok(value ^ lit.is_negated())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    #[test]
    fn test_toggle_latch() {
        // l' = l XOR i, output = l
        let mut aig = Aig::new();
        let i = Literal::new(2);
        let l = Literal::new(4);
        aig.add_input(i, None);
        aig.add_latch(l, Literal::new(11), 0, None);
        aig.add_and(Literal::new(6), l, !i);
        aig.add_and(Literal::new(8), !l, i);
        aig.add_and(Literal::new(10), Literal::new(7), Literal::new(9));
        aig.add_output(l, None);

        let mut sim = Simulator::new(&aig).unwrap();
        assert_eq!(sim.step(&[true]).unwrap(), vec![false]);
        assert_eq!(sim.state(), &[true]);
        assert_eq!(sim.step(&[false]).unwrap(), vec![true]);
        assert_eq!(sim.step(&[true]).unwrap(), vec![true]);
        assert_eq!(sim.state(), &[false]);
    }

    #[test]
    fn test_constant_true_output() {
        let mut aig = Aig::new();
        aig.add_output(Literal::TRUE, None);

        let mut sim = Simulator::new(&aig).unwrap();
        assert_eq!(sim.step(&[]).unwrap(), vec![true]);
    }

    #[test]
    fn test_dangling_and_cycle() {
        let mut aig = Aig::new();
        aig.add_output(Literal::new(4), None);
        let mut sim = Simulator::new(&aig).unwrap();
        assert_eq!(
            sim.step(&[]),
            Err(Error::DanglingLiteral {
                literal: Literal::new(4)
            })
        );

        let mut aig = Aig::new();
        aig.add_and(Literal::new(2), Literal::new(4), Literal::TRUE);
        aig.add_and(Literal::new(4), Literal::new(3), Literal::TRUE);
        aig.add_output(Literal::new(2), None);
        let mut sim = Simulator::new(&aig).unwrap();
        assert!(matches!(
            sim.step(&[]),
            Err(Error::CyclicDependency { .. })
        ));
    }

    #[test]
    fn test_invalid_reset() {
        let mut aig = Aig::new();
        aig.add_latch(Literal::new(2), Literal::new(2), 5, None);
        assert!(matches!(
            Simulator::new(&aig),
            Err(Error::InvalidReset { reset: 5, .. })
        ));
    }
}
