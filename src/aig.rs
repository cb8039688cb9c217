//! Sequential and-inverter graphs in the AIGER literal convention.
//!
//! A [`Literal`] is `2 * variable + negated`. Literals 0 and 1 are the
//! constants false and true. Inputs, latches and AND gates define positive
//! (even) literals; every other place may use either polarity.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::ops::Not;

/// Name fragment that marks an input as controllable.
pub const CONTROLLABLE_MARKER: &str = "controllable_";

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Literal(u32);

impl Literal {
    pub const FALSE: Literal = Literal(0);
    pub const TRUE: Literal = Literal(1);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn from_var(var: u32) -> Self {
        Self(var << 1)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn variable(self) -> u32 {
        self.0 >> 1
    }

    pub const fn is_negated(self) -> bool {
        self.0 & 1 != 0
    }

    pub const fn is_constant(self) -> bool {
        self.0 <= 1
    }

    /// The positive (even) literal of the same variable.
    pub const fn normalized(self) -> Self {
        Self(self.0 & !1)
    }

    /// Shift a non-constant literal by an even `offset`, keeping its polarity.
    pub const fn offset(self, offset: u32) -> Self {
        Self(self.0 + offset)
    }
}

impl Not for Literal {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self(self.0 ^ 1)
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Symbol {
    pub lit: Literal,
    pub name: Option<String>,
}

impl Symbol {
    pub fn is_controllable(&self, marker: &str) -> bool {
        self.name.as_deref().is_some_and(|name| name.contains(marker))
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Latch {
    pub lit: Literal,
    pub next: Literal,
    /// Initial value. Only 0 and 1 are meaningful.
    pub reset: u32,
    pub name: Option<String>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AndGate {
    pub lhs: Literal,
    pub rhs0: Literal,
    pub rhs1: Literal,
}

/// What defines a (normalized) literal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Tag {
    Constant,
    Input,
    Latch,
    And,
}

#[derive(Debug, Clone, Default)]
pub struct Aig {
    maxvar: u32,
    inputs: Vec<Symbol>,
    latches: Vec<Latch>,
    outputs: Vec<Symbol>,
    ands: Vec<AndGate>,
    tags: HashMap<u32, Tag>,
}

impl Aig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn maxvar(&self) -> u32 {
        self.maxvar
    }
    pub fn inputs(&self) -> &[Symbol] {
        &self.inputs
    }
    pub fn latches(&self) -> &[Latch] {
        &self.latches
    }
    pub fn outputs(&self) -> &[Symbol] {
        &self.outputs
    }
    pub fn ands(&self) -> &[AndGate] {
        &self.ands
    }

    /// The first literal past every variable in use.
    pub fn next_literal(&self) -> Literal {
        Literal::from_var(self.maxvar + 1)
    }

    /// Classify the variable behind `lit`, if it is defined at all.
    pub fn tag(&self, lit: Literal) -> Option<Tag> {
        if lit.is_constant() {
            return Some(Tag::Constant);
        }
        self.tags.get(&lit.variable()).copied()
    }

    fn define(&mut self, lit: Literal, tag: Tag) {
        self.maxvar = self.maxvar.max(lit.variable());
        self.tags.insert(lit.variable(), tag);
    }

    pub fn add_input(&mut self, lit: Literal, name: Option<&str>) {
        self.define(lit, Tag::Input);
        self.inputs.push(Symbol {
            lit,
            name: name.map(str::to_string),
        });
    }

    pub fn add_latch(&mut self, lit: Literal, next: Literal, reset: u32, name: Option<&str>) {
        self.define(lit, Tag::Latch);
        self.maxvar = self.maxvar.max(next.variable());
        self.latches.push(Latch {
            lit,
            next,
            reset,
            name: name.map(str::to_string),
        });
    }

    /// Rewire the next-state literal of the `index`-th latch.
    ///
    /// Lets a latch be declared before the logic that feeds it.
    pub fn set_latch_next(&mut self, index: usize, next: Literal) {
        self.maxvar = self.maxvar.max(next.variable());
        self.latches[index].next = next;
    }

    pub fn add_output(&mut self, lit: Literal, name: Option<&str>) {
        self.maxvar = self.maxvar.max(lit.variable());
        self.outputs.push(Symbol {
            lit,
            name: name.map(str::to_string),
        });
    }

    pub fn add_and(&mut self, lhs: Literal, rhs0: Literal, rhs1: Literal) {
        self.define(lhs, Tag::And);
        self.maxvar = self.maxvar.max(rhs0.variable()).max(rhs1.variable());
        self.ands.push(AndGate { lhs, rhs0, rhs1 });
    }

    /// Allocate a fresh AND gate, folding the degenerate cases.
    pub fn mk_and(&mut self, rhs0: Literal, rhs1: Literal) -> Literal {
        if rhs0 == Literal::FALSE || rhs1 == Literal::FALSE || rhs0 == !rhs1 {
            return Literal::FALSE;
        }
        if rhs0 == Literal::TRUE || rhs0 == rhs1 {
            return rhs1;
        }
        if rhs1 == Literal::TRUE {
            return rhs0;
        }
        let lhs = self.next_literal();
        self.add_and(lhs, rhs0, rhs1);
        lhs
    }

    /// Allocate a fresh input.
    pub fn mk_input(&mut self, name: Option<&str>) -> Literal {
        let lit = self.next_literal();
        self.add_input(lit, name);
        lit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal() {
        let a = Literal::from_var(3);
        assert_eq!(a.raw(), 6);
        assert_eq!(a.variable(), 3);
        assert!(!a.is_negated());
        assert!((!a).is_negated());
        assert_eq!((!a).normalized(), a);
        assert_eq!(!Literal::FALSE, Literal::TRUE);
        assert!(Literal::TRUE.is_constant());
        assert_eq!((!a).offset(10), Literal::new(17));
    }

    #[test]
    fn test_tags_and_maxvar() {
        let mut aig = Aig::new();
        aig.add_input(Literal::new(2), Some("controllable_x"));
        aig.add_latch(Literal::new(4), Literal::new(7), 0, None);
        aig.add_and(Literal::new(6), Literal::new(2), Literal::new(5));
        aig.add_output(Literal::new(6), Some("bad"));

        assert_eq!(aig.maxvar(), 3);
        assert_eq!(aig.next_literal(), Literal::new(8));
        assert_eq!(aig.tag(Literal::new(1)), Some(Tag::Constant));
        assert_eq!(aig.tag(Literal::new(3)), Some(Tag::Input));
        assert_eq!(aig.tag(Literal::new(4)), Some(Tag::Latch));
        assert_eq!(aig.tag(Literal::new(7)), Some(Tag::And));
        assert_eq!(aig.tag(Literal::new(8)), None);
        assert!(aig.inputs()[0].is_controllable(CONTROLLABLE_MARKER));
        assert!(!aig.outputs()[0].is_controllable(CONTROLLABLE_MARKER));
    }

    #[test]
    fn test_mk_and_folding() {
        let mut aig = Aig::new();
        let x = aig.mk_input(None);
        let y = aig.mk_input(None);

        assert_eq!(aig.mk_and(x, Literal::FALSE), Literal::FALSE);
        assert_eq!(aig.mk_and(Literal::TRUE, y), y);
        assert_eq!(aig.mk_and(x, Literal::TRUE), x);
        assert_eq!(aig.mk_and(x, x), x);
        assert_eq!(aig.mk_and(x, !x), Literal::FALSE);
        assert!(aig.ands().is_empty());

        let z = aig.mk_and(x, !y);
        assert_eq!(z, Literal::new(6));
        assert_eq!(aig.ands(), &[AndGate { lhs: z, rhs0: x, rhs1: !y }]);
    }

    #[test]
    fn test_latch_declared_first() {
        let mut aig = Aig::new();
        let i = aig.mk_input(None);
        let l = aig.next_literal();
        aig.add_latch(l, Literal::FALSE, 1, None);
        let next = aig.mk_and(i, !l);
        aig.set_latch_next(0, next);

        assert_eq!(next, Literal::new(6));
        assert_eq!(aig.latches()[0].next, next);
        assert_eq!(aig.maxvar(), 3);
    }
}
