//! The [`Bdd`] context: a shared unique table plus computed table.
//!
//! All boolean functions are built and combined through a single `Bdd` value,
//! which every component of the synthesis pipeline receives by reference.
//! Nodes are never freed while the context lives, so a [`Ref`] obtained once
//! stays valid for every later call.
//!
//! Variables are 1-indexed. A smaller variable index is closer to the root.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt::Debug;

use log::debug;

use crate::cache::Cache;
use crate::node::Node;
use crate::reference::Ref;
use crate::storage::Storage;
use crate::utils::{pairing3, MyHash};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OpKey {
    Ite(Ref, Ref, Ref),
    Exists(Ref, Ref),
    Restrict(Ref, Ref),
}

impl MyHash for OpKey {
    fn hash(&self) -> u64 {
        match *self {
            OpKey::Ite(f, g, h) => pairing3(f.as_lit(), g.as_lit(), h.as_lit()),
            OpKey::Exists(f, cube) => pairing3(1, f.as_lit(), cube.as_lit()),
            OpKey::Restrict(f, care) => pairing3(2, f.as_lit(), care.as_lit()),
        }
    }
}

pub struct Bdd {
    storage: RefCell<Storage>,
    cache: RefCell<Cache<OpKey, Ref>>,
    size_cache: RefCell<Cache<Ref, u64>>,
    pub zero: Ref,
    pub one: Ref,
}

impl Bdd {
    pub fn new(cache_bits: usize) -> Self {
        assert!(
            cache_bits <= 31,
            "Cache bits should be in the range 0..=31"
        );

        let storage = Storage::with_capacity(1 << cache_bits.min(20));
        let one = Ref::positive(1); // the terminal lives at index 1
        let zero = -one;

        Self {
            storage: RefCell::new(storage),
            cache: RefCell::new(Cache::new(cache_bits)),
            size_cache: RefCell::new(Cache::new(cache_bits.min(16))),
            zero,
            one,
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new(16)
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.cache.borrow();
        f.debug_struct("Bdd")
            .field("size", &self.storage.borrow().size())
            .field("cache_hits", &cache.hits())
            .field("cache_misses", &cache.misses())
            .finish()
    }
}

impl Bdd {
    pub fn cache(&self) -> std::cell::Ref<'_, Cache<OpKey, Ref>> {
        self.cache.borrow()
    }

    /// Number of nodes allocated so far, terminal included.
    pub fn num_nodes(&self) -> usize {
        self.storage.borrow().size()
    }

    pub fn variable(&self, index: u32) -> u32 {
        self.storage.borrow().node(index).variable
    }
    pub fn low(&self, index: u32) -> Ref {
        self.storage.borrow().node(index).low
    }
    pub fn high(&self, index: u32) -> Ref {
        self.storage.borrow().node(index).high
    }

    pub fn low_node(&self, node: Ref) -> Ref {
        let low = self.low(node.index());
        if node.is_negated() {
            -low
        } else {
            low
        }
    }
    pub fn high_node(&self, node: Ref) -> Ref {
        let high = self.high(node.index());
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == self.zero
    }
    pub fn is_one(&self, node: Ref) -> bool {
        node == self.one
    }
    pub fn is_terminal(&self, node: Ref) -> bool {
        self.is_zero(node) || self.is_one(node)
    }

    pub fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");

        // Handle canonicity
        if high.is_negated() {
            return -self.mk_node(v, -low, -high);
        }

        // Handle duplicates
        if low == high {
            return low;
        }

        let i = self.storage.borrow_mut().put(Node {
            variable: v,
            low,
            high,
        });
        Ref::positive(i)
    }

    pub fn mk_var(&self, v: u32) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");
        self.mk_node(v, self.zero, self.one)
    }

    /// Positive conjunction of the given variables, used as a quantification scope.
    pub fn mk_cube(&self, vars: impl IntoIterator<Item = u32>) -> Ref {
        let vars: BTreeSet<u32> = vars.into_iter().collect();
        debug!("mk_cube(vars = {:?})", vars);
        let mut current = self.one;
        for &v in vars.iter().rev() {
            current = self.mk_node(v, self.zero, current);
        }
        current
    }

    pub fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        assert_ne!(v, 0, "Variable index should not be zero");

        let i = node.index();
        if self.is_terminal(node) || v < self.variable(i) {
            return (node, node);
        }
        assert_eq!(v, self.variable(i));
        (self.low_node(node), self.high_node(node))
    }

    fn top_variable(&self, nodes: &[Ref]) -> u32 {
        nodes
            .iter()
            .filter(|&&node| !self.is_terminal(node))
            .map(|node| self.variable(node.index()))
            .min()
            .unwrap_or(0)
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(f, g, h) = (f ∧ g) ∨ (¬f ∧ h)
    /// ```
    ///
    /// # Examples
    ///
    /// ```
    /// use safety_synth::bdd::Bdd;
    ///
    /// let bdd = Bdd::default();
    /// let x = bdd.mk_var(1);
    /// let y = bdd.mk_var(2);
    /// let z = bdd.mk_var(3);
    /// let f = bdd.apply_ite(x, y, z);
    /// assert_eq!(f, bdd.apply_or(bdd.apply_and(x, y), bdd.apply_and(-x, z)));
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        debug!("apply_ite(f = {}, g = {}, h = {})", f, g, h);

        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        if self.is_one(f) {
            return g;
        }
        if self.is_zero(f) {
            return h;
        }
        if g == h {
            return g;
        }
        if self.is_one(g) && self.is_zero(h) {
            return f;
        }
        if self.is_zero(g) && self.is_one(h) {
            return -f;
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,G,~F) => ite(F,G,1)
        if g == f {
            return self.apply_ite(f, self.one, h);
        }
        if g == -f {
            return self.apply_ite(f, self.zero, h);
        }
        if h == f {
            return self.apply_ite(f, g, self.zero);
        }
        if h == -f {
            return self.apply_ite(f, g, self.one);
        }

        // ite(~F,G,H) => ite(F,H,G)
        let (f, g, h) = if f.is_negated() { (-f, h, g) } else { (f, g, h) };

        // ite(F,~G,H) => ~ite(F,G,~H)
        let (g, h, negate) = if g.is_negated() {
            (-g, -h, true)
        } else {
            (g, h, false)
        };

        let key = OpKey::Ite(f, g, h);
        let cached = self.cache.borrow().get(&key).copied();
        let res = match cached {
            Some(res) => res,
            None => {
                let m = self.top_variable(&[f, g, h]);
                assert_ne!(m, 0);

                let (f0, f1) = self.top_cofactors(f, m);
                let (g0, g1) = self.top_cofactors(g, m);
                let (h0, h1) = self.top_cofactors(h, m);

                let e = self.apply_ite(f0, g0, h0);
                let t = self.apply_ite(f1, g1, h1);
                let res = self.mk_node(m, e, t);
                self.cache.borrow_mut().insert(key, res);
                res
            }
        };

        if negate {
            -res
        } else {
            res
        }
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.zero)
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, self.one, v)
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, -v, v)
    }

    /// Equivalence, a.k.a. XNOR.
    pub fn apply_eq(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, -v)
    }

    pub fn apply_imply(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, self.one)
    }

    pub fn apply_and_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        let mut res = self.one;
        for node in nodes.into_iter() {
            res = self.apply_and(res, node);
        }
        res
    }

    pub fn apply_or_many(&self, nodes: impl IntoIterator<Item = Ref>) -> Ref {
        let mut res = self.zero;
        for node in nodes.into_iter() {
            res = self.apply_or(res, node);
        }
        res
    }

    /// Check whether `f ⇒ g` is valid.
    pub fn is_implies(&self, f: Ref, g: Ref) -> bool {
        self.is_one(self.apply_imply(f, g))
    }

    /// Existential quantification `∃ vars(cube). f`.
    ///
    /// `cube` must be a positive conjunction of variables, see [`Bdd::mk_cube`].
    pub fn exists(&self, f: Ref, cube: Ref) -> Ref {
        debug!("exists(f = {}, cube = {})", f, cube);
        assert!(!self.is_zero(cube), "Cube should not be zero");

        if self.is_terminal(f) {
            return f;
        }

        let v = self.variable(f.index());

        // Skip the cube variables above the top variable of `f`.
        let mut cube = cube;
        while !self.is_one(cube) && self.variable(cube.index()) < v {
            cube = self.high_node(cube);
        }
        if self.is_one(cube) {
            return f;
        }

        let key = OpKey::Exists(f, cube);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return res;
        }

        let (f0, f1) = self.top_cofactors(f, v);
        let res = if self.variable(cube.index()) == v {
            let rest = self.high_node(cube);
            let e = self.exists(f0, rest);
            if self.is_one(e) {
                self.one
            } else {
                let t = self.exists(f1, rest);
                self.apply_or(e, t)
            }
        } else {
            let e = self.exists(f0, cube);
            let t = self.exists(f1, cube);
            self.mk_node(v, e, t)
        };

        self.cache.borrow_mut().insert(key, res);
        res
    }

    /// Universal quantification `∀ vars(cube). f`.
    pub fn forall(&self, f: Ref, cube: Ref) -> Ref {
        debug!("forall(f = {}, cube = {})", f, cube);
        -self.exists(-f, cube)
    }

    /// Cofactor `f|v<-b`.
    pub fn cofactor(&self, f: Ref, v: u32, b: bool) -> Ref {
        let mut cache = HashMap::new();
        self.cofactor_(f, v, b, &mut cache)
    }

    fn cofactor_(&self, f: Ref, v: u32, b: bool, cache: &mut HashMap<Ref, Ref>) -> Ref {
        assert_ne!(v, 0, "Variable index should not be zero");

        if self.is_terminal(f) {
            return f;
        }

        let i = self.variable(f.index());

        if v < i {
            // 'f' does not depend on 'v'
            return f;
        }

        if v == i {
            return if b {
                self.high_node(f)
            } else {
                self.low_node(f)
            };
        }

        if let Some(&res) = cache.get(&f) {
            return res;
        }

        let low = self.cofactor_(self.low_node(f), v, b, cache);
        let high = self.cofactor_(self.high_node(f), v, b, cache);
        let res = self.mk_node(i, low, high);
        cache.insert(f, res);
        res
    }

    /// Simultaneous substitution of every variable.
    ///
    /// Variable `v` is replaced by `vector[v - 1]`; variables beyond the end
    /// of `vector` are left untouched.
    pub fn vector_compose(&self, f: Ref, vector: &[Ref]) -> Ref {
        debug!("vector_compose(f = {}, |vector| = {})", f, vector.len());
        let mut cache = HashMap::new();
        self.vector_compose_(f, vector, &mut cache)
    }

    fn vector_compose_(&self, f: Ref, vector: &[Ref], cache: &mut HashMap<u32, Ref>) -> Ref {
        if self.is_terminal(f) {
            return f;
        }
        if f.is_negated() {
            return -self.vector_compose_(-f, vector, cache);
        }
        if let Some(&res) = cache.get(&f.index()) {
            return res;
        }

        let index = f.index();
        let v = self.variable(index);
        let low = self.vector_compose_(self.low(index), vector, cache);
        let high = self.vector_compose_(self.high(index), vector, cache);
        let g = match vector.get(v as usize - 1) {
            Some(&g) => g,
            None => self.mk_var(v),
        };
        let res = self.apply_ite(g, high, low);
        cache.insert(index, res);
        res
    }

    /// Generalized cofactor in the sense of Coudert and Madre.
    ///
    /// The result agrees with `f` wherever `care` holds and is usually smaller.
    /// It never depends on a variable that `f` does not depend on.
    pub fn restrict(&self, f: Ref, care: Ref) -> Ref {
        debug!("restrict(f = {}, care = {})", f, care);

        if self.is_zero(care) {
            return self.zero;
        }
        if self.is_one(care) || self.is_terminal(f) {
            return f;
        }
        if f == care {
            return self.one;
        }
        if f == -care {
            return self.zero;
        }

        let key = OpKey::Restrict(f, care);
        if let Some(&res) = self.cache.borrow().get(&key) {
            return res;
        }

        let vf = self.variable(f.index());
        let vc = self.variable(care.index());

        let res = if vc < vf {
            // `f` does not depend on `vc`: widen the care set instead.
            let (c0, c1) = self.top_cofactors(care, vc);
            self.restrict(f, self.apply_or(c0, c1))
        } else {
            let (f0, f1) = self.top_cofactors(f, vf);
            let (c0, c1) = self.top_cofactors(care, vf);
            if self.is_zero(c1) {
                self.restrict(f0, c0)
            } else if self.is_zero(c0) {
                self.restrict(f1, c1)
            } else {
                let low = self.restrict(f0, c0);
                let high = self.restrict(f1, c1);
                self.mk_node(vf, low, high)
            }
        };

        self.cache.borrow_mut().insert(key, res);
        res
    }

    pub fn descendants(&self, nodes: impl IntoIterator<Item = Ref>) -> HashSet<u32> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from_iter(nodes);

        while let Some(node) = queue.pop_front() {
            let i = node.index();
            if visited.insert(i) && !self.is_terminal(node) {
                queue.push_back(self.low(i));
                queue.push_back(self.high(i));
            }
        }

        visited
    }

    /// Number of nodes reachable from `f`, the terminal included.
    pub fn size(&self, f: Ref) -> u64 {
        if let Some(&size) = self.size_cache.borrow().get(&f) {
            return size;
        }
        let size = self.descendants([f]).len() as u64;
        self.size_cache.borrow_mut().insert(f, size);
        size
    }

    /// Set of variables `f` depends on.
    pub fn support(&self, f: Ref) -> BTreeSet<u32> {
        self.descendants([f])
            .into_iter()
            .map(|i| self.variable(i))
            .filter(|&v| v != 0)
            .collect()
    }

    pub fn to_bracket_string(&self, node: Ref) -> String {
        if self.is_zero(node) {
            return "(0)".to_string();
        } else if self.is_one(node) {
            return "(1)".to_string();
        }

        let v = self.variable(node.index());
        let low = self.low_node(node);
        let high = self.high_node(node);

        format!(
            "{}:(x{}, {}, {})",
            node,
            v,
            self.to_bracket_string(high),
            self.to_bracket_string(low)
        )
    }
}
