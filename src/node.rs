use crate::reference::Ref;

/// Decision node: `if variable then high else low`.
///
/// Stored nodes never carry a complemented `high` edge.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Node {
    pub variable: u32,
    pub low: Ref,
    pub high: Ref,
}

impl Node {
    /// The terminal node. Its variable is 0 and both edges point back to itself.
    pub(crate) const fn terminal() -> Self {
        let one = Ref::positive(1);
        Self {
            variable: 0,
            low: one,
            high: one,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.variable == 0
    }
}
