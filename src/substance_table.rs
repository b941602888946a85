use rustc_hash::FxHashMap;

use crate::substance::Substance;

/// A registry of substances with three simultaneous views: the primary
/// insertion-ordered sequence, a name → position map, and the ascending
/// list of primary positions holding discrete substances.
///
/// Positions are stable: adding a substance under an existing name replaces
/// the prior entry in place and reconciles the discrete view.
#[derive(Clone, Debug, Default)]
pub struct SubstanceTable {
    substances: Vec<Substance>,
    name_index: FxHashMap<String, usize>,
    /// Primary positions of the discrete substances, ascending.
    discrete: Vec<usize>,
}

impl SubstanceTable {
    /// Adds a substance, replacing in place if the name is already present.
    /// Returns the substance's primary position.
    pub fn add(&mut self, substance: Substance) -> usize {
        if let Some(&idx) = self.name_index.get(&substance.name) {
            let was_discrete = self.substances[idx].is_discrete();
            let is_discrete = substance.is_discrete();
            self.substances[idx] = substance;
            match (was_discrete, is_discrete) {
                (true, false) => self.discrete.retain(|&d| d != idx),
                (false, true) => {
                    let pos = self.discrete.partition_point(|&d| d < idx);
                    self.discrete.insert(pos, idx);
                }
                _ => {}
            }
            idx
        } else {
            let idx = self.substances.len();
            self.name_index.insert(substance.name.clone(), idx);
            if substance.is_discrete() {
                self.discrete.push(idx);
            }
            self.substances.push(substance);
            idx
        }
    }

    /// Looks a substance up by name.
    pub fn by_name(&self, name: &str) -> Option<&Substance> {
        self.name_index.get(name).map(|&idx| &self.substances[idx])
    }

    /// Looks a substance's primary position up by name.
    pub fn index_by_name(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    /// The substance at the given primary position.
    pub fn get(&self, idx: usize) -> &Substance {
        &self.substances[idx]
    }

    /// The primary position of the j-th discrete substance.
    pub fn discrete_index(&self, j: usize) -> usize {
        self.discrete[j]
    }

    pub fn len(&self) -> usize {
        self.substances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substances.is_empty()
    }

    /// The number of discrete substances.
    pub fn discrete_len(&self) -> usize {
        self.discrete.len()
    }

    /// Iterates over all substances in primary order.
    pub fn iter(&self) -> impl Iterator<Item = &Substance> {
        self.substances.iter()
    }

    /// Iterates over all substance names in primary order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.substances.iter().map(|s| s.name.as_str())
    }

    /// Iterates over the discrete substances with their primary positions.
    pub fn discrete(&self) -> impl Iterator<Item = (usize, &Substance)> {
        self.discrete.iter().map(|&idx| (idx, &self.substances[idx]))
    }
}
