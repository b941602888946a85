use derive_new::new;

/// The representation of a chemical species in the simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SubstanceKind {
    /// A background species represented only by a fixed concentration.
    Isotropic { concentration: f64 },
    /// A species represented by explicit simulated particles.
    Discrete { mass: f64, charge: f64 },
    /// A field species; carries no physical attributes here.
    Field,
}

/// A single chemical species: a unique, case-sensitive name plus its kind.
#[derive(Clone, Debug, PartialEq, new)]
pub struct Substance {
    pub name: String,
    pub kind: SubstanceKind,
}

impl Substance {
    /// Whether this species is represented by explicit particles.
    pub fn is_discrete(&self) -> bool {
        matches!(self.kind, SubstanceKind::Discrete { .. })
    }

    /// The static background concentration; zero for non-isotropic kinds.
    pub fn static_concentration(&self) -> f64 {
        match self.kind {
            SubstanceKind::Isotropic { concentration } => concentration,
            _ => 0.,
        }
    }
}
