use itertools::Itertools;
use smallvec::SmallVec;

use crate::substance::SubstanceKind;
use crate::substance_table::SubstanceTable;

pub const MAX_PARTNERS: usize = 4;

/// Substance coefficients for one side of a reaction, as ascending
/// (primary position, stoichiometric coefficient) pairs.
pub type PartnerVec = SmallVec<[(usize, u32); MAX_PARTNERS]>;

/// A struct describing a single elementary reaction.
#[derive(Clone, Debug)]
pub struct Reaction {
    /// The educts of the reaction.
    pub educts: PartnerVec,
    /// The products of the reaction; only discrete substances take part in
    /// particle spawning, other kinds are treated as static background.
    pub products: PartnerVec,
    /// The rate constant, already in the engine's time-unit basis.
    pub rate_constant: f64,
    /// The activation energy, if the configuration supplied one.
    pub activation_energy: Option<f64>,
    /// The subset of the educts whose substance is discrete.
    pub discrete_educts: PartnerVec,
    /// The discrete products as a flat multiset: each discrete product
    /// repeated by its coefficient.
    pub discrete_products: SmallVec<[usize; MAX_PARTNERS]>,
    /// The rate constant pre-multiplied by the powers of all isotropic
    /// educt concentrations.
    pub static_probability: f64,
    /// Whether the total discrete educt coefficient is exactly one.
    pub independent: bool,
}

impl Reaction {
    pub fn new(
        educts: PartnerVec,
        products: PartnerVec,
        rate_constant: f64,
        activation_energy: Option<f64>,
        substances: &SubstanceTable,
    ) -> Reaction {
        let discrete_educts: PartnerVec = educts
            .iter()
            .filter(|&&(idx, _)| substances.get(idx).is_discrete())
            .copied()
            .collect();

        let mut discrete_products = SmallVec::new();
        for &(idx, factor) in &products {
            if substances.get(idx).is_discrete() {
                for _ in 0..factor {
                    discrete_products.push(idx);
                }
            }
        }

        // Only isotropic educts scale the probability; field educts are
        // pass-through background.
        let mut static_probability = rate_constant;
        for &(idx, factor) in &educts {
            if let SubstanceKind::Isotropic { concentration } = substances.get(idx).kind {
                static_probability *= concentration.powi(factor as i32);
            }
        }

        let n_discrete: u32 = discrete_educts.iter().map(|&(_, factor)| factor).sum();

        Reaction {
            educts,
            products,
            rate_constant,
            activation_energy,
            discrete_educts,
            discrete_products,
            static_probability,
            independent: n_discrete == 1,
        }
    }

    fn format_partner(partner: (usize, u32), substances: &SubstanceTable) -> String {
        if partner.1 == 1 {
            substances.get(partner.0).name.clone()
        } else {
            format!("{}{}", partner.1, substances.get(partner.0).name)
        }
    }

    /// Renders the reaction in configuration notation, e.g. `A + 2M => B`.
    pub fn format_pretty(&self, substances: &SubstanceTable) -> String {
        let format_side = |side: &PartnerVec| {
            if side.is_empty() {
                "∅".to_owned()
            } else {
                side.iter()
                    .map(|&partner| Reaction::format_partner(partner, substances))
                    .join(" + ")
            }
        };
        format!("{} => {}", format_side(&self.educts), format_side(&self.products))
    }
}
