use std::path::Path;

use log::{info, warn};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use rustc_hash::FxHashMap;

use crate::{
    error::{ConfigError, EngineWarning},
    parsers::ConfigParser,
    particle_list::{Particle, ParticleId, ParticleList},
    reaction::Reaction,
    substance::SubstanceKind,
    substance_table::SubstanceTable,
};

/// The span of one random-walk offset; each draw is uniform in
/// [-scale/2, +scale/2).
const RANDOM_WALK_SCALE: f64 = 0.01;

/// Operations the engine invokes on its host when a particle changes
/// species in place. The bundle is optional; without one, the effects are
/// simply skipped.
pub struct HostCallbacks {
    pub update_ion_mass: Box<dyn FnMut(f64)>,
    pub update_ion_charge: Box<dyn FnMut(f64)>,
    pub update_ion_color: Box<dyn FnMut(usize)>,
}

/// The Monte Carlo reaction engine.
///
/// Owns the substance registry, the configured reactions with their
/// per-species indices, the live particle population, and the random
/// source. Driven either by the standalone one-pot binary or by an
/// external trajectory simulator through the external-index operations.
pub struct Simulation<R: Rng = SmallRng> {
    /// The substance registry.
    substances: SubstanceTable,
    /// All configured reactions, in configuration order.
    reactions: Vec<Reaction>,
    /// For each substance position, the independent reactions whose sole
    /// discrete educt it is, in configuration order.
    ri: Vec<Vec<usize>>,
    /// For each substance position, the dependent reactions it appears in
    /// as a discrete educt. Populated for future scheduling, never fired.
    rd: Vec<Vec<usize>>,
    /// Static probabilities parallel to `ri`; the two are appended
    /// together and never resorted.
    ri_static_probs: Vec<Vec<f64>>,
    /// The live particle population.
    particles: ParticleList,
    /// External ion index → particle handle.
    ion_map: FxHashMap<u64, ParticleId>,
    /// Live particle count per substance position.
    concentrations: Vec<u64>,
    /// The number of accounted time steps.
    n_steps: u64,
    /// The cumulative simulated time.
    sum_timestep: f64,
    /// How many firings happened with a per-step probability of 1 or more.
    ill_events: u64,
    /// The injected random source; every uniform draw comes from here, in
    /// a fixed order, so runs are reproducible under a fixed seed.
    rng: R,
    callbacks: Option<HostCallbacks>,
    log_ill_events: bool,
}

impl Simulation<SmallRng> {
    /// Loads a configuration file with a freshly seeded system RNG.
    pub fn from_config_file(path: &Path, rate_divisor: f64) -> Result<Self, ConfigError> {
        let rng = SmallRng::seed_from_u64(rand::rng().random());
        Simulation::from_config_file_with_rng(path, rate_divisor, rng)
    }
}

impl<R: Rng> Simulation<R> {
    pub fn from_config_file_with_rng(
        path: &Path,
        rate_divisor: f64,
        rng: R,
    ) -> Result<Self, ConfigError> {
        let mut parser = ConfigParser::new(rate_divisor);
        parser.parse_file(path)?;
        let (substances, reactions) = parser.into_network();
        Ok(Simulation::from_network(substances, reactions, rng))
    }

    /// Builds an engine from configuration text held in memory.
    pub fn from_config_str(text: &str, rate_divisor: f64, rng: R) -> Result<Self, ConfigError> {
        let mut parser = ConfigParser::new(rate_divisor);
        parser.parse_str(text)?;
        let (substances, reactions) = parser.into_network();
        Ok(Simulation::from_network(substances, reactions, rng))
    }

    /// Builds an engine from an already parsed network, precomputing the
    /// per-species reaction tables.
    pub fn from_network(
        substances: SubstanceTable,
        reactions: Vec<Reaction>,
        rng: R,
    ) -> Simulation<R> {
        let mut ri = vec![Vec::new(); substances.len()];
        let mut rd = vec![Vec::new(); substances.len()];
        let mut ri_static_probs = vec![Vec::new(); substances.len()];

        for (idx, reaction) in reactions.iter().enumerate() {
            if reaction.independent {
                let s = reaction.discrete_educts[0].0;
                ri[s].push(idx);
                ri_static_probs[s].push(reaction.static_probability);
            } else {
                for &(s, _) in &reaction.discrete_educts {
                    rd[s].push(idx);
                }
            }
        }

        let concentrations = vec![0; substances.len()];
        Simulation {
            substances,
            reactions,
            ri,
            rd,
            ri_static_probs,
            particles: ParticleList::default(),
            ion_map: FxHashMap::default(),
            concentrations,
            n_steps: 0,
            sum_timestep: 0.,
            ill_events: 0,
            rng,
            callbacks: None,
            log_ill_events: false,
        }
    }

    pub fn with_callbacks(mut self, callbacks: HostCallbacks) -> Simulation<R> {
        self.callbacks = Some(callbacks);
        self
    }

    pub fn with_log_ill_events(mut self, log_ill_events: bool) -> Simulation<R> {
        self.log_ill_events = log_ill_events;
        self
    }

    /// Links a new particle under the given external index. An existing
    /// entry under the index is overwritten; the in-place product
    /// replacement in [`Simulation::react`] relies on this.
    pub fn add_particle(&mut self, particle: Particle, index: u64) {
        debug_assert!(
            self.substances.get(particle.substance).is_discrete(),
            "added a particle of the non-discrete substance {:?}",
            self.substances.get(particle.substance).name
        );
        self.concentrations[particle.substance] += 1;
        let id = self.particles.insert(particle);
        self.ion_map.insert(index, id);
    }

    /// Unlinks a particle and updates its species counter. The ion map is
    /// the caller's responsibility: `react` overwrites its entry in place,
    /// `remove_particle` clears it.
    pub fn destroy_particle(&mut self, id: ParticleId) -> Particle {
        let particle = self.particles.remove(id);
        self.concentrations[particle.substance] -= 1;
        particle
    }

    /// Fully retires an external index: destroys its particle and clears
    /// the ion-map entry. Returns None if the index is not live.
    pub fn remove_particle(&mut self, index: u64) -> Option<Particle> {
        let id = self.ion_map.remove(&index)?;
        Some(self.destroy_particle(id))
    }

    /// Writes new coordinates onto the particle under a live external
    /// index. Panics if the index is not live.
    pub fn update_position(&mut self, index: u64, x: f64, y: f64, z: f64) {
        let id = self.ion_map[&index];
        let particle = self
            .particles
            .get_mut(id)
            .expect("ion map handle to an unlinked particle");
        particle.x = x;
        particle.y = y;
        particle.z = z;
    }

    /// Gives the particle under `index` one Monte Carlo opportunity to
    /// react during a step of length `dt`.
    ///
    /// The independent reactions of the particle's substance are tried in
    /// configuration order, one uniform draw per candidate, and the first
    /// to pass its Bernoulli test fires: the particle is destroyed and the
    /// reaction's discrete product is spawned at the same position under
    /// the same external index. One draw is consumed for every candidate
    /// examined up to and including the firing one; this sequence is part
    /// of the observable behavior under a fixed seed.
    ///
    /// The kinetic energy is accepted for a future activation-energy gate
    /// and is currently unused. Panics if `index` is not live.
    pub fn react(&mut self, index: u64, _kinetic_energy: f64, dt: f64) {
        let id = self.ion_map[&index];
        let (substance, x, y, z) = {
            let particle = self
                .particles
                .get(id)
                .expect("ion map handle to an unlinked particle");
            (particle.substance, particle.x, particle.y, particle.z)
        };

        for i in 0..self.ri[substance].len() {
            let u: f64 = self.rng.random();
            let prob = self.ri_static_probs[substance][i] * dt;
            if u >= prob {
                continue;
            }

            let reaction = self.ri[substance][i];
            if prob >= 1. {
                self.ill_events += 1;
                if self.log_ill_events {
                    warn!(
                        "{}",
                        EngineWarning::IllReactionEvent {
                            probability: prob,
                            reaction: self.reactions[reaction].format_pretty(&self.substances),
                        }
                    );
                }
            }

            self.destroy_particle(id);
            match self.reactions[reaction].discrete_products.first().copied() {
                Some(product) => {
                    self.add_particle(Particle::new(product, x, y, z), index);
                    self.notify_species_change(product);
                }
                // A firing with no discrete product destroys the particle
                // outright, so the external index is retired with it.
                None => {
                    self.ion_map.remove(&index);
                }
            }
            return;
        }
        // Dependent reactions in `rd` are indexed but not scheduled here.
    }

    fn notify_species_change(&mut self, substance: usize) {
        let Some(callbacks) = &mut self.callbacks else {
            return;
        };
        if let SubstanceKind::Discrete { mass, charge } = self.substances.get(substance).kind {
            (callbacks.update_ion_mass)(mass);
            (callbacks.update_ion_charge)(charge);
            (callbacks.update_ion_color)(substance);
        }
    }

    /// Accounts one simulation time step of length `dt`.
    pub fn advance_timestep(&mut self, dt: f64) {
        self.n_steps += 1;
        self.sum_timestep += dt;
    }

    /// Offsets every particle by independent uniform draws in x and y,
    /// wrapping both into the unit square. z passes through unmodified.
    pub fn random_walk(&mut self) {
        let rng = &mut self.rng;
        self.particles.for_each_mut(|particle| {
            particle.x =
                (particle.x + (rng.random::<f64>() - 0.5) * RANDOM_WALK_SCALE).rem_euclid(1.);
            particle.y =
                (particle.y + (rng.random::<f64>() - 0.5) * RANDOM_WALK_SCALE).rem_euclid(1.);
        });
    }

    /// Logs the live population per discrete substance and the step
    /// counters.
    pub fn log_state(&self) {
        for (idx, substance) in self.substances.discrete() {
            info!("{}: {} particles", substance.name, self.concentrations[idx]);
        }
        info!(
            "steps: {} simulated time: {} ill events: {}",
            self.n_steps, self.sum_timestep, self.ill_events
        );
    }

    /// Records the embedding's signal that particles are flown one at a
    /// time rather than grouped, which skews aggregate statistics.
    pub fn flag_non_grouped_fly(&self) {
        warn!("{}", EngineWarning::NonGroupedFly);
    }

    pub fn substances(&self) -> &SubstanceTable {
        &self.substances
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    /// The particle currently under an external index.
    pub fn particle(&self, index: u64) -> Option<&Particle> {
        self.ion_map.get(&index).and_then(|&id| self.particles.get(id))
    }

    /// The live external indices, in no particular order.
    pub fn ion_indices(&self) -> impl Iterator<Item = u64> + '_ {
        self.ion_map.keys().copied()
    }

    pub fn n_particles(&self) -> usize {
        self.particles.len()
    }

    /// The live particle count of the substance at a primary position.
    pub fn concentration(&self, substance: usize) -> u64 {
        self.concentrations[substance]
    }

    /// The live particle counts of the discrete substances, in discrete
    /// view order.
    pub fn discrete_concentrations(&self) -> impl Iterator<Item = u64> + '_ {
        self.substances
            .discrete()
            .map(|(idx, _)| self.concentrations[idx])
    }

    pub fn ill_events(&self) -> u64 {
        self.ill_events
    }

    pub fn n_steps(&self) -> u64 {
        self.n_steps
    }

    pub fn sum_timestep(&self) -> f64 {
        self.sum_timestep
    }
}
