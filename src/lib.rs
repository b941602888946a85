mod error;
pub use error::{ConfigError, EngineWarning};
mod parsers;
pub use parsers::ConfigParser;
mod particle_list;
pub use particle_list::{Particle, ParticleId, ParticleList};
mod reaction;
pub use reaction::{Reaction, MAX_PARTNERS};
mod simulation;
pub use simulation::{HostCallbacks, Simulation};
mod substance;
pub use substance::{Substance, SubstanceKind};
mod substance_table;
pub use substance_table::SubstanceTable;
mod tests;
mod utils;
pub use utils::DEFAULT_SEED;
