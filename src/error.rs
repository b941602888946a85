use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised while loading a reaction configuration file.
///
/// Every variant aborts construction of the simulation; the message names
/// the offending line or substance.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be opened or read.
    #[error("failed to read configuration file {path:?}: {source}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A reaction line did not match `educts => products ; rate [; E_a]`.
    #[error("malformed reaction on line {0}")]
    BadReactionLine(usize),

    /// A substance line did not match `name kind [num1] [num2]`.
    #[error("malformed substance on line {0}")]
    BadSubstanceLine(usize),

    /// A discrete substance was declared without both mass and charge.
    #[error("discrete substance {0:?} is missing mass or charge")]
    DiscreteMissingPhysics(String),

    /// A substance line used a kind other than isotropic, discrete or field.
    #[error("unknown substance kind {0:?}")]
    UnknownKind(String),

    /// A reaction referred to a substance that was never declared.
    #[error("unknown species {0:?} in reaction")]
    UnknownSpecies(String),
}

/// Non-fatal conditions reported by the running engine.
///
/// These are logged, never returned: the reaction loop keeps going.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineWarning {
    /// A reaction fired with `static_probability * dt >= 1`, meaning the
    /// time step was too coarse for the configured rate.
    #[error("ill reaction event: {reaction} fired with probability {probability}")]
    IllReactionEvent { probability: f64, reaction: String },

    /// The embedding signalled that particles were flown one at a time, so
    /// aggregate statistics may be inaccurate.
    #[error("particles are not flown grouped; aggregate statistics may be inaccurate")]
    NonGroupedFly,
}
