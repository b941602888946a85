use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;
use ionkin::{Particle, Simulation};
use rand::{rng, rngs::SmallRng, Rng, SeedableRng};

// See also `clap_cargo::style::CLAP_STYLING`
pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

#[derive(Debug, Parser)]
#[command(
    name = "ionkin",
    about = "Monte Carlo simulation of reaction kinetics for discrete charged particles.",
    long_about = "A one-pot driver for the Monte Carlo reaction kinetics engine.
The configuration file declares the chemical species and the elementary
reactions between them, in the format:

[substances]
M   isotropic 2.0
A   discrete  100 1
B   discrete  100 1
[reactions]
A + 2M => B ; 0.5

The driver seeds a population of the first discrete substance, then per time
step lets every particle react, random-walks the survivors, and appends the
per-species counts to the output file.",
    styles = CLAP_STYLING,
)]
struct Cli {
    /// The reaction configuration file.
    config: PathBuf,

    /// The number of time steps to simulate.
    n_steps: u64,

    /// The upper bound of the randomly drawn per-step duration.
    max_dt: f64,

    /// How many particles of the first discrete substance to seed.
    n_particles: u64,

    /// The output file; one `time; c_1; ...; c_D;` line per time step.
    out_file: PathBuf,

    /// The seed to use for random number generation.
    #[arg(long)]
    seed: Option<u64>,

    /// The divisor applied to every configured rate constant, converting
    /// it into the engine's time-unit basis.
    #[arg(long, default_value_t = 1.0)]
    rate_divisor: f64,

    /// Whether to log every ill reaction event as it happens.
    #[arg(long)]
    log_ill_events: bool,
}

fn run(args: Cli) -> anyhow::Result<()> {
    let mut driver_rng = SmallRng::seed_from_u64(args.seed.unwrap_or_else(|| rng().random()));
    let engine_rng = SmallRng::seed_from_u64(driver_rng.random());

    let mut sim = Simulation::from_config_file_with_rng(&args.config, args.rate_divisor, engine_rng)?
        .with_log_ill_events(args.log_ill_events);

    anyhow::ensure!(
        sim.substances().discrete_len() > 0,
        "the configuration defines no discrete substance to seed particles of"
    );
    let seeded = sim.substances().discrete_index(0);
    for index in 1..=args.n_particles {
        let particle = Particle::new(seeded, driver_rng.random(), driver_rng.random(), 0.);
        sim.add_particle(particle, index);
    }

    let mut out = BufWriter::new(
        File::create(&args.out_file)
            .with_context(|| format!("failed to create {:?}", args.out_file))?,
    );

    for _ in 0..args.n_steps {
        let dt = driver_rng.random::<f64>() * args.max_dt;
        sim.advance_timestep(dt);

        // Reacting in ascending index order keeps runs reproducible: the
        // particles share one PRNG stream.
        let mut indices: Vec<u64> = sim.ion_indices().collect();
        indices.sort_unstable();
        for index in indices {
            sim.react(index, 0., dt);
        }
        sim.random_walk();

        write!(out, "{}; ", sim.sum_timestep())?;
        for count in sim.discrete_concentrations() {
            write!(out, "{count}; ")?;
        }
        writeln!(out)?;
    }

    let mean_dt = if sim.n_steps() == 0 {
        0.
    } else {
        sim.sum_timestep() / sim.n_steps() as f64
    };
    writeln!(out, " ill events: {} mean dt: {}", sim.ill_events(), mean_dt)?;
    out.flush()?;

    sim.log_state();
    Ok(())
}

pub fn main() -> anyhow::Result<()> {
    env_logger::init();
    run(Cli::parse())
}
