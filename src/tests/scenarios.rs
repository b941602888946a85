use crate::tests::scripted_rng::ScriptedRng;
use crate::{ConfigParser, Particle, Simulation};

const DECAY: &str = "\
[substances]
A discrete 100 1
B discrete 100 1
[reactions]
A => B ; 1.0
";

/// Builds a simulation over `config` with one particle of substance `A`
/// at the origin under external index 1, reacting on a scripted stream.
fn single_particle(config: &str, draws: &[f64]) -> Simulation<ScriptedRng> {
    let mut sim = Simulation::from_config_str(config, 1., ScriptedRng::from_uniform(draws)).unwrap();
    let a = sim.substances().index_by_name("A").unwrap();
    sim.add_particle(Particle::new(a, 0., 0., 0.), 1);
    sim
}

#[test]
fn monomolecular_decay_fires_on_a_passing_draw() {
    let mut sim = single_particle(DECAY, &[0.3]);
    let a = sim.substances().index_by_name("A").unwrap();
    let b = sim.substances().index_by_name("B").unwrap();

    sim.advance_timestep(0.4);
    sim.react(1, 0., 0.4);

    assert_eq!(sim.concentration(a), 0);
    assert_eq!(sim.concentration(b), 1);
    assert_eq!(sim.n_particles(), 1);
    assert_eq!(sim.ill_events(), 0);

    // The external index now refers to the product, at the same position.
    let particle = sim.particle(1).unwrap();
    assert_eq!(particle.substance, b);
    assert_eq!((particle.x, particle.y, particle.z), (0., 0., 0.));
}

#[test]
fn monomolecular_decay_skips_on_a_failing_draw() {
    let mut sim = single_particle(DECAY, &[0.5]);
    let a = sim.substances().index_by_name("A").unwrap();
    let b = sim.substances().index_by_name("B").unwrap();

    sim.advance_timestep(0.4);
    sim.react(1, 0., 0.4);

    assert_eq!(sim.concentration(a), 1);
    assert_eq!(sim.concentration(b), 0);
    assert_eq!(sim.ill_events(), 0);
    assert_eq!(sim.particle(1).unwrap().substance, a);
}

#[test]
fn overrunning_probability_counts_an_ill_event() {
    let config = "\
[substances]
A discrete 100 1
B discrete 100 1
[reactions]
A => B ; 3.0
";
    // prob = 3.0 * 1.0, so any draw fires and the event is ill.
    let mut sim = single_particle(config, &[0.7]);
    let b = sim.substances().index_by_name("B").unwrap();

    sim.react(1, 0., 1.0);

    assert_eq!(sim.ill_events(), 1);
    assert_eq!(sim.particle(1).unwrap().substance, b);

    // Ill events only ever accumulate.
    let mut sim = single_particle(DECAY, &[0.2]);
    sim.react(1, 0., 0.4);
    assert_eq!(sim.ill_events(), 0);
}

#[test]
fn static_probability_composes_isotropic_concentrations() {
    let mut parser = ConfigParser::new(1.);
    parser
        .parse_str(
            "\
[substances]
M isotropic 2
A discrete 1 1
B discrete 1 1
[reactions]
A + 2M => B ; 0.5
",
        )
        .unwrap();
    let (_, reactions) = parser.into_network();
    assert_eq!(reactions[0].static_probability, 2.0);
}

#[test]
fn redeclaring_a_substance_replaces_it_in_place() {
    let mut parser = ConfigParser::new(1.);
    parser
        .parse_str(
            "\
[substances]
X isotropic 1
X discrete 10 1
",
        )
        .unwrap();
    let (substances, _) = parser.into_network();

    assert_eq!(substances.len(), 1);
    assert_eq!(substances.index_by_name("X"), Some(0));
    let discrete: Vec<_> = substances.discrete().map(|(idx, s)| (idx, s.name.as_str())).collect();
    assert_eq!(discrete, [(0, "X")]);
}

#[test]
fn competing_reactions_fire_in_configuration_order() {
    let config = "\
[substances]
A discrete 100 1
B discrete 100 1
C discrete 100 1
[reactions]
A => B ; 1.0
A => C ; 1.0
";
    let b_idx;
    let c_idx;
    {
        let sim = single_particle(config, &[]);
        b_idx = sim.substances().index_by_name("B").unwrap();
        c_idx = sim.substances().index_by_name("C").unwrap();
    }

    // First draw passes: the first reaction fires, the second is never
    // examined, and exactly one draw is consumed.
    let mut sim = single_particle(config, &[0.3]);
    sim.react(1, 0., 0.4);
    assert_eq!(sim.particle(1).unwrap().substance, b_idx);
    assert_eq!(sim.concentration(c_idx), 0);

    // First draw fails, second passes: the second reaction fires, and
    // exactly two draws are consumed.
    let mut sim = single_particle(config, &[0.5, 0.3]);
    sim.react(1, 0., 0.4);
    assert_eq!(sim.particle(1).unwrap().substance, c_idx);
    assert_eq!(sim.concentration(b_idx), 0);
}

#[test]
fn product_free_firing_destroys_the_particle_and_retires_the_index() {
    let config = "\
[substances]
A discrete 100 1
[reactions]
A => ; 1.0
";
    let mut sim = single_particle(config, &[0.1]);
    let a = sim.substances().index_by_name("A").unwrap();

    sim.react(1, 0., 0.5);

    assert_eq!(sim.concentration(a), 0);
    assert_eq!(sim.n_particles(), 0);
    assert!(sim.particle(1).is_none());
}

#[test]
fn callbacks_report_the_product_physics_on_every_firing() {
    use std::{cell::RefCell, rc::Rc};

    use crate::HostCallbacks;

    let config = "\
[substances]
A discrete 100 1
B discrete 50 -2
[reactions]
A => B ; 1.0
";
    let seen: Rc<RefCell<Vec<(f64, f64, usize)>>> = Rc::default();
    let callbacks = {
        let masses = Rc::clone(&seen);
        let charges = Rc::clone(&seen);
        let colors = Rc::clone(&seen);
        HostCallbacks {
            update_ion_mass: Box::new(move |m| masses.borrow_mut().push((m, f64::NAN, usize::MAX))),
            update_ion_charge: Box::new(move |q| {
                charges.borrow_mut().last_mut().unwrap().1 = q;
            }),
            update_ion_color: Box::new(move |idx| {
                colors.borrow_mut().last_mut().unwrap().2 = idx;
            }),
        }
    };

    let mut sim =
        Simulation::from_config_str(config, 1., ScriptedRng::from_uniform(&[0.1]))
            .unwrap()
            .with_callbacks(callbacks);
    let a = sim.substances().index_by_name("A").unwrap();
    let b = sim.substances().index_by_name("B").unwrap();
    sim.add_particle(Particle::new(a, 0., 0., 0.), 1);

    sim.react(1, 0., 0.5);

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, 50.);
    assert_eq!(seen[0].1, -2.);
    // The color is the product's 0-based primary table position.
    assert_eq!(seen[0].2, b);
    assert_eq!(seen[0].2, 1);
}
