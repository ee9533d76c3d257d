use std::time::Instant;
use quantum_tensors::{
    Photons,
    Simulation,
    SimulationConfig,
    photons::elements,
    simulation::Placement,
};

fn timeit<F, T>(mut f: F) -> (T, f64)
where F: FnMut() -> T
{
    let t0 = Instant::now();
    let out: T = f();
    (out, (Instant::now() - t0).as_secs_f64())
}

// two identical photons meeting at a 50:50 beam splitter always leave together
//
//           B
//           v
//     A > [BS] > ...
//           v
//          ...
//
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let bs = elements::beam_splitter(135.0)?;
    let placements = vec![Placement { x: 1, y: 1, operator: bs }];
    let mut sim
        = Simulation::from_placements(3, 3, placements, SimulationConfig::default())?;

    let mut photons = Photons::new(3, 3);
    photons.add_photon_from_indicator(0, 1, ">", "V")?;
    photons.add_photon_from_indicator(1, 0, "v", "V")?;
    println!("initial: {}", photons);
    sim.initialize_from_photons(photons)?;

    let (frame, t) = timeit(|| sim.next_frame());
    let frame = frame?;
    println!("after beam splitter: {}", frame.photons);
    println!("total probability: {:.6}", frame.probability);
    println!("computed in {:.3e} s", t);

    let (measurement, _) = timeit(|| {
        sim.step()?;
        sim.measure()
    });
    println!("position measurement:\n{}", measurement?);
    Ok(())
}
