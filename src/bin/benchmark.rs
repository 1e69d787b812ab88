//! Photonwalk Benchmark Suite

use photonwalk::element::{Element, ElementClass};
use photonwalk::grid::{Tile, TileGrid};
use photonwalk::simulation::{Simulation, SimulationConfig};
use photonwalk::{BasisLabel, DetectionReport};

use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn banner(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{}", title);
    println!("{}", "=".repeat(60));
}

/// Square board with a checkerboard of splitters and detectors along the
/// east edge.
fn splitter_lattice(n: usize) -> TileGrid {
    let mut grid = TileGrid::new(n, n);
    grid.set(0, n / 2, Tile::new(Element::Source, 0));
    for i in (2..n - 1).step_by(2) {
        for j in (1..n - 1).step_by(2) {
            let rotation = if (i + j) % 4 == 1 { 1 } else { 3 };
            grid.set(i, j, Tile::new(Element::ThinSplitter, rotation));
        }
    }
    for j in 0..n {
        grid.set(n - 1, j, Tile::new(Element::Detector, 0));
    }
    grid
}

fn mach_zehnder() -> TileGrid {
    TileGrid::new(5, 3)
        .with(0, 2, Tile::new(Element::Source, 0))
        .with(1, 2, Tile::new(Element::ThinSplitter, 1))
        .with(3, 2, Tile::new(Element::ThinMirror, 1))
        .with(1, 0, Tile::new(Element::ThinMirror, 1))
        .with(3, 0, Tile::new(Element::ThinSplitter, 1))
        .with(4, 0, Tile::new(Element::Detector, 0))
}

fn run(grid: &TileGrid) -> photonwalk::Result<Simulation<'_>> {
    let mut sim = Simulation::new(grid, SimulationConfig::default());
    sim.initialize()?;
    sim.propagate_to_end()?;
    Ok(sim)
}

fn benchmark_tensor_audit() {
    banner("AUDIT: Retained Probability per Element");

    let mut rng = rand::thread_rng();
    let all: Vec<BasisLabel> = BasisLabel::all().collect();

    for element in Element::ALL {
        let kept: Vec<String> = (0..element.max_rotation())
            .map(|r| format!("{:.3}", element.tensor(r).retained_fraction(&all, &mut rng)))
            .collect();
        let unitary = (0..element.max_rotation()).all(|r| element.tensor(r).is_unitary(1e-9));
        if element.class() == ElementClass::Unitary && !unitary {
            error!(element = element.name(), "unitary element failed the check");
        }
        println!("  {:<20} {:?}: [{}]", element.name(), element.class(), kept.join(", "));
    }
}

fn benchmark_mach_zehnder() {
    banner("BENCHMARK: Mach-Zehnder Interferometer");

    let grid = mach_zehnder();
    let n_iters = 1000;

    let start = Instant::now();
    let mut report = None;
    for _ in 0..n_iters {
        let sim = match run(&grid) {
            Ok(sim) => sim,
            Err(e) => {
                error!("run failed: {}", e);
                return;
            }
        };
        report = Some(DetectionReport::evaluate(&grid, sim.measurement(), 1.0, 1));
    }
    let elapsed = start.elapsed().as_secs_f64() / n_iters as f64;

    println!("  {:.1} μs per run", elapsed * 1e6);
    if let Some(report) = report {
        println!("  {}", report.message);
    }
}

fn benchmark_lattice() {
    banner("BENCHMARK: Splitter Lattice Propagation");

    let sizes = [8, 16, 32, 64];

    for &n in &sizes {
        let grid = splitter_lattice(n);
        let n_iters = if n <= 16 { 100 } else { 10 };

        let start = Instant::now();
        let mut steps = 0;
        let mut peak = 0;
        for _ in 0..n_iters {
            let sim = match run(&grid) {
                Ok(sim) => sim,
                Err(e) => {
                    error!(n, "run failed: {}", e);
                    return;
                }
            };
            steps = sim.history().len() - 1;
            peak = sim.history().iter().map(|s| s.len()).max().unwrap_or(0);
        }
        let elapsed = start.elapsed().as_secs_f64() / n_iters as f64;

        println!(
            "  {}x{}: {:.3} ms ({} steps, peak {} entries)",
            n,
            n,
            elapsed * 1000.0,
            steps,
            peak
        );
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "benchmark=info,photonwalk=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("\n{}", "#".repeat(60));
    println!("#  Photonwalk Benchmark Suite");
    println!("{}", "#".repeat(60));

    info!("starting benchmarks");

    benchmark_tensor_audit();
    benchmark_mach_zehnder();
    benchmark_lattice();

    banner("BENCHMARK COMPLETE");
}
