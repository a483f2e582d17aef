use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use histloc::Simulation;
use histloc::config::Params;
use histloc::motion::{Direction, Position};
use histloc::render::{self, Marker};
use histloc::rng::{RandomSource, Rng};

#[derive(Serialize)]
struct Summary {
    seed: u64,
    params: Params,
    steps: u64,
    truth: Position,
    estimate: Position,
    estimate_probability: f64,
    correct_readings: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();

    let seed: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(42);
    let steps: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(40);
    let out_dir: PathBuf = args
        .get(3)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("artifacts"));

    std::fs::create_dir_all(&out_dir).context("failed to create output directory")?;

    let params = Params::default();
    info!(
        seed,
        steps,
        w = params.width,
        h = params.height,
        density = params.density,
        "starting localization run"
    );

    let mut rng = Rng::new(seed);
    let mut sim = Simulation::new(&params, &mut rng)?;
    let mut correct_readings = 0;

    for _ in 0..steps {
        let direction = Direction::ALL[rng.range_usize(Direction::ALL.len())];
        sim = sim.step(direction.motion(), &params, &mut rng)?;
        if sim.last_correct {
            correct_readings += 1;
        }
        let (estimate, p) = sim.belief.most_likely();
        info!(
            step = sim.steps,
            ?direction,
            truth = ?sim.position,
            ?estimate,
            p,
            correct = sim.last_correct,
            "step"
        );
    }

    let (w, h) = render::image_size(params.width, params.height);
    let save = |name: &str, rgba: &[u8]| -> anyhow::Result<()> {
        let path = out_dir.join(name);
        image::save_buffer(&path, rgba, w as u32, h as u32, image::ColorType::Rgba8)
            .with_context(|| format!("failed to save {}", path.display()))?;
        info!("saved {}", path.display());
        Ok(())
    };

    let marker = Marker {
        position: sim.position,
        correct: sim.last_correct,
    };
    save("environment.png", &render::render_environment(&sim.environment, Some(marker)))?;
    save("belief.png", &render::render_belief(&sim.belief))?;

    let (estimate, estimate_probability) = sim.belief.most_likely();
    let summary = Summary {
        seed,
        params,
        steps: sim.steps,
        truth: sim.position,
        estimate,
        estimate_probability,
        correct_readings,
    };
    let path = out_dir.join("summary.json");
    std::fs::write(&path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!(localized = estimate == sim.position, "done");
    Ok(())
}
