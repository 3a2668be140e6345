use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand::rngs::StdRng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use dino_evo::game::state::{GameConfig, SimulationState};
use dino_evo::neuro::controller::{GenerationController, TickOutcome, initial_population};
use dino_evo::neuro::store::BestStore;
use dino_evo::params::Params;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let params = match std::env::args().nth(1) {
        Some(path) => Params::load_from_file(path)?,
        None => {
            let params = Params::default();
            params.validate()?;
            params
        }
    };

    let network = params.network()?;
    let store = BestStore::new(&params.save_path);
    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let population = initial_population(&network, params.population_size, &store, &mut rng);

    info!(
        layers = ?network.layer_sizes(),
        population = population.len(),
        save = %store.path().display(),
        "starting evolution"
    );

    let mut controller = GenerationController::new(network, population, params.evolution())?
        .with_store(store)
        .with_rng(rng);
    let mut world = SimulationState::new(
        GameConfig::from(&params),
        params.population_size,
        params.seed,
    );

    let quit = Arc::new(AtomicBool::new(false));
    let handler_quit = Arc::clone(&quit);
    ctrlc::set_handler(move || handler_quit.store(true, Ordering::SeqCst))?;

    loop {
        let outcome = world.tick(&mut controller);

        // Ctrl-C only lands between ticks, so the running generation's fitness is intact.
        if quit.load(Ordering::SeqCst) {
            info!(generation = controller.generation(), "quit requested");
            if controller.persist_best() {
                info!("saved best individual on exit");
            }
            break;
        }

        if let TickOutcome::GenerationAdvanced(summary) = outcome {
            if params.max_generations > 0 && summary.generation + 1 >= params.max_generations {
                break;
            }
        }
    }

    let best_ticks = controller.network().score_history().iter().max().copied();
    info!(
        generations = controller.generation(),
        best_ticks,
        "evolution finished"
    );

    Ok(())
}
