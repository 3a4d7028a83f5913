use crate::aggregate::{Aggregate, AggregateReport};
use crate::config::RunConfig;
use crate::RunError;
use combat_core::{SetupError, SimConstants, Simulation};
use parking_lot::Mutex;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info};

/// Seed for iteration `index` of a run seeded with `base`
///
/// splitmix64 over the pair, so neighbouring indices give unrelated
/// streams.
pub fn iteration_seed(base: u64, index: u64) -> u64 {
    let mut z = base
        .wrapping_add(index.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Runs many seeded iterations of one setup across a worker pool
#[derive(Debug, Clone)]
pub struct Runner {
    config: RunConfig,
    constants: SimConstants,
}

impl Runner {
    pub fn new(config: RunConfig, constants: SimConstants) -> Self {
        Runner { config, constants }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run every iteration and return the aggregated report
    ///
    /// `setup` registers units, spells and auras on a fresh simulation; it
    /// is called once per worker, and that worker's simulation is then reset
    /// between iterations.
    #[tracing::instrument(skip_all, fields(iterations = self.config.iterations))]
    pub fn run<F>(&self, setup: F) -> Result<AggregateReport, RunError>
    where
        F: Fn(&mut Simulation) -> Result<(), SetupError> + Sync + Send,
    {
        self.config.validate()?;
        let aggregate = match self.config.threads {
            Some(threads) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| RunError::ThreadPool(e.to_string()))?;
                pool.install(|| self.run_iterations(&setup))?
            }
            None => self.run_iterations(&setup)?,
        };
        info!(
            iterations = aggregate.iterations,
            seed = self.config.seed,
            "run complete"
        );
        Ok(aggregate.report(self.config.seed))
    }

    fn run_iterations<F>(&self, setup: &F) -> Result<Aggregate, RunError>
    where
        F: Fn(&mut Simulation) -> Result<(), SetupError> + Sync + Send,
    {
        let aggregate = Mutex::new(Aggregate::new());
        let encounter = self.config.encounter();
        let base_seed = self.config.seed;

        (0..u64::from(self.config.iterations))
            .into_par_iter()
            .try_for_each_init(
                || {
                    let mut sim = Simulation::new(self.constants.clone(), encounter.clone());
                    setup(&mut sim)?;
                    sim.finalize()?;
                    debug!("worker simulation ready");
                    Ok::<_, SetupError>(sim)
                },
                |state, index| -> Result<(), RunError> {
                    let sim = state.as_mut().map_err(|e| RunError::Setup(e.clone()))?;
                    let metrics = sim.run_iteration(iteration_seed(base_seed, index))?;
                    aggregate.lock().add(&metrics);
                    Ok(())
                },
            )?;

        Ok(aggregate.into_inner())
    }
}
