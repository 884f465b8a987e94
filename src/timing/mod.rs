use std::fmt::Display;
use std::time::Instant;

use anyhow::bail;
use inc_stats::SummStats;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::contraction::contract_all;
use crate::enumeration::{enumerate, TreeShape};
use crate::parsimony::ScoringBuilder;
use crate::species::{remove_uninformative, world_set, Species};
use crate::Result;

/// Settings of a timing run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingConfig {
    pub min_leaves: usize,
    pub max_leaves: usize,
    pub trials: usize,
    pub seed: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_leaves: 4,
            max_leaves: 8,
            trials: 5,
            seed: 42,
        }
    }
}

/// What one trial found on one random subset of species.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    pub mixed_secs: f64,
    pub cubic_secs: f64,
    pub mixed_size: usize,
    pub mixed_compact: usize,
    pub cubic_trees: usize,
    pub contracted_size: usize,
    pub contracted_trees: usize,
    pub contractions: usize,
}

impl TrialOutcome {
    /// Whether the mixed search and the contracted cubic search found trees of equal size.
    pub fn agrees(&self) -> bool {
        self.mixed_size == self.contracted_size
    }
}

/// Summary over the trials for one number of leaves.
#[derive(Debug, Clone)]
pub struct TimingRow {
    pub leaves: usize,
    pub mixed_mean: f64,
    pub mixed_std: f64,
    pub cubic_mean: f64,
    pub cubic_std: f64,
    pub mixed_compact: f64,
    pub cubic_trees: f64,
    pub contracted_trees: f64,
    pub contractions: f64,
    pub agreeing: usize,
    pub trials: usize,
}

impl TimingRow {
    fn new(leaves: usize, outcomes: &[TrialOutcome]) -> Self {
        let mixed: SummStats<f64> = outcomes.iter().map(|o| o.mixed_secs).collect();
        let cubic: SummStats<f64> = outcomes.iter().map(|o| o.cubic_secs).collect();
        let mean_of = |f: fn(&TrialOutcome) -> usize| {
            let stats: SummStats<f64> = outcomes.iter().map(|o| f(o) as f64).collect();
            stats.mean().unwrap_or_default()
        };
        Self {
            leaves,
            mixed_mean: mixed.mean().unwrap_or_default(),
            mixed_std: mixed.standard_deviation().unwrap_or_default(),
            cubic_mean: cubic.mean().unwrap_or_default(),
            cubic_std: cubic.standard_deviation().unwrap_or_default(),
            mixed_compact: mean_of(|o| o.mixed_compact),
            cubic_trees: mean_of(|o| o.cubic_trees),
            contracted_trees: mean_of(|o| o.contracted_trees),
            contractions: mean_of(|o| o.contractions),
            agreeing: outcomes.iter().filter(|o| o.agrees()).count(),
            trials: outcomes.len(),
        }
    }

    pub fn header() -> &'static str {
        "n\tmixed_s\tmixed_sd\tcubic_s\tcubic_sd\tmixed_trees\tcubic_trees\tcontracted_trees\tcontractions\tagree"
    }
}

impl Display for TimingRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{:.4}\t{:.4}\t{:.4}\t{:.4}\t{:.1}\t{:.1}\t{:.1}\t{:.1}\t{}/{}",
            self.leaves,
            self.mixed_mean,
            self.mixed_std,
            self.cubic_mean,
            self.cubic_std,
            self.mixed_compact,
            self.cubic_trees,
            self.contracted_trees,
            self.contractions,
            self.agreeing,
            self.trials
        )
    }
}

/// Runs both pipelines on one set of species: the mixed search keeping its smallest trees,
/// and the cubic search followed by contraction of its most parsimonious trees.
pub fn run_trial(species: &[Species], scoring: &ScoringBuilder) -> Result<TrialOutcome> {
    let mut species = species.to_vec();
    remove_uninformative(&mut species)?;
    let scoring = scoring.clone().world_set(world_set(&species)?);

    let start = Instant::now();
    let mixed = enumerate(&species, scoring.build_contraction()?, TreeShape::Mixed)?;
    let mixed_secs = start.elapsed().as_secs_f64();

    let start = Instant::now();
    let cubic = enumerate(&species, scoring.build()?, TreeShape::Cubic)?;
    let contracted = contract_all(&cubic.trees, scoring.build_contraction()?)?;
    let cubic_secs = start.elapsed().as_secs_f64();

    let outcome = TrialOutcome {
        mixed_secs,
        cubic_secs,
        mixed_size: mixed.min_size().unwrap_or_default(),
        mixed_compact: mixed.compact_trees().len(),
        cubic_trees: cubic.trees.len(),
        contracted_size: contracted.size,
        contracted_trees: contracted.trees.len(),
        contractions: contracted.contractions,
    };
    debug!("Trial on {} species: {:?}", species.len(), outcome);
    Ok(outcome)
}

/// One seeded shuffle of the species per trial. Every leaf count uses a prefix of the same
/// orders, so the subsets of a trial are nested across rows.
pub(crate) fn shuffled_orders(
    species: &[Species],
    trials: usize,
    seed: u64,
) -> Vec<Vec<Species>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..trials)
        .map(|_| {
            let mut order = species.to_vec();
            order.shuffle(&mut rng);
            order
        })
        .collect()
}

pub(crate) fn leading_subsets(orders: &[Vec<Species>], n: usize) -> Vec<&[Species]> {
    orders.iter().map(|order| &order[..n]).collect()
}

cfg_if::cfg_if! {
if #[cfg(feature = "parallel")] {
fn run_trials(subsets: &[&[Species]], scoring: &ScoringBuilder) -> Result<Vec<TrialOutcome>> {
    use rayon::prelude::*;
    subsets
        .par_iter()
        .map(|subset| run_trial(subset, scoring))
        .collect()
}
} else {
fn run_trials(subsets: &[&[Species]], scoring: &ScoringBuilder) -> Result<Vec<TrialOutcome>> {
    subsets
        .iter()
        .map(|subset| run_trial(subset, scoring))
        .collect()
}
}
}

/// Times the mixed and the cubic pipelines on random subsets of increasing size.
pub fn run_timing(
    species: &[Species],
    scoring: &ScoringBuilder,
    config: &TimingConfig,
) -> Result<Vec<TimingRow>> {
    if config.min_leaves == 0 || config.min_leaves > config.max_leaves {
        bail!(
            "Invalid leaf range {}..={}",
            config.min_leaves,
            config.max_leaves
        );
    }
    if config.max_leaves > species.len() {
        bail!(
            "Timing up to {} leaves needs at least as many species, found {}",
            config.max_leaves,
            species.len()
        );
    }
    if config.trials == 0 {
        bail!("At least one trial is required");
    }

    let orders = shuffled_orders(species, config.trials, config.seed);
    let mut rows = Vec::new();
    for n in config.min_leaves..=config.max_leaves {
        let subsets = leading_subsets(&orders, n);
        info!("Timing {} trials with {} leaves", config.trials, n);
        let outcomes = run_trials(&subsets, scoring)?;

        let row = TimingRow::new(n, &outcomes);
        info!("{}", row);
        rows.push(row);
    }
    Ok(rows)
}
