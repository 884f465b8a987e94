use std::fmt::Display;
use std::path::PathBuf;

use anyhow::bail;
use clap::{ArgAction, Args, Parser, Subcommand};
use log::LevelFilter;

use mptrees::enumeration::TreeShape;
use mptrees::parsimony::ScoringModel;
use mptrees::timing::TimingConfig;

use crate::Result;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub(super) struct Cli {
    /// More detailed logging, repeat for trace output
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub(super) verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub(super) quiet: bool,

    #[command(subcommand)]
    pub(super) command: Command,
}

#[derive(Args)]
pub(super) struct InputArgs {
    /// Species file, label:STATES lines or fasta
    #[arg(short, long, value_name = "SPECIES_FILE")]
    pub(super) species: PathBuf,

    /// Parsimony scoring model
    #[arg(short, long, value_enum, default_value_t = ScoringModel::Hartigan)]
    pub(super) model: ScoringModel,

    /// State-to-state cost matrix, required for Sankoff scoring
    #[arg(short, long, value_name = "WEIGHTS_FILE")]
    pub(super) weights: Option<PathBuf>,

    /// Keep characters that have the same state in every species
    #[arg(long)]
    pub(super) keep_uninformative: bool,
}

#[derive(Subcommand)]
pub(super) enum Command {
    /// Finds all most parsimonious trees for the species
    Search {
        #[command(flatten)]
        input: InputArgs,

        /// Shape of the enumerated trees
        #[arg(long, value_enum, default_value_t = TreeShape::Mixed)]
        shape: TreeShape,

        /// Do not contract zero-cost edges of cubic results
        #[arg(long)]
        no_contract: bool,

        /// Output file for the resulting trees in newick format
        #[arg(short, long, value_name = "OUTPUT_FILE")]
        output: Option<PathBuf>,
    },
    /// Scores every tree of a newick file
    Score {
        #[command(flatten)]
        input: InputArgs,

        /// Tree file in newick format
        #[arg(short, long, value_name = "TREE_FILE")]
        tree: PathBuf,
    },
    /// Contracts the zero-cost edges of every tree of a newick file
    Contract {
        #[command(flatten)]
        input: InputArgs,

        /// Tree file in newick format
        #[arg(short, long, value_name = "TREE_FILE")]
        tree: PathBuf,

        /// Output file for the contracted trees in newick format
        #[arg(short, long, value_name = "OUTPUT_FILE")]
        output: Option<PathBuf>,
    },
    /// Times the mixed and cubic searches on random subsets of the species
    Timing {
        #[command(flatten)]
        input: InputArgs,

        /// Smallest number of leaves
        #[arg(long, default_value_t = 4)]
        min_leaves: usize,

        /// Largest number of leaves
        #[arg(long, default_value_t = 8)]
        max_leaves: usize,

        /// Random subsets per number of leaves
        #[arg(long, default_value_t = 5)]
        trials: usize,

        /// Seed of the subset shuffles
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Task {
    Search {
        shape: TreeShape,
        contract: bool,
        output: Option<PathBuf>,
    },
    Score {
        tree: PathBuf,
    },
    Contract {
        tree: PathBuf,
        output: Option<PathBuf>,
    },
    Timing(TimingConfig),
}

#[derive(Debug)]
pub(super) struct Config {
    pub(super) species_file: PathBuf,
    pub(super) model: ScoringModel,
    pub(super) weights_file: Option<PathBuf>,
    pub(super) keep_uninformative: bool,
    pub(super) log_level: LevelFilter,
    pub(super) task: Task,
}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Configuration:")?;
        writeln!(f, "  species file: {}", self.species_file.display())?;
        writeln!(f, "  scoring model: {}", self.model)?;
        if let Some(weights) = &self.weights_file {
            writeln!(f, "  weights file: {}", weights.display())?;
        }
        writeln!(
            f,
            "  uninformative characters: {}",
            if self.keep_uninformative { "kept" } else { "removed" }
        )?;
        match &self.task {
            Task::Search {
                shape,
                contract,
                output,
            } => {
                write!(f, "  task: search for {shape} trees")?;
                if *shape == TreeShape::Cubic && *contract {
                    write!(f, " with contraction")?;
                }
                if let Some(output) = output {
                    write!(f, ", output to {}", output.display())?;
                }
            }
            Task::Score { tree } => write!(f, "  task: score trees from {}", tree.display())?,
            Task::Contract { tree, output } => {
                write!(f, "  task: contract trees from {}", tree.display())?;
                if let Some(output) = output {
                    write!(f, ", output to {}", output.display())?;
                }
            }
            Task::Timing(timing) => write!(
                f,
                "  task: timing {}..={} leaves, {} trials, seed {}",
                timing.min_leaves, timing.max_leaves, timing.trials, timing.seed
            )?,
        }
        Ok(())
    }
}

pub(super) struct ConfigBuilder {
    cli: Cli,
}

impl From<Cli> for ConfigBuilder {
    fn from(cli: Cli) -> Self {
        Self { cli }
    }
}

impl ConfigBuilder {
    /// Checks the command line arguments and turns them into a run configuration.
    pub(super) fn setup(self) -> Result<Config> {
        let log_level = match (self.cli.quiet, self.cli.verbose) {
            (true, _) => LevelFilter::Warn,
            (false, 0) => LevelFilter::Info,
            (false, 1) => LevelFilter::Debug,
            (false, _) => LevelFilter::Trace,
        };
        let (input, task) = match self.cli.command {
            Command::Search {
                input,
                shape,
                no_contract,
                output,
            } => (
                input,
                Task::Search {
                    shape,
                    contract: !no_contract,
                    output,
                },
            ),
            Command::Score { input, tree } => (input, Task::Score { tree }),
            Command::Contract {
                input,
                tree,
                output,
            } => (input, Task::Contract { tree, output }),
            Command::Timing {
                input,
                min_leaves,
                max_leaves,
                trials,
                seed,
            } => (
                input,
                Task::Timing(TimingConfig {
                    min_leaves,
                    max_leaves,
                    trials,
                    seed,
                }),
            ),
        };

        if !input.species.exists() {
            bail!("Species file {} does not exist", input.species.display());
        }
        match (&input.weights, input.model) {
            (Some(weights), _) if !weights.exists() => {
                bail!("Weights file {} does not exist", weights.display())
            }
            (None, ScoringModel::Sankoff) => {
                bail!("Sankoff scoring requires a weights file, use --weights")
            }
            _ => {}
        }
        match &task {
            Task::Score { tree } | Task::Contract { tree, .. } if !tree.exists() => {
                bail!("Tree file {} does not exist", tree.display())
            }
            _ => {}
        }
        if let Task::Search {
            output: Some(output),
            ..
        }
        | Task::Contract {
            output: Some(output),
            ..
        } = &task
        {
            if output.exists() {
                bail!("Output file {} already exists", output.display());
            }
        }
        if let Task::Timing(timing) = &task {
            if timing.min_leaves == 0 || timing.min_leaves > timing.max_leaves {
                bail!(
                    "Invalid leaf range {}..={}",
                    timing.min_leaves,
                    timing.max_leaves
                );
            }
        }

        Ok(Config {
            species_file: input.species,
            model: input.model,
            weights_file: input.weights,
            keep_uninformative: input.keep_uninformative,
            log_level,
            task,
        })
    }
}
