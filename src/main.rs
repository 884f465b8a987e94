use std::path::Path;

use anyhow::{anyhow, bail, Error};
use clap::Parser;
use ftail::Ftail;
use log::info;

use mptrees::contraction::{contract, contract_all};
use mptrees::enumeration::{enumerate, TreeShape};
use mptrees::io::{read_newick_from_file, read_species, read_weights, write_newick_to_file};
use mptrees::parsimony::{zero_cost_edges, ScoringBuilder};
use mptrees::species::{fill_states, remove_uninformative, world_set, Species};
use mptrees::timing::{run_timing, TimingRow};
use mptrees::tree::Tree;

mod cli;
use crate::cli::{Cli, Config, ConfigBuilder, Task};

type Result<T> = std::result::Result<T, Error>;

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            bail!("Unable to parse command line arguments: \n {}", error)
        }
    };
    let cfg_build: ConfigBuilder = cli.into();
    let cfg = cfg_build.setup()?;
    Ftail::new()
        .console(cfg.log_level)
        .init()
        .map_err(|e| anyhow!("{e:?}"))?;

    info!("mptrees run started.");
    info!("{}", cfg);

    let mut species = read_species(&cfg.species_file)?;
    if !cfg.keep_uninformative {
        remove_uninformative(&mut species)?;
    }
    let scoring = scoring_builder(&cfg, &species)?;

    match &cfg.task {
        Task::Search {
            shape,
            contract,
            output,
        } => run_search(&species, &scoring, *shape, *contract, output.as_deref()),
        Task::Score { tree } => run_score(&species, &scoring, tree),
        Task::Contract { tree, output } => {
            run_contract(&species, &scoring, tree, output.as_deref())
        }
        Task::Timing(timing) => {
            let rows = run_timing(&species, &scoring, timing)?;
            println!("{}", TimingRow::header());
            for row in rows {
                println!("{}", row);
            }
            Ok(())
        }
    }
}

fn scoring_builder(cfg: &Config, species: &[Species]) -> Result<ScoringBuilder> {
    let mut scoring = ScoringBuilder::new(cfg.model).world_set(world_set(species)?);
    if let Some(weights_file) = &cfg.weights_file {
        let (alphabet, weights) = read_weights(weights_file)?;
        scoring = scoring.weights(alphabet, weights);
    }
    Ok(scoring)
}

fn run_search(
    species: &[Species],
    scoring: &ScoringBuilder,
    shape: TreeShape,
    contract: bool,
    output: Option<&Path>,
) -> Result<()> {
    let result = match shape {
        TreeShape::Mixed => enumerate(species, scoring.build_contraction()?, shape)?,
        TreeShape::Cubic => enumerate(species, scoring.build()?, shape)?,
    };
    println!("Best score: {}", result.score);
    println!(
        "Most parsimonious {} trees: {} (of {} complete trees scored)",
        shape,
        result.trees.len(),
        result.visited
    );
    let trees = match shape {
        TreeShape::Cubic if contract => {
            let contracted = contract_all(&result.trees, scoring.build_contraction()?)?;
            println!(
                "Contracted to {} trees of {} nodes with {} contractions",
                contracted.trees.len(),
                contracted.size,
                contracted.contractions
            );
            contracted.trees
        }
        _ => result.trees,
    };
    report_trees(&trees, output)
}

fn read_filled_trees(species: &[Species], tree_file: &Path) -> Result<Vec<Tree>> {
    let mut trees = read_newick_from_file(tree_file)?;
    for tree in trees.iter_mut() {
        fill_states(tree, species)?;
    }
    Ok(trees)
}

fn run_score(species: &[Species], scoring: &ScoringBuilder, tree_file: &Path) -> Result<()> {
    let mut scorer = scoring.build()?;
    let mut contraction = scoring.build_contraction()?;
    for tree in read_filled_trees(species, tree_file)? {
        let score = mptrees::parsimony::score(&tree, &mut scorer)?;
        let (_, edges) = zero_cost_edges(&tree, &mut contraction)?;
        println!("{}\t{}\t{} zero-cost edges", tree, score, edges.len());
    }
    Ok(())
}

fn run_contract(
    species: &[Species],
    scoring: &ScoringBuilder,
    tree_file: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let mut contracted = Vec::new();
    for tree in read_filled_trees(species, tree_file)? {
        let result = contract(&tree, scoring.build_contraction()?)?;
        println!(
            "{}\tscore {}\t{} trees of {} nodes",
            tree,
            result.score,
            result.trees.len(),
            result.size
        );
        contracted.extend(result.trees);
    }
    report_trees(&contracted, output)
}

fn report_trees(trees: &[Tree], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            info!("Putting resulting trees in {}", path.display());
            write_newick_to_file(trees, path)
        }
        None => {
            for tree in trees {
                println!("{}", tree);
            }
            Ok(())
        }
    }
}
