use std::hint::black_box;
use std::path::PathBuf;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use mptrees::contraction::contract_all;
use mptrees::enumeration::{enumerate, TreeShape};
use mptrees::io::read_species;
use mptrees::parsimony::{Hartigan, ParsimonyScorer};
use mptrees::species::{remove_uninformative, world_set, Species};

const REFERENCE_SPECIES: &str = "data/reference_species.txt";

fn black_box_species(n: usize) -> Vec<Species> {
    let mut species = read_species(&PathBuf::from(REFERENCE_SPECIES))
        .expect("reference species should be readable");
    species.truncate(n);
    remove_uninformative(&mut species).expect("reference species should be consistent");
    black_box(species)
}

fn hartigan(species: &[Species]) -> Hartigan {
    Hartigan::new(world_set(species).expect("species should have a world set"))
}

fn run_for_sizes(
    sizes: &[usize],
    group_name: &'static str,
    criterion: &mut Criterion,
    pipeline: fn(&[Species]) -> usize,
) {
    let mut bench_group = criterion.benchmark_group(group_name);
    for &n in sizes {
        let species = black_box_species(n);
        bench_group.bench_function(format!("{n} leaves"), |bench| {
            bench.iter_batched(
                || species.clone(),
                |species| pipeline(&species),
                BatchSize::SmallInput,
            );
        });
    }
    bench_group.finish();
}

fn mixed_pipeline(species: &[Species]) -> usize {
    let result = enumerate(species, hartigan(species), TreeShape::Mixed)
        .expect("mixed search should pass");
    result.min_size().unwrap_or_default()
}

fn cubic_pipeline(species: &[Species]) -> usize {
    let scorer = hartigan(species);
    debug_assert!(scorer.supports_multifurcation());
    let result =
        enumerate(species, scorer.clone(), TreeShape::Cubic).expect("cubic search should pass");
    contract_all(&result.trees, scorer)
        .expect("contraction should pass")
        .size
}

fn mixed(criterion: &mut Criterion) {
    run_for_sizes(&[5, 6, 7], "mixed search", criterion, mixed_pipeline);
}

fn cubic(criterion: &mut Criterion) {
    run_for_sizes(
        &[5, 6, 7, 8],
        "cubic search with contraction",
        criterion,
        cubic_pipeline,
    );
}

criterion_group! {
name = searches;
config = Criterion::default().measurement_time(Duration::from_secs(20)).sample_size(10);
targets = mixed, cubic
}
criterion_main!(searches);
