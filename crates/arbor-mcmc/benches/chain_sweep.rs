use arbor_mcmc::{Chain, FlatLikelihood, Model, RunSchedule, SamplerConfig};
use arbor_tree::{Tree, TreeSummary};
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_sweep(c: &mut Criterion) {
    let tree = Tree::from_newick(
        "(((1:0.1,2:0.1):0.1,(3:0.1,4:0.1):0.1):0.1,5:0.1,((6:0.1,7:0.1):0.1,8:0.1):0.1);",
        false,
        false,
    )
    .unwrap();
    let config = SamplerConfig {
        iterations: 500,
        sample_freq: 10,
        print_freq: 0,
        ..SamplerConfig::default()
    };
    let schedule = RunSchedule::from_config(&config);

    c.bench_function("chain_sweep_500", |b| {
        b.iter(|| {
            let mut chain =
                Chain::from_config(&config, tree.clone(), Model::default(), Box::new(FlatLikelihood), 0).unwrap();
            let mut summary = TreeSummary::new();
            chain.run(&schedule, &mut summary).unwrap()
        })
    });
}

criterion_group!(benches, bench_sweep);
criterion_main!(benches);
