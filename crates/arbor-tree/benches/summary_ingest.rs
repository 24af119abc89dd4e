use arbor_tree::TreeSummary;
use criterion::{criterion_group, criterion_main, Criterion};

fn caterpillar(n: usize, swap: usize) -> String {
    let mut labels: Vec<usize> = (1..=n).collect();
    labels.swap(swap % n, (swap + 1) % n);
    let mut newick = format!("({}:0.1,{}:0.1)", labels[0], labels[1]);
    for label in &labels[2..n - 1] {
        newick = format!("({newick}:0.1,{label}:0.1)");
    }
    format!("({newick}:0.1,{}:0.1);", labels[n - 1])
}

fn bench_ingest(c: &mut Criterion) {
    let newicks: Vec<String> = (0..200).map(|i| caterpillar(40, i % 7)).collect();
    c.bench_function("summary_ingest_200x40", |b| {
        b.iter(|| {
            let mut summary = TreeSummary::new();
            for newick in &newicks {
                summary.add_tree(newick, None).unwrap();
            }
            summary.sort_by_frequency()
        })
    });
}

criterion_group!(benches, bench_ingest);
criterion_main!(benches);
