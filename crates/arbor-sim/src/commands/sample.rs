use std::error::Error;
use std::path::PathBuf;

use arbor_core::errors::{ArborError, ErrorInfo};
use arbor_mcmc::{run_ladder, FlatLikelihood, RunManifest, SamplerConfig, TraceRecorder};
use arbor_tree::{read_tree_file, topology_hash, NewickOptions, Tree, TreeSummary};
use clap::Args;
use tracing::info;

use super::{taxa_for, write_text};

#[derive(Args, Debug)]
pub struct SampleArgs {
    /// YAML sampler configuration.
    #[arg(long)]
    pub config: PathBuf,
    /// File holding the starting tree (first tree is used).
    #[arg(long)]
    pub tree: PathBuf,
    /// Output directory for run artefacts.
    #[arg(long)]
    pub out: PathBuf,
}

pub fn run(args: &SampleArgs) -> Result<(), Box<dyn Error>> {
    let config = SamplerConfig::load(&args.config)?;
    let file = read_tree_file(&args.tree)?;
    let newick = file
        .blocks
        .iter()
        .flat_map(|block| block.newicks.iter())
        .next()
        .ok_or_else(|| {
            ArborError::Parse(
                ErrorInfo::new("file-format", "tree file holds no trees")
                    .with_context("path", args.tree.display().to_string()),
            )
        })?;

    let options = NewickOptions {
        allow_polytomies: config.allow_polytomies,
        rooted: config.rooted,
    };
    let mut taxa = taxa_for(&file);
    let tree = Tree::from_newick_with(newick, &options, &mut taxa)?;
    info!(
        leaves = tree.num_leaves(),
        tree_length = tree.total_edge_length(),
        "starting tree loaded"
    );

    let mut summary = TreeSummary::with_options(options);
    summary.set_taxa(taxa);
    let ladder = run_ladder(
        &config,
        &tree,
        &config.model,
        |_| Box::new(FlatLikelihood),
        &mut summary,
    )?;

    let trace_path = args.out.join("trace.csv");
    let summary_path = args.out.join("summary.json");
    let manifest_path = args.out.join("manifest.json");
    std::fs::create_dir_all(&args.out)?;

    let cold = ladder.cold();
    TraceRecorder::from(cold.map(|chain| chain.samples.clone()).unwrap_or_default()).write_csv(&trace_path)?;
    write_text(&summary_path, &summary.report().to_json()?)?;

    let manifest = RunManifest {
        config: config.clone(),
        master_seed: config.seed_policy.master_seed,
        seed_label: config.seed_policy.label.clone(),
        heating_powers: ladder.heating_powers.clone(),
        updater_stats: cold.map(|chain| chain.updater_stats.clone()).unwrap_or_default(),
        trees_sampled: summary.num_stored_trees(),
        top_topology_hash: summary.most_frequent().map(|(_, tree_id)| topology_hash(tree_id)),
        artefacts: vec![PathBuf::from("trace.csv"), PathBuf::from("summary.json")],
    };
    manifest.write(&manifest_path)?;
    info!(
        out = %args.out.display(),
        trees = summary.num_stored_trees(),
        topologies = summary.num_topologies(),
        "run complete"
    );
    Ok(())
}
