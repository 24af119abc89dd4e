use std::error::Error;
use std::path::PathBuf;

use arbor_tree::TreeSummary;
use clap::Args;

use super::write_text;

#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// Nexus or Newick tree file.
    #[arg(long)]
    pub trees: PathBuf,
    /// Trees to skip at the start of every trees block.
    #[arg(long, default_value_t = 0)]
    pub skip: usize,
    /// Also write the report as JSON.
    #[arg(long)]
    pub json: Option<PathBuf>,
}

pub fn run(args: &SummarizeArgs) -> Result<(), Box<dyn Error>> {
    let mut summary = TreeSummary::new();
    summary.read_treefile(&args.trees, args.skip)?;
    let report = summary.report();
    print!("{}", report.render_text());
    if let Some(path) = &args.json {
        write_text(path, &report.to_json()?)?;
    }
    Ok(())
}
