use std::fs;

use arbor_core::ArborError;
use arbor_tree::TreeSummary;
use tempfile::tempdir;

const NEXUS: &str = "#NEXUS
[sampled trees]
begin taxa;
  dimensions ntax=5;
  taxlabels Ant Bee Cat Dog Eel;
end;
begin trees;
  translate
    1 Ant,
    2 Bee,
    3 Cat,
    4 Dog,
    5 Eel;
  tree burnin = [&U] ((1,3),(2,4),5);
  tree gen_100 = [&U] ((1:0.1,2:0.1):0.2,3:0.3,(4:0.1,5:0.1):0.2);
  tree gen_200 = [&U] ((1:0.1,3:0.1):0.2,2:0.3,(4:0.1,5:0.1):0.2);
  tree gen_300 = [&U] ((2:0.4,1:0.4):0.1,(5:0.2,4:0.2):0.1,3:0.3);
end;
";

#[test]
fn nexus_file_skips_burn_in_per_block() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trees.t");
    fs::write(&path, NEXUS).unwrap();

    let mut summary = TreeSummary::new();
    let added = summary.read_treefile(&path, 1).unwrap();
    assert_eq!(added, 3);
    assert_eq!(summary.num_stored_trees(), 3);
    assert_eq!(summary.num_topologies(), 2);
    assert_eq!(summary.taxa().label(2), Some("Cat"));

    let tree = summary.get_tree(0).unwrap();
    let names: Vec<String> = tree.leaf_names().into_iter().flatten().collect();
    assert_eq!(names, vec!["1", "2", "3", "4", "5"]);
}

#[test]
fn bare_newick_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trees.tre");
    fs::write(&path, "((1,2),3,(4,5));\n((1,2),(4,5),3);\n((1,3),2,(4,5));\n").unwrap();

    let mut summary = TreeSummary::new();
    assert_eq!(summary.read_treefile(&path, 0).unwrap(), 3);
    assert_eq!(summary.sort_by_frequency().last().map(|(count, _)| *count), Some(2));
}

#[test]
fn failure_keeps_earlier_trees() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.tre");
    fs::write(&path, "((1,2),3,(4,5));\n((1,2),3,(4,,5));\n").unwrap();

    let mut summary = TreeSummary::new();
    let err = summary.read_treefile(&path, 0).unwrap_err();
    assert!(matches!(err, ArborError::Parse(_)));
    assert_eq!(summary.num_stored_trees(), 1);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let mut summary = TreeSummary::new();
    let err = summary.read_treefile(&dir.path().join("absent.t"), 0).unwrap_err();
    assert!(matches!(err, ArborError::Io(ref info) if info.code == "tree-file-read"));
}
