mod common;

use common::*;
use timetree::TreeModel;
use timetree::model::Tree;
use timetree::newick::{NewickReader, NewickStyle, parse_all, parse_file, parse_str, to_newick_with_style, write_newick};
use timetree::parser::ParsingErrorType;

fn tip_names<T: Tree>(tree: &T) -> Vec<String> {
    (0..tree.node_count())
        .map(timetree::model::NodeRef::new)
        .filter_map(|node| tree.taxon(node).map(|taxon| taxon.id().to_string()))
        .collect()
}

#[test]
fn test_comments_and_whitespace() {
    let tree = parse_str(
        "[&R] ( (Kea:1 [&rate=0.5] , Kaka : 1)\n:1,\tKakapo:[note]2 ) ; ",
    )
    .unwrap();

    assert_eq!(tree.node_count(), 5);
    assert_eq!(tree.external_node_count(), 3);
    assert_eq!(tip_names(&tree), vec!["Kea", "Kaka", "Kakapo"]);
    assert_eq!(tree.node_height(tree.root()), 2.0);
}

#[test]
fn test_quoted_labels() {
    let tree = parse_str("('Little Spotted Kiwi':1,'O''Brien''s Kiwi':1,'Rowi':1);").unwrap();
    assert_eq!(tip_names(&tree), vec!["Little Spotted Kiwi", "O'Brien's Kiwi", "Rowi"]);
}

#[test]
fn test_branch_lengths() {
    let tree = parse_str("((Moa:1.5e-1,Emu:0.15):2E0,Kiwi);").unwrap();
    let heights: Vec<f64> = (0..tree.node_count())
        .map(|i| tree.node_height(timetree::model::NodeRef::new(i)))
        .collect();

    // Kiwi has no length and sits at depth 0; Moa and Emu are deepest
    assert_eq!(tree.node_height(tree.root()), 2.15);
    assert_eq!(heights.iter().filter(|&&h| h == 0.0).count(), 2);
    assert!(heights.contains(&2.15));
}

#[test]
fn test_multifurcation_and_internal_labels() {
    let tree = parse_str("((Tui:1,Bellbird:1,Stitchbird:1)honeyeaters:1,Saddleback:2)root;").unwrap();

    assert_eq!(tree.node_count(), 6);
    assert!(!tree.is_binary());
    let honeyeaters = tree.child(tree.root(), 0).unwrap();
    assert_eq!(tree.child_count(honeyeaters), 3);
    assert_eq!(tree.taxon(honeyeaters), None);
    assert_eq!(tree.taxon(tree.root()), None);
    assert_eq!(tip_names(&tree), vec!["Tui", "Bellbird", "Stitchbird", "Saddleback"]);
}

#[test]
fn test_parse_errors() {
    let kind = |input: &str| parse_str(input).unwrap_err().kind().clone();

    assert_eq!(kind("(Kea:1,Kaka:1)"), ParsingErrorType::UnexpectedEOF);
    assert_eq!(kind(""), ParsingErrorType::UnexpectedEOF);
    assert_eq!(kind("(Kea:1,Kaka:1) [unclosed;"), ParsingErrorType::UnclosedComment);
    assert_eq!(kind("('Kea:1,Kaka:1);"), ParsingErrorType::UnclosedQuote);
    assert!(matches!(kind("(Kea:1,Kaka:x);"), ParsingErrorType::InvalidBranchLength(_)));
    assert!(matches!(kind("(Kea:1,,Kaka:1);"), ParsingErrorType::InvalidNewickString(_)));
    assert!(matches!(kind("(Kea:1 Kaka:1);"), ParsingErrorType::InvalidNewickString(_)));
}

#[test]
fn test_error_position() {
    let err = parse_str("(Kea:1,Kaka:abc);").unwrap_err();
    assert_eq!(err.position(), 12);
    assert!(err.to_string().starts_with("Invalid branch length"));
}

#[test]
fn test_parse_all_and_reader() {
    let input = "(Kea:1,Kaka:1);\n[second] ((Kea:1,Kaka:1):1,Kakapo:2);\n";
    let trees = parse_all(input).unwrap();
    assert_eq!(trees.len(), 2);
    assert_eq!(trees[1].external_node_count(), 3);

    let mut reader = NewickReader::for_str(input);
    assert!(reader.next_tree().unwrap().is_some());
    assert_eq!(reader.trees_read(), 1);
    assert!(reader.next_tree().unwrap().is_some());
    assert!(reader.next_tree().unwrap().is_none());
    assert_eq!(reader.trees_read(), 2);

    assert!(parse_all("(Kea:1,Kaka:1); (Kea:1").is_err());
    assert!(parse_all("  [nothing here] ").unwrap().is_empty());
}

#[test]
fn test_round_trip_through_tree_model() {
    for newick in [
        FOUR_BIRDS,
        "(((Kaka:1,Tui:1):1,Kea:2):1,Bellbird:3);",
        "(('Little Spotted Kiwi':0.25,Rowi:0.25):0.5,Tokoeka:0.75);",
    ] {
        let tree = TreeModel::from_newick(newick, Default::default()).unwrap();
        assert_eq!(tree.to_string(), newick);
    }
}

#[test]
fn test_index_styles_on_tree_model() {
    let tree = four_birds();
    assert_eq!(
        to_newick_with_style(&tree, NewickStyle::OneIndexed),
        "((1:1,2:1):1,(3:1,4:1):1);"
    );
}

#[test]
fn test_write_and_read_file() {
    let trees = vec![four_birds(), TreeModel::from_newick("(Kiwi:3,Moa:3);", Default::default()).unwrap()];
    let mut buffer = Vec::new();
    write_newick(&mut buffer, &trees, NewickStyle::Label).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert_eq!(text, format!("{}\n(Kiwi:3,Moa:3);\n", FOUR_BIRDS));

    let path = std::env::temp_dir().join(format!("timetree-newick-{}.tre", std::process::id()));
    std::fs::write(&path, &text).unwrap();
    let read = parse_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(read.len(), 2);
    assert_eq!(read[0].node_count(), 7);

    let missing = parse_file(std::env::temp_dir().join("timetree-no-such-file.tre")).unwrap_err();
    assert!(matches!(missing.kind(), ParsingErrorType::IoError(_)));
}
