//! Newick projection of any [Tree].

use crate::model::{NodeRef, Tree};
use crate::parser::utils::escape_label;
use std::io::{self, Write};

/// Extra buffer in Newick string length/capacity estimate
const BUFFER_CHARS: usize = 10;

/// Style for serializing a tree to Newick, controlling how tips are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewickStyle {
    /// Taxon ids, quoted where necessary
    #[default]
    Label,
    /// 0-based tip numbers (0, 1, 2, ...)
    ZeroIndexed,
    /// 1-based tip numbers (1, 2, 3, ...), as in Nexus translate tables
    OneIndexed,
}

/// Returns the Newick string of `tree`, terminated by `;`.
///
/// Branch lengths are parent height minus node height; the root gets none.
/// Tips without taxon are written by number.
///
/// # Example
/// ```
/// use timetree::TreeModel;
/// use timetree::newick::to_newick;
///
/// let tree = TreeModel::from_newick("(('Little Spotted Kiwi':1,Rowi:1):0.5,Tokoeka:1.5);", Default::default()).unwrap();
/// assert_eq!(to_newick(&tree), "(('Little Spotted Kiwi':1,Rowi:1):0.5,Tokoeka:1.5);");
/// ```
pub fn to_newick<T: Tree + ?Sized>(tree: &T) -> String {
    to_newick_with_style(tree, NewickStyle::Label)
}

/// Returns the Newick string of `tree` using `style` for tips.
pub fn to_newick_with_style<T: Tree + ?Sized>(tree: &T, style: NewickStyle) -> String {
    let mut newick = String::with_capacity(estimate_newick_len(tree));
    if tree.node_count() > 0 {
        build_newick(tree, &mut newick, tree.root(), style);
    }
    newick.push(';');
    newick
}

/// Writes each tree as one line of Newick.
///
/// # Errors
/// Returns an I/O error if writing fails.
pub fn write_newick<W: Write, T: Tree>(writer: &mut W, trees: &[T], style: NewickStyle) -> io::Result<()> {
    for tree in trees {
        writer.write_all(to_newick_with_style(tree, style).as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

fn build_newick<T: Tree + ?Sized>(tree: &T, newick: &mut String, node: NodeRef, style: NewickStyle) {
    let child_count = tree.child_count(node);
    if child_count == 0 {
        match (style, tree.taxon(node)) {
            (NewickStyle::Label, Some(taxon)) => newick.push_str(&escape_label(taxon.id())),
            (NewickStyle::OneIndexed, _) => newick.push_str(&(node.index() + 1).to_string()),
            _ => newick.push_str(&node.index().to_string()),
        }
    } else {
        newick.push('(');
        for i in 0..child_count {
            if i > 0 {
                newick.push(',');
            }
            if let Some(child) = tree.child(node, i) {
                build_newick(tree, newick, child, style);
            }
        }
        newick.push(')');
    }

    if !tree.is_root(node) {
        newick.push(':');
        newick.push_str(&tree.branch_length(node).to_string());
    }
}

/// Estimates the length of the Newick string of `tree`.
fn estimate_newick_len<T: Tree + ?Sized>(tree: &T) -> usize {
    // "(,)" per internal node
    const INTERNAL_NODE_CHARS: usize = 3;
    // ":" plus a short decimal per branch
    const BRANCH_LENGTH_CHARS: usize = 12;
    const LABEL_CHARS: usize = 12;

    tree.internal_node_count() * INTERNAL_NODE_CHARS
        + tree.external_node_count() * LABEL_CHARS
        + tree.node_count() * BRANCH_LENGTH_CHARS
        + BUFFER_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FlexibleTree;

    #[test]
    fn test_index_styles() {
        let mut tree = FlexibleTree::new();
        let a = tree.add_tip("Weka", 0.0);
        let b = tree.add_tip("Takahe", 0.0);
        let root = tree.add_node(1.25);
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();
        tree.set_root(root).unwrap();

        assert_eq!(to_newick(&tree), "(Weka:1.25,Takahe:1.25);");
        assert_eq!(to_newick_with_style(&tree, NewickStyle::ZeroIndexed), "(0:1.25,1:1.25);");
        assert_eq!(to_newick_with_style(&tree, NewickStyle::OneIndexed), "(1:1.25,2:1.25);");
    }
}
