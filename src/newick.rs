//! A minimal Newick reader, used only by the CLI binaries to turn
//! `--tree_file` into a [`PhyloTree`](crate::tree::InMemoryTree).
//!
//! Newick parsing is explicitly out of scope for the core simulation
//! engine (spec.md S6: "treated as external collaborators"); this is
//! deliberately small glue, not a general-purpose parser -- no support for
//! quoted labels, NHX comments, or multifurcating-tree validation beyond
//! what a well-formed simulator input needs.

use crate::error::EvoSimError;
use crate::tree::InMemoryTree;

pub fn parse_newick(text: &str) -> Result<InMemoryTree, EvoSimError> {
    let text = text.trim().trim_end_matches(';').trim();
    let bytes = text.as_bytes();
    let mut pos = 0usize;
    let mut tree = InMemoryTree::new();
    let mut anon_counter = 0u64;

    let root = tree.add_root("root");
    parse_node(bytes, &mut pos, &mut tree, root, true, &mut anon_counter)?;
    if pos != bytes.len() {
        return Err(EvoSimError::Tree(format!(
            "unexpected trailing content at byte {pos}"
        )));
    }
    Ok(tree)
}

/// Parse the subtree rooted at `node_id` (already added to `tree`), whose
/// children and branch length have not yet been filled in.
fn parse_node(
    bytes: &[u8],
    pos: &mut usize,
    tree: &mut InMemoryTree,
    node_id: u64,
    is_root: bool,
    anon_counter: &mut u64,
) -> Result<(), EvoSimError> {
    if bytes.get(*pos) == Some(&b'(') {
        *pos += 1;
        loop {
            *anon_counter += 1;
            let name = format!("N{anon_counter}");
            let child = tree.add_child(node_id, name, 0.0);
            parse_node(bytes, pos, tree, child, false, anon_counter)?;
            match bytes.get(*pos) {
                Some(b',') => {
                    *pos += 1;
                    continue;
                }
                Some(b')') => {
                    *pos += 1;
                    break;
                }
                _ => return Err(EvoSimError::Tree("expected ',' or ')'".to_owned())),
            }
        }
    }

    let name = parse_label(bytes, pos);
    let branch_length = parse_branch_length(bytes, pos)?;
    if !name.is_empty() && !is_root {
        tree.rename(node_id, name);
    }
    if !is_root {
        tree.set_branch_length(node_id, branch_length);
    }
    Ok(())
}

fn parse_label(bytes: &[u8], pos: &mut usize) -> String {
    let start = *pos;
    while *pos < bytes.len() && !matches!(bytes[*pos], b',' | b')' | b'(' | b':' | b';') {
        *pos += 1;
    }
    String::from_utf8_lossy(&bytes[start..*pos]).into_owned()
}

fn parse_branch_length(bytes: &[u8], pos: &mut usize) -> Result<f64, EvoSimError> {
    if bytes.get(*pos) != Some(&b':') {
        return Ok(0.0);
    }
    *pos += 1;
    let start = *pos;
    while *pos < bytes.len() && !matches!(bytes[*pos], b',' | b')' | b'(' | b';') {
        *pos += 1;
    }
    let text = std::str::from_utf8(&bytes[start..*pos]).unwrap_or("");
    text.parse::<f64>()
        .map_err(|_| EvoSimError::Tree(format!("invalid branch length {text:?}")))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tree::PhyloTree;

    #[test]
    fn test_parses_simple_topology() {
        let tree = parse_newick("((A:1,B:2):0.5,C:3);").unwrap();
        assert_eq!(tree.preorder().len(), 5);
        assert!(tree.is_leaf(tree.preorder()[2]));
    }

    #[test]
    fn test_rejects_unbalanced_parens() {
        assert!(parse_newick("(A:1,B:2;").is_err());
    }

    #[test]
    fn test_single_leaf_is_a_star_of_one() {
        let tree = parse_newick("(A:1);").unwrap();
        assert_eq!(tree.preorder().len(), 2);
    }
}
