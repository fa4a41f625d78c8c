//! Mind-map outline parsing.
//!
//! Mind-maps arrive as a markdown outline: headings give the upper levels
//! and list items nest below the most recent heading by indentation.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write as _;

pub const UNAVAILABLE_MESSAGE: &str = "Mind map data is not available.";

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*#*\s*$").unwrap());
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)(?:[-*+]|\d+[.)])\s+(.+?)\s*$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MindmapNode {
    pub label: String,
    pub children: Vec<MindmapNode>,
}

impl MindmapNode {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including itself
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(MindmapNode::len).sum::<usize>()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Indented text rendering, two spaces per level
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let bullet = if depth == 0 { "" } else { "- " };
        let _ = writeln!(out, "{}{}{}", "  ".repeat(depth.saturating_sub(1)), bullet, self.label);
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }
}

/// Parse a mind-map outline.
///
/// Returns `None` when there is nothing to show. An outline with several
/// top-level entries is gathered under a root labelled `fallback_title`.
pub fn parse(markdown: &str, fallback_title: &str) -> Option<MindmapNode> {
    // (depth, node) pairs in document order
    let mut entries: Vec<(usize, MindmapNode)> = Vec::new();
    let mut heading_depth = 0;

    for line in markdown.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(caps) = HEADING.captures(line) {
            heading_depth = caps[1].len();
            entries.push((heading_depth, MindmapNode::new(strip_inline(&caps[2]))));
        } else if let Some(caps) = LIST_ITEM.captures(line) {
            let indent = caps[1].replace('\t', "  ").len() / 2;
            entries.push((heading_depth + 1 + indent, MindmapNode::new(strip_inline(&caps[2]))));
        }
    }

    if entries.is_empty() {
        return None;
    }

    let mut roots = build_tree(entries);
    if roots.len() == 1 {
        roots.pop()
    } else {
        Some(MindmapNode {
            label: fallback_title.to_string(),
            children: roots,
        })
    }
}

fn build_tree(entries: Vec<(usize, MindmapNode)>) -> Vec<MindmapNode> {
    let mut roots = Vec::new();
    let mut stack: Vec<(usize, MindmapNode)> = Vec::new();

    for (depth, node) in entries {
        collapse(&mut stack, &mut roots, depth);
        stack.push((depth, node));
    }
    collapse(&mut stack, &mut roots, 0);
    roots
}

/// Pop every open node at `depth` or deeper into its parent
fn collapse(stack: &mut Vec<(usize, MindmapNode)>, roots: &mut Vec<MindmapNode>, depth: usize) {
    while stack.last().is_some_and(|(d, _)| *d >= depth) {
        let Some((_, node)) = stack.pop() else {
            break;
        };
        match stack.last_mut() {
            Some((_, parent)) => parent.children.push(node),
            None => roots.push(node),
        }
    }
}

fn strip_inline(text: &str) -> String {
    text.replace("**", "").replace('`', "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_and_lists_nest() {
        let markdown = "# Entropy\n\n## Definition\n- Disorder\n  - Microstates\n- Heat / T\n## Laws\n- Second law\n";
        let root = parse(markdown, "lecture.mp4").unwrap();

        assert_eq!(root.label, "Entropy");
        assert_eq!(root.children.len(), 2);
        let definition = &root.children[0];
        assert_eq!(definition.label, "Definition");
        assert_eq!(definition.children[0].label, "Disorder");
        assert_eq!(definition.children[0].children[0].label, "Microstates");
        assert_eq!(definition.children[1].label, "Heat / T");
        assert_eq!(root.children[1].children[0].label, "Second law");
        assert_eq!(root.len(), 7);
    }

    #[test]
    fn test_multiple_roots_get_fallback_title() {
        let root = parse("- **one**\n- two", "lecture.mp4").unwrap();
        assert_eq!(root.label, "lecture.mp4");
        assert_eq!(root.children[0].label, "one");
        assert!(root.children.iter().all(MindmapNode::is_leaf));
    }

    #[test]
    fn test_empty_outline() {
        assert_eq!(parse("", "x"), None);
        assert_eq!(parse("plain prose only", "x"), None);
    }

    #[test]
    fn test_render() {
        let root = parse("# A\n## B\n- c", "x").unwrap();
        assert_eq!(root.render(), "A\n- B\n  - c\n");
    }
}
