use std::fmt;

use winnow::ascii::multispace0;
use winnow::combinator::{alt, cut_err, delimited, opt, terminated};
use winnow::error::StrContext;
use winnow::prelude::*;
use winnow::token::take_while;

use crate::formatter::{Formatter, PlainFormatter};
use crate::name::{is_flag_char, UseFlagName};

/// The `flag?` / `!flag?` guard of a conditional group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UseCondition {
    /// Flag the group depends on.
    pub flag: UseFlagName,
    /// `true` for `!flag?`.
    pub inverse: bool,
}

impl UseCondition {
    /// A `flag?` condition, or `!flag?` when `inverse` is set.
    pub fn new(flag: UseFlagName, inverse: bool) -> Self {
        UseCondition { flag, inverse }
    }

    /// Whether the guarded group applies, given the flag's state.
    pub fn is_met(&self, enabled: bool) -> bool {
        enabled != self.inverse
    }
}

impl fmt::Display for UseCondition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.inverse {
            write!(f, "!")?;
        }
        write!(f, "{}?", self.flag)
    }
}

/// A node of a specification tree.
///
/// Dependency, license, provide, restrict and URI specifications all share
/// this shape and differ only in their leaf type `T`. Nodes own their
/// children. A parsed tree is always rooted at [`SpecTree::All`].
///
/// See [PMS 8.2](https://projects.gentoo.org/pms/9/pms.html#dependency-specification-format).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecTree<T> {
    /// All children apply.
    All(Vec<SpecTree<T>>),
    /// `|| ( ... )`: any one child is enough.
    Any(Vec<SpecTree<T>>),
    /// `flag? ( ... )`: children apply when the condition is met.
    Conditional {
        /// Guarding condition.
        condition: UseCondition,
        /// Guarded children.
        children: Vec<SpecTree<T>>,
    },
    /// A domain item.
    Leaf(T),
}

impl<T> Default for SpecTree<T> {
    fn default() -> Self {
        SpecTree::All(Vec::new())
    }
}

impl<T> SpecTree<T> {
    /// An `All` node with no children.
    pub fn empty() -> Self {
        SpecTree::default()
    }

    /// Direct children of a group node; empty for a leaf.
    pub fn children(&self) -> &[SpecTree<T>] {
        match self {
            SpecTree::All(children)
            | SpecTree::Any(children)
            | SpecTree::Conditional { children, .. } => children,
            SpecTree::Leaf(_) => &[],
        }
    }

    /// Every leaf in depth-first order, regardless of conditions.
    pub fn leaves(&self) -> Vec<&T> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a T>) {
        match self {
            SpecTree::Leaf(item) => out.push(item),
            _ => {
                for child in self.children() {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Whether the tree holds no leaves at all.
    pub fn is_empty(&self) -> bool {
        match self {
            SpecTree::Leaf(_) => false,
            _ => self.children().iter().all(SpecTree::is_empty),
        }
    }
}

/// A leaf type that can be rendered through a [`Formatter`].
pub trait SpecLeaf: fmt::Display {
    /// Render the leaf. Plain text by default.
    fn format_with(&self, f: &dyn Formatter) -> String {
        f.format_plain(&self.to_string())
    }
}

impl SpecLeaf for String {}

impl<T: SpecLeaf> SpecTree<T> {
    /// Single-line rendering.
    ///
    /// The root group's children are joined by spaces; nested groups are
    /// wrapped in parentheses. An empty root renders as an empty string.
    ///
    /// # Examples
    ///
    /// ```
    /// use portage_metadata_keys::{LicenseSpecTree, PlainFormatter};
    ///
    /// let tree = LicenseSpecTree::parse_license("GPL-2 || ( MIT ssl? ( OpenSSL ) )").unwrap();
    /// assert_eq!(
    ///     tree.pretty_print_flat(&PlainFormatter),
    ///     "GPL-2 || ( MIT ssl? ( OpenSSL ) )"
    /// );
    /// ```
    pub fn pretty_print_flat(&self, f: &dyn Formatter) -> String {
        match self {
            SpecTree::All(children) => join_flat(children, f),
            node => node.flat_node(f),
        }
    }

    fn flat_node(&self, f: &dyn Formatter) -> String {
        match self {
            SpecTree::Leaf(item) => item.format_with(f),
            SpecTree::All(children) => flat_group("(", children, f),
            SpecTree::Any(children) => flat_group("|| (", children, f),
            SpecTree::Conditional {
                condition,
                children,
            } => flat_group(&format!("{} (", f.format_condition(condition)), children, f),
        }
    }

    /// Structured rendering: one leaf per line, group contents indented one
    /// level below the line opening the group.
    pub fn pretty_print(&self, f: &dyn Formatter) -> String {
        let mut lines = Vec::new();
        match self {
            SpecTree::All(children) => {
                for child in children {
                    child.structured_node(f, 0, &mut lines);
                }
            }
            node => node.structured_node(f, 0, &mut lines),
        }
        lines.join(&f.newline())
    }

    fn structured_node(&self, f: &dyn Formatter, depth: usize, lines: &mut Vec<String>) {
        let indent = f.indent(depth);
        let open = match self {
            SpecTree::Leaf(item) => {
                lines.push(format!("{indent}{}", item.format_with(f)));
                return;
            }
            SpecTree::All(_) => "(".to_string(),
            SpecTree::Any(_) => "|| (".to_string(),
            SpecTree::Conditional { condition, .. } => format!("{} (", f.format_condition(condition)),
        };
        lines.push(format!("{indent}{open}"));
        for child in self.children() {
            child.structured_node(f, depth + 1, lines);
        }
        lines.push(format!("{indent})"));
    }
}

fn join_flat<T: SpecLeaf>(children: &[SpecTree<T>], f: &dyn Formatter) -> String {
    children
        .iter()
        .map(|child| child.flat_node(f))
        .collect::<Vec<_>>()
        .join(" ")
}

fn flat_group<T: SpecLeaf>(open: &str, children: &[SpecTree<T>], f: &dyn Formatter) -> String {
    if children.is_empty() {
        format!("{open} )")
    } else {
        format!("{open} {} )", join_flat(children, f))
    }
}

impl<T: SpecLeaf> fmt::Display for SpecTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.pretty_print_flat(&PlainFormatter))
    }
}

// Winnow parsers shared by every tree kind

/// Per-domain knobs for the shared specification grammar.
pub(crate) struct Grammar<T> {
    /// Whether `|| ( ... )` groups are valid in this domain.
    pub(crate) allow_any: bool,
    /// Parser for a single domain item.
    pub(crate) leaf: fn(&mut &str) -> ModalResult<T>,
}

impl<T> Grammar<T> {
    /// Parse a complete specification string into an `All`-rooted tree.
    pub(crate) fn parse(&self, input: &str) -> std::result::Result<SpecTree<T>, String> {
        terminated(|i: &mut &str| parse_entries(self, i, false), multispace0)
            .parse(input)
            .map(SpecTree::All)
            .map_err(|e| format!("{e}"))
    }
}

fn parse_entries<T>(
    grammar: &Grammar<T>,
    input: &mut &str,
    in_any: bool,
) -> ModalResult<Vec<SpecTree<T>>> {
    let mut entries = Vec::new();
    loop {
        multispace0.parse_next(input)?;
        if input.is_empty() || input.starts_with(')') {
            return Ok(entries);
        }
        entries.extend(parse_entry(grammar, input, in_any)?);
    }
}

/// Parse one entry. Bare `( ... )` groups are spliced into the enclosing
/// list unless that list belongs to an `||` group, where grouping matters.
fn parse_entry<T>(
    grammar: &Grammar<T>,
    input: &mut &str,
    in_any: bool,
) -> ModalResult<Vec<SpecTree<T>>> {
    if grammar.allow_any && input.starts_with("||") {
        "||".parse_next(input)?;
        multispace0.parse_next(input)?;
        let children = cut_err(|i: &mut &str| parse_group(grammar, i, true))
            .context(StrContext::Label("'||' group"))
            .parse_next(input)?;
        return Ok(vec![SpecTree::Any(children)]);
    }

    if input.starts_with('(') {
        let children = parse_group(grammar, input, false)?;
        return Ok(if in_any {
            vec![SpecTree::All(children)]
        } else {
            children
        });
    }

    alt((
        |i: &mut &str| parse_conditional(grammar, i),
        |i: &mut &str| (grammar.leaf)(i).map(SpecTree::Leaf),
    ))
    .map(|node| vec![node])
    .parse_next(input)
}

fn parse_group<T>(
    grammar: &Grammar<T>,
    input: &mut &str,
    in_any: bool,
) -> ModalResult<Vec<SpecTree<T>>> {
    delimited(
        '(',
        |i: &mut &str| parse_entries(grammar, i, in_any),
        cut_err((multispace0, ')')).context(StrContext::Label("closing ')'")),
    )
    .parse_next(input)
}

fn parse_conditional<T>(grammar: &Grammar<T>, input: &mut &str) -> ModalResult<SpecTree<T>> {
    let inverse = opt('!').parse_next(input)?.is_some();
    let flag = take_while(1.., is_flag_char)
        .try_map(UseFlagName::new)
        .parse_next(input)?;
    '?'.parse_next(input)?;
    multispace0.parse_next(input)?;
    let children = cut_err(|i: &mut &str| parse_group(grammar, i, false))
        .context(StrContext::Label("USE conditional group"))
        .parse_next(input)?;
    Ok(SpecTree::Conditional {
        condition: UseCondition::new(flag, inverse),
        children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(input: &mut &str) -> ModalResult<String> {
        take_while(1.., |c: char| c.is_ascii_alphanumeric())
            .map(|s: &str| s.to_string())
            .parse_next(input)
    }

    const WITH_ANY: Grammar<String> = Grammar {
        allow_any: true,
        leaf: word,
    };

    const WITHOUT_ANY: Grammar<String> = Grammar {
        allow_any: false,
        leaf: word,
    };

    fn leaf(s: &str) -> SpecTree<String> {
        SpecTree::Leaf(s.to_string())
    }

    fn cond(flag: &str, inverse: bool) -> UseCondition {
        UseCondition::new(UseFlagName::new(flag).unwrap(), inverse)
    }

    #[test]
    fn parse_blank() {
        assert_eq!(WITH_ANY.parse("").unwrap(), SpecTree::empty());
        assert_eq!(WITH_ANY.parse("   \n   \t").unwrap(), SpecTree::empty());
    }

    #[test]
    fn parse_sequence() {
        let tree = WITH_ANY.parse("a b   \nc").unwrap();
        assert_eq!(tree, SpecTree::All(vec![leaf("a"), leaf("b"), leaf("c")]));
    }

    #[test]
    fn bare_groups_are_spliced() {
        let tree = WITH_ANY.parse(" ( a b )    ").unwrap();
        assert_eq!(tree, SpecTree::All(vec![leaf("a"), leaf("b")]));
    }

    #[test]
    fn groups_inside_any_are_kept() {
        let tree = WITH_ANY.parse("|| ( a ( foo? ( b ) ) )").unwrap();
        assert_eq!(
            tree,
            SpecTree::All(vec![SpecTree::Any(vec![
                leaf("a"),
                SpecTree::All(vec![SpecTree::Conditional {
                    condition: cond("foo", false),
                    children: vec![leaf("b")],
                }]),
            ])])
        );
    }

    #[test]
    fn parse_inverse_conditional() {
        let tree = WITH_ANY.parse("!foo? ( a )").unwrap();
        assert_eq!(
            tree.children()[0],
            SpecTree::Conditional {
                condition: cond("foo", true),
                children: vec![leaf("a")],
            }
        );
    }

    #[test]
    fn any_rejected_when_not_allowed() {
        assert!(WITHOUT_ANY.parse("|| ( a b )").is_err());
        assert!(WITHOUT_ANY.parse("foo? ( a )").is_ok());
    }

    #[test]
    fn unbalanced_groups() {
        assert!(WITH_ANY.parse("( a").is_err());
        assert!(WITH_ANY.parse("a )").is_err());
        assert!(WITH_ANY.parse("foo? a").is_err());
        assert!(WITH_ANY.parse("|| a").is_err());
    }

    #[test]
    fn flat_printing() {
        let tree = WITH_ANY.parse("a || ( b c ) foo? ( d ) !bar? ( e )").unwrap();
        assert_eq!(
            tree.pretty_print_flat(&PlainFormatter),
            "a || ( b c ) foo? ( d ) !bar? ( e )"
        );
        assert_eq!(tree.to_string(), tree.pretty_print_flat(&PlainFormatter));
    }

    #[test]
    fn empty_groups_print() {
        let root: SpecTree<String> = SpecTree::empty();
        assert_eq!(root.pretty_print_flat(&PlainFormatter), "");
        assert_eq!(root.pretty_print(&PlainFormatter), "");

        let nested = SpecTree::All(vec![SpecTree::<String>::Any(vec![])]);
        assert_eq!(nested.pretty_print_flat(&PlainFormatter), "|| ( )");
    }

    #[test]
    fn structured_printing() {
        let tree = WITH_ANY.parse("a || ( b foo? ( c ) )").unwrap();
        assert_eq!(
            tree.pretty_print(&PlainFormatter),
            "a\n|| (\n    b\n    foo? (\n        c\n    )\n)"
        );
    }

    #[test]
    fn formatter_sees_leaves_and_conditions() {
        struct Upper;
        impl Formatter for Upper {
            fn format_plain(&self, text: &str) -> String {
                text.to_uppercase()
            }
            fn format_condition(&self, condition: &UseCondition) -> String {
                format!("<{}>", condition.flag)
            }
        }

        let tree = WITH_ANY.parse("a foo? ( b )").unwrap();
        assert_eq!(tree.pretty_print_flat(&Upper), "A <foo> ( B )");
    }

    #[test]
    fn leaves_and_emptiness() {
        let tree = WITH_ANY.parse("a || ( b ) foo? ( c )").unwrap();
        let leaves: Vec<&str> = tree.leaves().into_iter().map(String::as_str).collect();
        assert_eq!(leaves, vec!["a", "b", "c"]);
        assert!(!tree.is_empty());

        let hollow = WITH_ANY.parse("foo? ( ) || ( )").unwrap();
        assert!(hollow.is_empty());
        assert_eq!(hollow.children().len(), 2);
    }

    #[test]
    fn condition_is_met() {
        assert!(cond("foo", false).is_met(true));
        assert!(!cond("foo", false).is_met(false));
        assert!(cond("foo", true).is_met(false));
    }
}
