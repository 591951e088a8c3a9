use std::fmt;
use std::str::FromStr;

use winnow::ascii::multispace0;
use winnow::combinator::{alt, opt, peek, preceded, terminated};
use winnow::prelude::*;
use winnow::token::{any, take_while};

use crate::eapi::Eapi;
use crate::error::{Error, Result};
use crate::formatter::Formatter;
use crate::spec_tree::{Grammar, SpecLeaf, SpecTree};

/// A `SRC_URI` tree of URIs and fetch labels.
///
/// See [PMS 7.3.2](https://projects.gentoo.org/pms/9/pms.html#srcuri).
pub type FetchableUriSpecTree = SpecTree<FetchableUriItem>;

/// A `HOMEPAGE`-style tree of plain URIs.
pub type SimpleUriSpecTree = SpecTree<String>;

/// Where a package manager may fetch the files that follow a label from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UriLabelKind {
    /// Mirrors first, then the listed URI (`mirrors-default:`).
    MirrorsThenListed,
    /// Mirrors only (`mirrors-only:`).
    MirrorsOnly,
    /// The listed URI only (`listed-only:`).
    ListedOnly,
    /// The listed URI first, then mirrors (`listed-first:`).
    ListedThenMirrors,
    /// Local mirrors only (`local-only:`).
    LocalMirrorsOnly,
    /// The user fetches the files by hand (`manual:`).
    ManualOnly,
}

impl UriLabelKind {
    /// The label word used in specification strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            UriLabelKind::MirrorsThenListed => "mirrors-default",
            UriLabelKind::MirrorsOnly => "mirrors-only",
            UriLabelKind::ListedOnly => "listed-only",
            UriLabelKind::ListedThenMirrors => "listed-first",
            UriLabelKind::LocalMirrorsOnly => "local-only",
            UriLabelKind::ManualOnly => "manual",
        }
    }
}

impl FromStr for UriLabelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mirrors-default" => Ok(UriLabelKind::MirrorsThenListed),
            "mirrors-only" => Ok(UriLabelKind::MirrorsOnly),
            "listed-only" => Ok(UriLabelKind::ListedOnly),
            "listed-first" => Ok(UriLabelKind::ListedThenMirrors),
            "local-only" => Ok(UriLabelKind::LocalMirrorsOnly),
            "manual" => Ok(UriLabelKind::ManualOnly),
            _ => Err(Error::InvalidSrcUri(format!("unknown label {s}"))),
        }
    }
}

/// A fetch label: a kind plus the text it is known by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UriLabel {
    /// Fetch behaviour.
    pub kind: UriLabelKind,
    /// Label text.
    pub text: String,
}

impl UriLabel {
    /// A label of `kind` known as `text`.
    pub fn new(kind: UriLabelKind, text: impl Into<String>) -> Self {
        UriLabel {
            kind,
            text: text.into(),
        }
    }

    /// A `mirrors-only` label known as `text`.
    pub fn mirrors_only(text: impl Into<String>) -> Self {
        UriLabel::new(UriLabelKind::MirrorsOnly, text)
    }

    /// The label in effect before any explicit label, given a package's
    /// `RESTRICT`: `fetch` means manual download, `mirror` means the listed
    /// URI only, anything else tries mirrors first.
    ///
    /// Only restrictions that hold whatever the USE flags are count. A
    /// token under `flag?` is ignored, since no environment is consulted.
    pub fn for_restrictions(restrict: &SpecTree<String>) -> Self {
        let kind = if restrict.has_unconditional_token("fetch") {
            UriLabelKind::ManualOnly
        } else if restrict.has_unconditional_token("mirror") {
            UriLabelKind::ListedOnly
        } else {
            UriLabelKind::MirrorsThenListed
        };
        UriLabel::new(kind, kind.as_str())
    }
}

impl FromStr for UriLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let kind: UriLabelKind = s.parse()?;
        Ok(UriLabel::new(kind, s))
    }
}

impl fmt::Display for UriLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:", self.text)
    }
}

/// Selective URI restriction prefix (EAPI 8+).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UriRestriction {
    /// `fetch+`: fetching is allowed despite `RESTRICT=fetch`.
    Fetch,
    /// `mirror+`: mirroring is allowed despite `RESTRICT=mirror`.
    Mirror,
}

/// A downloadable URI, optionally renamed (`url -> target`, EAPI 2+).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchableUri {
    /// The download URL.
    pub url: String,
    /// Local filename given with `->`.
    pub target: Option<String>,
    /// `fetch+`/`mirror+` prefix.
    pub restriction: Option<UriRestriction>,
}

impl FetchableUri {
    /// The local filename: the rename target, or the last path component
    /// of the URL.
    pub fn filename(&self) -> &str {
        if let Some(target) = &self.target {
            return target;
        }
        let last = self.url.rsplit('/').next().unwrap_or(&self.url);
        last.split('?').next().unwrap_or(last)
    }
}

impl fmt::Display for FetchableUri {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.restriction {
            Some(UriRestriction::Fetch) => write!(f, "fetch+")?,
            Some(UriRestriction::Mirror) => write!(f, "mirror+")?,
            None => {}
        }
        write!(f, "{}", self.url)?;
        if let Some(target) = &self.target {
            write!(f, " -> {target}")?;
        }
        Ok(())
    }
}

/// A leaf of a fetchable URI tree.
///
/// A label applies to the URIs after it in the same group, including
/// those inside nested groups, until the next label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchableUriItem {
    Uri(FetchableUri),
    Label(UriLabel),
}

impl fmt::Display for FetchableUriItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FetchableUriItem::Uri(uri) => write!(f, "{uri}"),
            FetchableUriItem::Label(label) => write!(f, "{label}"),
        }
    }
}

impl SpecLeaf for FetchableUriItem {
    fn format_with(&self, f: &dyn Formatter) -> String {
        match self {
            FetchableUriItem::Uri(uri) => f.format_plain(&uri.to_string()),
            FetchableUriItem::Label(label) => f.format_label(label),
        }
    }
}

const FETCHABLE_URIS: Grammar<FetchableUriItem> = Grammar {
    allow_any: false,
    leaf: parse_fetchable_item,
};

const SIMPLE_URIS: Grammar<String> = Grammar {
    allow_any: false,
    leaf: parse_uri,
};

impl SpecTree<FetchableUriItem> {
    /// Parse a `SRC_URI` expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use portage_metadata_keys::{FetchableUriSpecTree, UriLabel};
    ///
    /// let tree = FetchableUriSpecTree::parse_fetchable_uris(
    ///     "https://example.com/foo-1.0.tar.gz ssl? ( https://example.com/ssl.patch )",
    /// ).unwrap();
    /// let initial = UriLabel::mirrors_only("foo");
    /// assert_eq!(tree.fetchables(&initial).len(), 2);
    /// ```
    pub fn parse_fetchable_uris(input: &str) -> Result<FetchableUriSpecTree> {
        FETCHABLE_URIS.parse(input).map_err(Error::InvalidSrcUri)
    }

    /// Every URI paired with the label in effect for it, starting from
    /// `initial_label`. Conditions are ignored.
    pub fn fetchables<'a>(
        &'a self,
        initial_label: &'a UriLabel,
    ) -> Vec<(&'a FetchableUri, &'a UriLabel)> {
        let mut out = Vec::new();
        match self {
            SpecTree::Leaf(FetchableUriItem::Uri(uri)) => out.push((uri, initial_label)),
            _ => collect_fetchables(self, initial_label, &mut out),
        }
        out
    }

    /// Check the tree against what `eapi` allows: arrows need EAPI 2,
    /// `fetch+`/`mirror+` prefixes need EAPI 8.
    pub fn validate_for_eapi(&self, eapi: Eapi) -> Result<()> {
        for item in self.leaves() {
            if let FetchableUriItem::Uri(uri) = item {
                if uri.target.is_some() && !eapi.has_src_uri_arrows() {
                    return Err(Error::InvalidSrcUri(format!(
                        "{uri}: arrows not supported in EAPI {eapi}"
                    )));
                }
                if uri.restriction.is_some() && !eapi.has_selective_uri_restrictions() {
                    return Err(Error::InvalidSrcUri(format!(
                        "{uri}: URI restrictions not supported in EAPI {eapi}"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn collect_fetchables<'a>(
    group: &'a FetchableUriSpecTree,
    label: &'a UriLabel,
    out: &mut Vec<(&'a FetchableUri, &'a UriLabel)>,
) {
    let mut current = label;
    for child in group.children() {
        match child {
            SpecTree::Leaf(FetchableUriItem::Label(next)) => current = next,
            SpecTree::Leaf(FetchableUriItem::Uri(uri)) => out.push((uri, current)),
            nested => collect_fetchables(nested, current, out),
        }
    }
}

impl SpecTree<String> {
    /// Parse a `HOMEPAGE`-style list of URIs.
    pub fn parse_simple_uris(input: &str) -> Result<SimpleUriSpecTree> {
        SIMPLE_URIS.parse(input).map_err(Error::InvalidSrcUri)
    }
}

// Winnow parsers

fn is_uri_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            ':' | '/'
                | '.'
                | '-'
                | '_'
                | '~'
                | '$'
                | '&'
                | '\''
                | '*'
                | '+'
                | ','
                | ';'
                | '='
                | '%'
                | '@'
                | '#'
                | '?'
        )
}

fn is_filename_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+')
}

fn parse_uri(input: &mut &str) -> ModalResult<String> {
    take_while(1.., is_uri_char)
        .map(|s: &str| s.to_string())
        .parse_next(input)
}

/// Parse `label:` followed by whitespace or the end of input.
fn parse_label(input: &mut &str) -> ModalResult<UriLabel> {
    terminated(
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-'),
        (
            ':',
            peek(opt(any)).verify(|next: &Option<char>| next.map_or(true, |c| c.is_whitespace())),
        ),
    )
    .try_map(UriLabel::from_str)
    .parse_next(input)
}

fn parse_restriction_prefix(input: &mut &str) -> ModalResult<Option<UriRestriction>> {
    opt(alt((
        "fetch+".value(UriRestriction::Fetch),
        "mirror+".value(UriRestriction::Mirror),
    )))
    .parse_next(input)
}

/// Parse a URI, optionally followed by `-> filename`.
fn parse_fetchable_uri(input: &mut &str) -> ModalResult<FetchableUri> {
    let restriction = parse_restriction_prefix(input)?;
    // `word:` is a label position; unknown labels must not pass as URIs
    let url = parse_uri
        .verify(|url: &String| !url.ends_with(':'))
        .parse_next(input)?;
    let target = opt(preceded(
        (multispace0, "->", multispace0),
        take_while(1.., is_filename_char).map(|s: &str| s.to_string()),
    ))
    .parse_next(input)?;
    Ok(FetchableUri {
        url,
        target,
        restriction,
    })
}

fn parse_fetchable_item(input: &mut &str) -> ModalResult<FetchableUriItem> {
    alt((
        parse_label.map(FetchableUriItem::Label),
        parse_fetchable_uri.map(FetchableUriItem::Uri),
    ))
    .parse_next(input)
}
