use crate::iuse::IUseFlag;
use crate::keyword::KeywordName;
use crate::name::UseFlagName;
use crate::spec_tree::UseCondition;
use crate::src_uri::UriLabel;

/// Whether a flag is on or off for the package being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagState {
    Enabled,
    Disabled,
}

impl From<bool> for FlagState {
    fn from(enabled: bool) -> Self {
        if enabled {
            FlagState::Enabled
        } else {
            FlagState::Disabled
        }
    }
}

/// How a flag compares with the same flag on another package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagChange {
    /// Same state on both packages, or no comparison was made.
    Unchanged,
    /// The other package does not declare the flag.
    Added,
    /// The other package has the flag in the opposite state.
    Changed,
}

/// Rendering strategy for metadata values and specification trees.
///
/// Every method has a plain-text default; implementations override the
/// parts they want to decorate (colour, markup). A formatter only turns
/// items into text and never sees the tree structure itself.
pub trait Formatter {
    /// Render an opaque leaf (a package atom, license, token or URI).
    fn format_plain(&self, text: &str) -> String {
        text.to_string()
    }

    fn format_keyword(&self, keyword: &KeywordName) -> String {
        keyword.to_string()
    }

    /// Render a flag with its state. Disabled flags get a leading `-`,
    /// added flags a trailing `%` and changed flags a trailing `*`.
    fn format_flag(&self, flag: &UseFlagName, state: FlagState, change: FlagChange) -> String {
        let mut out = String::new();
        if state == FlagState::Disabled {
            out.push('-');
        }
        out.push_str(flag.as_str());
        match change {
            FlagChange::Unchanged => {}
            FlagChange::Added => out.push('%'),
            FlagChange::Changed => out.push('*'),
        }
        out
    }

    fn format_iuse(&self, flag: &IUseFlag) -> String {
        flag.to_string()
    }

    fn format_condition(&self, condition: &UseCondition) -> String {
        condition.to_string()
    }

    fn format_label(&self, label: &UriLabel) -> String {
        label.to_string()
    }

    /// Leading whitespace for a line at `depth` in structured output.
    fn indent(&self, depth: usize) -> String {
        "    ".repeat(depth)
    }

    /// Line separator for structured output.
    fn newline(&self) -> String {
        "\n".to_string()
    }
}

/// A [`Formatter`] that uses every default.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl Formatter for PlainFormatter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_flags() {
        let f = PlainFormatter;
        let flag = UseFlagName::new("ssl").unwrap();
        assert_eq!(f.format_flag(&flag, FlagState::Enabled, FlagChange::Unchanged), "ssl");
        assert_eq!(f.format_flag(&flag, FlagState::Disabled, FlagChange::Unchanged), "-ssl");
        assert_eq!(f.format_flag(&flag, FlagState::Enabled, FlagChange::Added), "ssl%");
        assert_eq!(f.format_flag(&flag, FlagState::Disabled, FlagChange::Changed), "-ssl*");
    }

    #[test]
    fn plain_layout() {
        let f = PlainFormatter;
        assert_eq!(f.indent(0), "");
        assert_eq!(f.indent(2), "        ");
        assert_eq!(f.newline(), "\n");
    }

    struct Bracketed;

    impl Formatter for Bracketed {
        fn format_plain(&self, text: &str) -> String {
            format!("[{text}]")
        }
    }

    #[test]
    fn override_single_method() {
        let f = Bracketed;
        assert_eq!(f.format_plain("MIT"), "[MIT]");
        assert_eq!(f.indent(1), "    ");
    }
}
