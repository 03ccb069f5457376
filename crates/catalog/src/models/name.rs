use std::borrow::Borrow;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// The deduplication key and file-name stem of a library.
///
/// Derived from the catalog name by stripping periods (`highlight.js` →
/// `highlightjs`). No other character is touched, so names stay compatible
/// with snippets generated by earlier runs; use
/// [`is_file_safe`](Self::is_file_safe) before turning one into a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalName(String);
impl CanonicalName {
    pub fn from_name(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().chars().filter(|c| *c != '.').collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name can be used as a single file name: non-empty, no path
    /// separators, no NUL. (`..` cannot occur, periods are already gone.)
    pub fn is_file_safe(&self) -> bool {
        !self.0.is_empty() && !self.0.contains(['/', '\\', '\0'])
    }
}
impl Display for CanonicalName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
impl AsRef<str> for CanonicalName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
impl Borrow<str> for CanonicalName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Human-readable label for a library name.
///
/// Hyphens become spaces, the whole name is lowercased, then every ASCII
/// letter that does not follow a word character (`[A-Za-z0-9_]`) is
/// uppercased.
///
/// ```
/// use lcdnjs_catalog::models::describe;
///
/// assert_eq!(describe("foo-bar-baz"), "Foo Bar Baz");
/// assert_eq!(describe("jQuery.form"), "Jquery.Form");
/// ```
pub fn describe(name: impl AsRef<str>) -> String {
    let lowered = name.as_ref().replace('-', " ").to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut after_word = false;
    for c in lowered.chars() {
        if c.is_ascii_lowercase() && !after_word {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        after_word = c.is_ascii_alphanumeric() || c == '_';
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("foo.bar", "foobar")]
    #[case("highlight.js", "highlightjs")]
    #[case("d3", "d3")]
    #[case("...", "")]
    #[case("font awesome", "font awesome")]
    fn test_canonical_name(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(CanonicalName::from_name(name).as_str(), expected);
    }

    #[rstest]
    #[case("jquery", true)]
    #[case("font awesome", true)]
    #[case("", false)]
    #[case("...", false)]
    #[case("a/b", false)]
    #[case("a\\b", false)]
    #[case("a\0b", false)]
    fn test_is_file_safe(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(CanonicalName::from_name(name).is_file_safe(), expected);
    }

    #[rstest]
    #[case("foo-bar-baz", "Foo Bar Baz")]
    #[case("jquery", "Jquery")]
    #[case("twitter-bootstrap", "Twitter Bootstrap")]
    #[case("angular.js", "Angular.Js")]
    #[case("d3-3d", "D3 3d")]
    #[case("snake_case-lib", "Snake_case Lib")]
    #[case("ÉCOLE-x", "éCole X")]
    #[case("", "")]
    fn test_describe(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(describe(name), expected);
    }
}
