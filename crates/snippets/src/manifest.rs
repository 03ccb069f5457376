use lcdnjs_catalog::models::CanonicalName;

/// Manifest text: one `* <name>` line per written library, in first-write
/// order, without a trailing newline.
pub(crate) fn render<'a>(names: impl IntoIterator<Item = &'a CanonicalName>) -> String {
    names.into_iter().map(|name| format!("* {name}")).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let names = [CanonicalName::from_name("a"), CanonicalName::from_name("b")];
        assert_eq!(render(&names), "* a\n* b");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[]), "");
    }
}
