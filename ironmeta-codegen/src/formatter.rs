//! Formatting of finished source text.

use crate::error::CodeError;

/// Canonicalizes generated source text.
pub trait Formatter {
    /// Formats `source`, or reports why it is not valid.
    ///
    /// # Errors
    /// Returns `CodeError` if `source` cannot be parsed.
    fn format(&self, source: &str) -> Result<String, CodeError>;
}

/// Parses Rust with `syn` and prints it with `prettyplease`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustFormatter;

impl Formatter for RustFormatter {
    fn format(&self, source: &str) -> Result<String, CodeError> {
        let file = syn::parse_file(source)?;
        Ok(prettyplease::unparse(&file))
    }
}

/// Returns the text unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Formatter for Passthrough {
    fn format(&self, source: &str) -> Result<String, CodeError> {
        Ok(source.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_formatter_normalizes() {
        let out = RustFormatter
            .format("pub struct  A{x:u8,}")
            .expect("valid source");
        assert_eq!(out, "pub struct A {\n    x: u8,\n}\n");
    }

    #[test]
    fn test_rust_formatter_surfaces_syntax_error() {
        let source = "pub struct {";
        let expected = match syn::parse_file(source) {
            Err(e) => e.to_string(),
            Ok(_) => panic!("expected a syntax error"),
        };
        let err = RustFormatter.format(source).unwrap_err();
        assert!(matches!(err, CodeError::Syntax(_)));
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(Passthrough.format("not rust {").expect("ok"), "not rust {");
    }
}
