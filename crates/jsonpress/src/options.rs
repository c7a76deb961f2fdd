/// Configuration options for the JSON parser.
///
/// Options are copied into each parse call when it starts, so a [`Parser`]
/// can be configured once and reused for any number of documents.
///
/// # Examples
///
/// ```rust
/// use jsonpress::{Parser, ParserOptions};
///
/// let parser = Parser::new(ParserOptions {
///     allow_comments: true,
///     ..Default::default()
/// });
/// let value = parser.parse("[1, /* two */ 2] // done").unwrap();
/// assert_eq!(value.as_array().map(|a| a.len()), Some(2));
/// ```
///
/// [`Parser`]: crate::Parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Whether `//` line comments and `/* */` block comments are accepted
    /// wherever whitespace is.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_comments: bool,

    /// Whether a leading UTF-8 byte-order mark (`EF BB BF`) is detected and
    /// skipped.
    ///
    /// When `false`, a byte-order mark is an unexpected token at offset 0.
    ///
    /// # Default
    ///
    /// `true`
    pub check_bom: bool,

    #[cfg(any(test, feature = "fuzzing"))]
    /// Panic on syntax errors instead of returning them.
    ///
    /// Enabled only in test and fuzzing builds to produce backtraces at the
    /// failure site.
    pub panic_on_error: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            allow_comments: false,
            check_bom: true,
            #[cfg(any(test, feature = "fuzzing"))]
            panic_on_error: false,
        }
    }
}
