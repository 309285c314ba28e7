//! Source assembly buffer.
//!
//! [`Code`] accumulates generated text together with the packages that text
//! refers to. Every operation consumes the buffer and returns the next state.
//! Once a failure is recorded the buffer stops accepting text and the first
//! failure is kept.

use crate::error::CodeError;
use crate::formatter::Formatter;
use crate::imports::{collect_type_imports, dedup_packages};
use crate::qualifier::Qualifier;
use ironmeta_schema::{PackageId, TypeGraph, TypeId, VarDecl};
use proc_macro2::TokenStream;
use std::fmt;

/// Argument substituted into a [`Code::format`] template.
#[derive(Debug, Clone)]
pub enum Arg<'a> {
    /// Literal text.
    Text(&'a str),
    /// Owned text, usually produced by [`Arg::display`].
    Owned(String),
    /// Type reference, rendered with the buffer's qualifier.
    Type(TypeId),
    /// Nested buffer; its text and dependencies are merged.
    Code(&'a Code),
    /// Variable reference; renders its identifier.
    Var(&'a VarDecl),
    /// Token stream, e.g. from `quote!`.
    Tokens(TokenStream),
}

impl Arg<'_> {
    /// Creates an argument from any displayable value.
    pub fn display(value: impl fmt::Display) -> Arg<'static> {
        Arg::Owned(value.to_string())
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Arg::Text(value)
    }
}

impl From<String> for Arg<'_> {
    fn from(value: String) -> Self {
        Arg::Owned(value)
    }
}

impl From<TypeId> for Arg<'_> {
    fn from(value: TypeId) -> Self {
        Arg::Type(value)
    }
}

impl<'a> From<&'a Code> for Arg<'a> {
    fn from(value: &'a Code) -> Self {
        Arg::Code(value)
    }
}

impl<'a> From<&'a VarDecl> for Arg<'a> {
    fn from(value: &'a VarDecl) -> Self {
        Arg::Var(value)
    }
}

impl From<TokenStream> for Arg<'_> {
    fn from(value: TokenStream) -> Self {
        Arg::Tokens(value)
    }
}

/// Piece of a parsed template.
enum Piece<'t> {
    Literal(&'t str),
    Escaped(char),
    Placeholder,
}

fn parse_template(template: &str) -> Result<Vec<Piece<'_>>, CodeError> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut chars = template.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '{' && c != '}' {
            continue;
        }
        if start < i {
            pieces.push(Piece::Literal(&template[start..i]));
        }
        match (c, chars.peek().map(|&(_, n)| n)) {
            ('{', Some('{')) => pieces.push(Piece::Escaped('{')),
            ('}', Some('}')) => pieces.push(Piece::Escaped('}')),
            ('{', Some('}')) => pieces.push(Piece::Placeholder),
            _ => {
                return Err(CodeError::template(format!(
                    "unmatched '{c}' at offset {i} in {template:?}"
                )));
            }
        }
        chars.next();
        start = i + 2;
    }
    if start < template.len() {
        pieces.push(Piece::Literal(&template[start..]));
    }
    Ok(pieces)
}

/// Generated source text plus the packages it depends on.
#[derive(Debug, Clone, Default)]
pub struct Code {
    home: Option<PackageId>,
    text: String,
    imports: Vec<PackageId>,
    error: Option<CodeError>,
}

impl Code {
    /// Creates an empty buffer generating code for `home`.
    #[must_use]
    pub fn new(home: Option<PackageId>) -> Self {
        Self {
            home,
            ..Self::default()
        }
    }

    /// Returns the home package.
    #[must_use]
    pub fn home(&self) -> Option<PackageId> {
        self.home
    }

    /// Returns the accumulated text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the recorded failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&CodeError> {
        self.error.as_ref()
    }

    /// Returns true if no failure was recorded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Returns every package reference in the order recorded, repeats
    /// included.
    #[must_use]
    pub fn imports(&self) -> &[PackageId] {
        &self.imports
    }

    /// Returns the referenced packages, each once, in first-reference order.
    #[must_use]
    pub fn dependencies(&self) -> Vec<PackageId> {
        dedup_packages(&self.imports)
    }

    /// Records a failure unless one is already recorded.
    #[must_use]
    pub fn with_error(mut self, error: CodeError) -> Self {
        if self.error.is_none() {
            tracing::debug!(error = %error, "code buffer failed");
            self.error = Some(error);
        }
        self
    }

    /// Records a generation failure unless one is already recorded.
    #[must_use]
    pub fn errorf(self, message: impl fmt::Display) -> Self {
        self.with_error(CodeError::generation(message.to_string()))
    }

    /// Records a package dependency.
    #[must_use]
    pub fn import(mut self, package: PackageId) -> Self {
        if self.error.is_none() {
            self.imports.push(package);
        }
        self
    }

    /// Appends raw text.
    #[must_use]
    pub fn print(mut self, text: impl AsRef<str>) -> Self {
        if self.error.is_none() {
            self.text.push_str(text.as_ref());
        }
        self
    }

    /// Appends raw text followed by a newline.
    #[must_use]
    pub fn println(self, text: impl AsRef<str>) -> Self {
        self.print(text).print("\n")
    }

    /// Appends another buffer.
    ///
    /// If this buffer already failed it is returned unchanged. Otherwise, if
    /// `other` failed, its state replaces this one.
    #[must_use]
    pub fn append(self, other: Code) -> Self {
        if self.error.is_some() {
            return self;
        }
        if other.error.is_some() {
            return Self {
                home: self.home,
                ..other
            };
        }
        let mut out = self;
        out.text.push_str(&other.text);
        out.imports.extend(other.imports);
        out
    }

    /// Appends `template` with each `{}` replaced by the next argument.
    ///
    /// `{{` and `}}` produce literal braces. A mismatch between placeholders
    /// and arguments, or a failed nested buffer, records a failure and
    /// appends nothing.
    #[must_use]
    pub fn format(self, graph: &TypeGraph, template: &str, args: &[Arg<'_>]) -> Self {
        if self.error.is_some() {
            return self;
        }
        let pieces = match parse_template(template) {
            Ok(pieces) => pieces,
            Err(err) => return self.with_error(err),
        };
        let placeholders = pieces
            .iter()
            .filter(|p| matches!(p, Piece::Placeholder))
            .count();
        if placeholders != args.len() {
            return self.with_error(CodeError::template(format!(
                "{placeholders} placeholders but {} arguments in {template:?}",
                args.len()
            )));
        }
        if let Some(err) = args.iter().find_map(|a| match a {
            Arg::Code(code) => code.error.clone(),
            _ => None,
        }) {
            return self.with_error(err);
        }

        let qualifier = Qualifier::new(graph, self.home);
        let mut out = self;
        let mut args = args.iter();
        for piece in pieces {
            match piece {
                Piece::Literal(s) => out.text.push_str(s),
                Piece::Escaped(c) => out.text.push(c),
                Piece::Placeholder => {
                    if let Some(arg) = args.next() {
                        out.write_arg(graph, &qualifier, arg);
                    }
                }
            }
        }
        out
    }

    fn write_arg(&mut self, graph: &TypeGraph, qualifier: &Qualifier<'_>, arg: &Arg<'_>) {
        match arg {
            Arg::Text(s) => self.text.push_str(s),
            Arg::Owned(s) => self.text.push_str(s),
            Arg::Type(ty) => {
                self.text.push_str(&qualifier.type_string(*ty));
                collect_type_imports(graph, *ty, &mut self.imports);
            }
            Arg::Code(code) => {
                self.text.push_str(&code.text);
                self.imports.extend_from_slice(&code.imports);
            }
            Arg::Var(var) => {
                self.text.push_str(&var.name);
                collect_type_imports(graph, var.ty, &mut self.imports);
                if let Some(init) = &var.initializer {
                    self.imports.extend_from_slice(&init.references);
                }
            }
            Arg::Tokens(tokens) => self.text.push_str(&tokens.to_string()),
        }
    }

    /// Formats the accumulated text.
    ///
    /// # Errors
    /// Returns the recorded failure, or the formatter's error unchanged.
    pub fn finalize(self, formatter: &impl Formatter) -> Result<String, CodeError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        formatter.format(&self.text)
    }

    /// Prefixes `use` declarations for every dependency outside the home
    /// package, then formats the file.
    ///
    /// Packages whose name is shared with another package in the graph are
    /// rendered by full path and need no `use`.
    ///
    /// # Errors
    /// Returns the recorded failure, or the formatter's error unchanged.
    pub fn finalize_file(
        self,
        graph: &TypeGraph,
        formatter: &impl Formatter,
    ) -> Result<String, CodeError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let qualifier = Qualifier::new(graph, self.home);
        let mut uses: Vec<String> = self
            .dependencies()
            .into_iter()
            .filter_map(|p| {
                let info = graph.package_info(p);
                let prefix = qualifier.prefix(p)?;
                if prefix != info.name {
                    return None;
                }
                Some(if info.name_matches_path() {
                    format!("use {};\n", info.path)
                } else {
                    format!("use {} as {};\n", info.path, info.name)
                })
            })
            .collect();
        uses.sort();
        tracing::debug!(
            uses = uses.len(),
            bytes = self.text.len(),
            "finalizing generated file"
        );

        let mut source = uses.concat();
        if !uses.is_empty() {
            source.push('\n');
        }
        source.push_str(&self.text);
        formatter.format(&source)
    }
}

impl fmt::Write for Code {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.error.is_none() {
            self.text.push_str(s);
        }
        Ok(())
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
