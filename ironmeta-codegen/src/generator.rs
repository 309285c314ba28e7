//! Flattened view generation.
//!
//! Emits, for each struct type of a catalog, a struct with one public field
//! per resolved field name, embedded fields promoted.

use crate::code::{Arg, Code};
use crate::error::CodegenError;
use crate::formatter::{Formatter, RustFormatter};
use ironmeta_schema::fields::{Field, flatten};
use ironmeta_schema::predicates::{qualified_name, struct_filter};
use ironmeta_schema::{Catalog, TypeId};
use std::collections::HashSet;

/// Generator for flattened struct views.
pub struct FlatViewGenerator<'a> {
    catalog: &'a Catalog,
    key: String,
    follow_embeds: bool,
    suffix: String,
    derives: Vec<String>,
}

impl<'a> FlatViewGenerator<'a> {
    /// Creates a generator reading `json` annotations and deriving `Debug`
    /// and `Clone`.
    #[must_use]
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            key: "json".to_string(),
            follow_embeds: true,
            suffix: "Flat".to_string(),
            derives: vec!["Debug".to_string(), "Clone".to_string()],
        }
    }

    /// Sets the annotation key used to name fields.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Sets whether embedded structs are promoted.
    #[must_use]
    pub fn follow_embeds(mut self, follow: bool) -> Self {
        self.follow_embeds = follow;
        self
    }

    /// Sets the suffix appended to generated type names.
    #[must_use]
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Replaces the derived traits.
    #[must_use]
    pub fn derives<I, S>(mut self, derives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.derives = derives.into_iter().map(Into::into).collect();
        self
    }

    /// Generates views for every struct type in the catalog.
    ///
    /// # Errors
    /// Returns `CodegenError` if generation or formatting fails.
    pub fn generate(&self) -> Result<String, CodegenError> {
        let types = self.catalog.defined_types(&struct_filter());
        self.render(&types, &RustFormatter)
    }

    /// Generates views for the named types, in the order given.
    ///
    /// # Errors
    /// Returns `CodegenError::UnknownType` if a name is not declared, or
    /// another `CodegenError` if generation or formatting fails.
    pub fn generate_types(&self, names: &[&str]) -> Result<String, CodegenError> {
        let types = names
            .iter()
            .map(|name| {
                self.catalog
                    .lookup_type(name)
                    .ok_or_else(|| CodegenError::unknown_type(*name))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.render(&types, &RustFormatter)
    }

    /// Generates views for `types` and formats the file with `formatter`.
    ///
    /// # Errors
    /// Returns `CodegenError` if generation or formatting fails.
    pub fn render(&self, types: &[TypeId], formatter: &impl Formatter) -> Result<String, CodegenError> {
        let graph = self.catalog.graph();
        let code = types
            .iter()
            .fold(Code::new(Some(self.catalog.home())), |code, &ty| {
                code.append(self.view(ty))
            });
        Ok(code.finalize_file(graph, formatter)?)
    }

    /// Builds the view of a single type.
    #[must_use]
    pub fn view(&self, ty: TypeId) -> Code {
        let graph = self.catalog.graph();
        let name = qualified_name(graph, ty).name;
        let view_name = format!("{name}{}", self.suffix);
        let table = flatten(graph, ty, &self.key, self.follow_embeds);
        tracing::debug!(
            source = %name,
            view = %view_name,
            fields = table.len(),
            "generating flat view"
        );

        let mut code = Code::new(Some(self.catalog.home()))
            .format(graph, "/// Flattened view of `{}`.\n", &[Arg::Text(&name)]);
        if !self.derives.is_empty() {
            code = code.println(format!("#[derive({})]", self.derives.join(", ")));
        }
        code = code.format(graph, "pub struct {} {{\n", &[Arg::Text(&view_name)]);

        let mut seen = HashSet::new();
        for field in table.fields() {
            let Some(ident) = self.field_ident(field) else {
                continue;
            };
            if !seen.insert(ident.clone()) {
                return code.errorf(format!(
                    "duplicate field '{ident}' in view of '{name}' (from {})",
                    field.path
                ));
            }
            code = code.format(
                graph,
                "    /// `{}`\n    pub {}: {},\n",
                &[
                    Arg::display(&field.path),
                    Arg::Owned(ident),
                    Arg::Type(field.ty),
                ],
            );
        }
        code.println("}").println("")
    }

    /// Returns the identifier of a field in the view, or `None` if the field
    /// is excluded.
    fn field_ident(&self, field: &Field) -> Option<String> {
        let annotated = field
            .annotation(&self.key)
            .map(|a| a.name.as_str())
            .filter(|n| !n.is_empty());
        let ident = match annotated {
            Some("-") => return None,
            Some(name) => to_snake_case(name),
            None => to_snake_case(&field.name),
        };
        Some(escape_keyword(ident))
    }
}

/// Converts a field or annotation name to snake_case.
///
/// Runs of capitals are kept together, so `HTTPServer` becomes `http_server`
/// and `ID` becomes `id`.
#[must_use]
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == ' ' || c == '.' {
            if !result.ends_with('_') {
                result.push('_');
            }
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_lower);
            if boundary && !result.ends_with('_') {
                result.push('_');
            }
        }
        result.extend(c.to_lowercase());
    }
    result
}

/// Turns a name into a usable identifier.
///
/// Keywords get the `r#` prefix. Names that cannot be raw identifiers
/// (`self`, `crate`, `_`, leading digits) get an underscore appended or
/// prepended instead.
fn escape_keyword(ident: String) -> String {
    let is_ident = |s: &str| syn::parse_str::<syn::Ident>(s).is_ok();
    if is_ident(&ident) {
        return ident;
    }
    [
        format!("r#{ident}"),
        format!("{ident}_"),
        format!("_{ident}"),
    ]
    .into_iter()
    .find(|candidate| is_ident(candidate))
    .unwrap_or(ident)
}
