//! Field resolution.
//!
//! Flattens a struct-like aggregate into a name-indexed table of fields.
//! Fields of embedded aggregates are promoted into the enclosing namespace
//! unless shadowed: the shallowest occurrence of a name wins, and among
//! occurrences at the same depth the one reached through the lowest field
//! index wins. Shadowed occurrences stay in the table as lower-priority
//! candidates.

use crate::graph::{StructField, StructType, TypeGraph, TypeId};
use crate::predicates;
use crate::tags::{Annotation, has_tag};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// One step of a field path: a field within its enclosing aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    /// Index of the field within its enclosing aggregate.
    pub index: usize,
    /// Field type.
    pub ty: TypeId,
    /// Resolved field name.
    pub name: String,
    /// Raw annotation string of the field.
    pub tag: String,
}

/// Chain of fields from the root aggregate down to a physical field.
///
/// Paths are never modified in place; extending a path yields a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Creates an empty path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new path with `segment` appended.
    #[must_use]
    pub fn extended(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }

    /// Returns a new path holding the first `len` segments.
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// Returns the segments from root to leaf.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if the path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the embedding depth: zero for fields declared on the root.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    /// Returns the last segment.
    #[must_use]
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, ".{}", segment.name)?;
        }
        Ok(())
    }
}

/// Compares two paths by depth, then by field index at each level.
///
/// Returns `Less` if `a` is shallower (or reached through an earlier
/// field), `Greater` if it is deeper, and `Equal` if both lead to the same
/// physical field.
#[must_use]
pub fn shortest_path(a: &FieldPath, b: &FieldPath) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| {
        a.segments
            .iter()
            .zip(&b.segments)
            .map(|(x, y)| x.index.cmp(&y.index))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    })
}

/// Returns the name of a struct field.
///
/// Embedded fields take the name of their type, looking through a pointer.
#[must_use]
pub fn field_name(graph: &TypeGraph, field: &StructField) -> String {
    if field.embedded {
        predicates::type_label(graph, field.ty)
    } else {
        field.name.clone()
    }
}

/// A resolved field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Index within the immediately enclosing aggregate.
    pub index: usize,
    /// Resolved name.
    pub name: String,
    /// Field type.
    pub ty: TypeId,
    /// Whether the field is embedded.
    pub embedded: bool,
    /// Raw annotation string.
    pub tag: String,
    /// Decoded annotations, at most one per key.
    pub annotations: Vec<Annotation>,
    /// Path from the root aggregate.
    pub path: FieldPath,
}

impl Field {
    /// Returns the annotation stored under `key`.
    #[must_use]
    pub fn annotation(&self, key: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.key == key)
    }

    /// Stores an annotation, replacing one with the same key in place.
    pub fn set_annotation(&mut self, annotation: Annotation) {
        match self.annotations.iter_mut().find(|a| a.key == annotation.key) {
            Some(existing) => *existing = annotation,
            None => self.annotations.push(annotation),
        }
    }

    /// Returns the embedding depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.depth()
    }

    /// Returns the field re-rooted at the first path segment whose raw tag
    /// carries `key`, or a copy of this field if none does.
    ///
    /// This finds the embedding field that claimed an annotation for a
    /// promoted field.
    #[must_use]
    pub fn with_tag(&self, key: &str) -> Self {
        let Some(pos) = self
            .path
            .segments()
            .iter()
            .position(|s| has_tag(&s.tag, key))
        else {
            return self.clone();
        };
        let segment = &self.path.segments()[pos];
        Self {
            index: segment.index,
            name: segment.name.clone(),
            ty: segment.ty,
            embedded: pos + 1 < self.path.len() || self.embedded,
            tag: segment.tag.clone(),
            annotations: Annotation::parse(&segment.tag, key).into_iter().collect(),
            path: self.path.prefix(pos + 1),
        }
    }
}

/// Options controlling how an aggregate is flattened.
#[derive(Debug, Clone)]
pub struct FlattenOptions {
    key: String,
    follow_embeds: bool,
}

impl FlattenOptions {
    /// Creates options decoding annotations under `key` and following embeds.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            follow_embeds: true,
        }
    }

    /// Sets whether embedded aggregates are promoted.
    #[must_use]
    pub fn follow_embeds(mut self, follow: bool) -> Self {
        self.follow_embeds = follow;
        self
    }

    /// Returns the annotation key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Name-indexed table of resolved fields.
///
/// Names keep the order in which they were first seen. Each name maps to its
/// candidates, shallowest first; only the first candidate is addressable by
/// [`FieldTable::get`].
#[derive(Debug, Clone, Default)]
pub struct FieldTable {
    entries: Vec<(String, Vec<Field>)>,
    index: HashMap<String, usize>,
}

impl FieldTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table holds no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the field that wins name resolution for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.candidates(name).first()
    }

    /// Returns every candidate for `name`, shallowest first.
    #[must_use]
    pub fn candidates(&self, name: &str) -> &[Field] {
        self.index
            .get(name)
            .map(|&i| self.entries[i].1.as_slice())
            .unwrap_or(&[])
    }

    /// Iterates over names and their winning fields in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.entries
            .iter()
            .filter_map(|(name, fields)| fields.first().map(|f| (name.as_str(), f)))
    }

    /// Iterates over the winning fields in first-seen order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.iter().map(|(_, f)| f)
    }

    /// Returns the names in first-seen order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Adds a field, applying shadowing rules. See [`FieldTable::insert`].
    #[must_use]
    pub fn add(mut self, field: Field) -> Self {
        self.insert(field);
        self
    }

    /// Inserts a field, applying shadowing rules.
    ///
    /// - a new name is inserted as the sole candidate;
    /// - a path equal to the current winner's merges annotations into it,
    ///   replacing same-key annotations only;
    /// - a shallower path becomes the new winner;
    /// - a deeper path is kept as a lower-priority candidate.
    pub fn insert(&mut self, field: Field) {
        let Some(&pos) = self.index.get(&field.name) else {
            self.index.insert(field.name.clone(), self.entries.len());
            self.entries.push((field.name.clone(), vec![field]));
            return;
        };

        let candidates = &mut self.entries[pos].1;
        let Some(head) = candidates.first_mut() else {
            candidates.push(field);
            return;
        };
        match shortest_path(&field.path, &head.path) {
            Ordering::Equal => {
                for annotation in field.annotations {
                    head.set_annotation(annotation);
                }
            }
            Ordering::Less => {
                tracing::trace!(
                    name = %field.name,
                    winner = %field.path,
                    shadowed = %head.path,
                    "field shadows deeper candidate"
                );
                candidates.insert(0, field);
            }
            Ordering::Greater => {
                tracing::trace!(
                    name = %field.name,
                    winner = %head.path,
                    shadowed = %field.path,
                    "field shadowed by shallower candidate"
                );
                candidates.push(field);
                candidates.sort_by(|a, b| shortest_path(&a.path, &b.path));
            }
        }
    }

    /// Flattens `aggregate` into this table, returning the updated table.
    ///
    /// Flattening the same aggregate again under another key merges the new
    /// annotations into the existing fields.
    #[must_use]
    pub fn merge(mut self, graph: &TypeGraph, aggregate: TypeId, options: &FlattenOptions) -> Self {
        let Some(root) = predicates::resolve(graph, aggregate) else {
            return self;
        };
        let Some(body) = predicates::as_struct(graph, root) else {
            return self;
        };
        tracing::debug!(
            aggregate = %aggregate,
            key = options.key(),
            fields = body.num_fields(),
            "flattening aggregate"
        );
        let mut visiting = Vec::new();
        self.walk(graph, root, body, options, &FieldPath::new(), &mut visiting);
        self
    }

    fn walk(
        &mut self,
        graph: &TypeGraph,
        id: TypeId,
        body: &StructType,
        options: &FlattenOptions,
        path: &FieldPath,
        visiting: &mut Vec<TypeId>,
    ) {
        visiting.push(id);
        for (index, field) in body.fields.iter().enumerate() {
            let name = field_name(graph, field);
            let explicit = Annotation::parse(&field.tag, options.key()).filter(|a| !a.is_empty());
            let field_path = path.extended(PathSegment {
                index,
                ty: field.ty,
                name: name.clone(),
                tag: field.tag.clone(),
            });

            if options.follow_embeds && explicit.is_none() {
                if let Some((inner_id, inner)) = predicates::embedded(graph, field) {
                    if !visiting.contains(&inner_id) {
                        self.walk(graph, inner_id, inner, options, &field_path, visiting);
                        continue;
                    }
                    tracing::debug!(
                        field = %field_path,
                        "embedding cycle, keeping embedded field as a leaf"
                    );
                }
            }

            self.insert(Field {
                index,
                name,
                ty: field.ty,
                embedded: field.embedded,
                tag: field.tag.clone(),
                annotations: explicit.into_iter().collect(),
                path: field_path,
            });
        }
        visiting.pop();
    }
}

/// Flattens an aggregate into a field table.
///
/// Returns an empty table when `aggregate` does not resolve to a struct.
#[must_use]
pub fn flatten(graph: &TypeGraph, aggregate: TypeId, key: &str, follow_embeds: bool) -> FieldTable {
    let options = FlattenOptions::new(key).follow_embeds(follow_embeds);
    FieldTable::new().merge(graph, aggregate, &options)
}
