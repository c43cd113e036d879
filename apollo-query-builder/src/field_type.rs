use apollo_compiler::Name;
use apollo_compiler::schema::FieldDefinition;

use crate::error::QueryBuilderError;
use crate::schema::Schema;

/// What a named type offers to a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeKind {
    Object,
    Interface,
    Union,
    /// Scalars and enums
    Leaf,
}

impl TypeKind {
    pub(crate) fn is_composite(self) -> bool {
        !matches!(self, TypeKind::Leaf)
    }

    pub(crate) fn is_abstract(self) -> bool {
        matches!(self, TypeKind::Interface | TypeKind::Union)
    }
}

/// Result of visiting one entry during a traversal.
///
/// Entries that cannot be resolved against the schema are skipped rather than
/// failing the whole traversal.
#[derive(Debug)]
pub(crate) enum Outcome<T> {
    Include(T),
    Skip,
    Fail(QueryBuilderError),
}

impl<T> Outcome<T> {
    pub(crate) fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Outcome::Include(value) => f(value),
            Outcome::Skip => Outcome::Skip,
            Outcome::Fail(error) => Outcome::Fail(error),
        }
    }

    /// `Ok(None)` for a skipped entry.
    pub(crate) fn into_result(self) -> Result<Option<T>, QueryBuilderError> {
        match self {
            Outcome::Include(value) => Ok(Some(value)),
            Outcome::Skip => Ok(None),
            Outcome::Fail(error) => Err(error),
        }
    }
}

impl<T> From<Option<T>> for Outcome<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Outcome::Skip, Outcome::Include)
    }
}

/// A field resolved against its parent type.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldClass<'a> {
    pub(crate) definition: &'a FieldDefinition,
    /// The type on which sub-selections happen
    ///
    /// Example if we get the field `list: [User!]!`, it will be `User`
    pub(crate) named_type: &'a Name,
    pub(crate) kind: TypeKind,
}

pub(crate) fn classify_field<'a>(
    schema: &'a Schema,
    parent_type: &str,
    field_name: &str,
) -> Outcome<FieldClass<'a>> {
    Outcome::from(schema.field(parent_type, field_name))
        .and_then(|definition| classify_definition(schema, definition))
}

pub(crate) fn classify_definition<'a>(
    schema: &'a Schema,
    definition: &'a FieldDefinition,
) -> Outcome<FieldClass<'a>> {
    let named_type = definition.ty.inner_named_type();
    match schema.type_kind(named_type) {
        Some(kind) => Outcome::Include(FieldClass {
            definition,
            named_type,
            kind,
        }),
        None => {
            tracing::debug!(
                field = definition.name.as_str(),
                ty = named_type.as_str(),
                "field type cannot be classified, skipping"
            );
            Outcome::Skip
        }
    }
}
