//! GraphQL schema.

use std::sync::Arc;

use apollo_compiler::Name;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::FieldDefinition;
use apollo_compiler::validation::Valid;

use crate::OperationKind;
use crate::error::SchemaError;
use crate::field_type::TypeKind;

// Primitives are taken from scalars: https://spec.graphql.org/draft/#sec-Scalars
const BUILT_IN_SCALARS: [&str; 5] = ["ID", "String", "Int", "Float", "Boolean"];

/// A parsed and validated GraphQL schema.
///
/// Never mutated once built, so a single instance can back any number of
/// selection trees.
pub struct Schema {
    raw_sdl: Arc<String>,
    definitions: Valid<apollo_compiler::Schema>,
}

impl Schema {
    pub fn parse(raw_sdl: &str) -> Result<Self, SchemaError> {
        let definitions = apollo_compiler::Schema::parse_and_validate(raw_sdl, "schema.graphql")?;
        Self::from_schema(Arc::new(raw_sdl.to_string()), definitions)
    }

    pub(crate) fn from_schema(
        raw_sdl: Arc<String>,
        definitions: Valid<apollo_compiler::Schema>,
    ) -> Result<Self, SchemaError> {
        if definitions.schema_definition.query.is_none() {
            return Err(SchemaError::MissingQueryRoot);
        }
        Ok(Schema {
            raw_sdl,
            definitions,
        })
    }

    /// Extracts a string containing the entire [`Schema`].
    pub fn as_string(&self) -> &Arc<String> {
        &self.raw_sdl
    }

    pub fn definitions(&self) -> &Valid<apollo_compiler::Schema> {
        &self.definitions
    }

    pub fn root_operation_name(&self, kind: OperationKind) -> Option<&Name> {
        self.definitions.root_operation(kind.into())
    }

    /// Classifies a named type. Input objects and unknown names are not
    /// selectable and yield `None`.
    pub(crate) fn type_kind(&self, name: &str) -> Option<TypeKind> {
        match self.definitions.types.get(name) {
            Some(ExtendedType::Object(_)) => Some(TypeKind::Object),
            Some(ExtendedType::Interface(_)) => Some(TypeKind::Interface),
            Some(ExtendedType::Union(_)) => Some(TypeKind::Union),
            Some(ExtendedType::Scalar(_)) | Some(ExtendedType::Enum(_)) => Some(TypeKind::Leaf),
            Some(ExtendedType::InputObject(_)) => None,
            None if BUILT_IN_SCALARS.contains(&name) => Some(TypeKind::Leaf),
            None => None,
        }
    }

    /// Fields of an object or interface type, in declaration order.
    pub(crate) fn fields<'a>(
        &'a self,
        type_name: &str,
    ) -> impl Iterator<Item = &'a FieldDefinition> + 'a {
        let fields = match self.definitions.types.get(type_name) {
            Some(ExtendedType::Object(object)) => Some(&object.fields),
            Some(ExtendedType::Interface(interface)) => Some(&interface.fields),
            _ => None,
        };
        fields
            .into_iter()
            .flat_map(|fields| fields.values())
            .map(|component| &*component.node)
    }

    pub(crate) fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDefinition> {
        match self.definitions.types.get(type_name)? {
            ExtendedType::Object(object) => object.fields.get(field_name),
            ExtendedType::Interface(interface) => interface.fields.get(field_name),
            _ => None,
        }
        .map(|component| &*component.node)
    }

    pub(crate) fn has_fields(&self, type_name: &str) -> bool {
        self.fields(type_name).next().is_some()
    }

    /// Object types implementing `interface`, in declaration order.
    pub(crate) fn implementers<'a>(&'a self, interface: &'a str) -> impl Iterator<Item = &'a Name> {
        self.definitions
            .types
            .iter()
            .filter_map(move |(name, ty)| match ty {
                ExtendedType::Object(object)
                    if object.implements_interfaces.contains(interface) =>
                {
                    Some(name)
                }
                _ => None,
            })
    }

    /// Whether an inline fragment on `type_condition` may appear in a selection
    /// set on `parent_type`.
    pub(crate) fn is_possible_type(&self, parent_type: &str, type_condition: &str) -> bool {
        parent_type == type_condition
            || self
                .implementers(parent_type)
                .any(|name| name.as_str() == type_condition)
            || self
                .union_members(parent_type)
                .any(|name| name.as_str() == type_condition)
    }

    pub(crate) fn union_members<'a>(&'a self, union: &str) -> impl Iterator<Item = &'a Name> {
        self.definitions
            .get_union(union)
            .into_iter()
            .flat_map(|union| union.members.iter())
            .map(|member| &member.name)
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self {
            raw_sdl,
            definitions: _, // skip
        } = self;
        f.debug_struct("Schema").field("raw_sdl", raw_sdl).finish()
    }
}
