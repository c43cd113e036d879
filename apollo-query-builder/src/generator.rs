//! Builds the all-unselected [`SelectionTree`] of a schema.
//!
//! The traversal walks the type graph depth first. Each branch carries the
//! chain of types it went through; reaching a type already on that chain emits
//! the type's fields one level deep, all `false`, and stops. Sibling branches
//! each extend their own chain, so a type can appear again further down
//! another branch (`User.posts.author` reaches `User` twice).

use tracing::instrument;

use crate::Options;
use crate::error::OperationError;
use crate::error::QueryBuilderError;
use crate::error::SchemaError;
use crate::field_type::FieldClass;
use crate::field_type::Outcome;
use crate::field_type::TypeKind;
use crate::field_type::classify_definition;
use crate::schema::Schema;
use crate::selection::Selection;
use crate::selection::SelectionTree;
use crate::selection::TYPENAME;
use crate::selection::fragment_key;

/// Types visited on the current branch, innermost first.
#[derive(Debug, Clone, Copy)]
struct TypePath<'a> {
    name: &'a str,
    parent: Option<&'a TypePath<'a>>,
}

impl<'a> TypePath<'a> {
    fn root(name: &'a str) -> Self {
        TypePath { name, parent: None }
    }

    fn push(&'a self, name: &'a str) -> TypePath<'a> {
        TypePath {
            name,
            parent: Some(self),
        }
    }

    fn contains(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(path) = current {
            if path.name == name {
                return true;
            }
            current = path.parent;
        }
        false
    }
}

/// Generates the tree for the root type of `options.operation_type`.
pub fn generate_operation_tree(
    schema: &Schema,
    options: &Options,
) -> Result<SelectionTree, QueryBuilderError> {
    let kind = options.operation_type;
    let root = schema
        .root_operation_name(kind)
        .ok_or(OperationError::MissingRootType(kind))?;
    Ok(generate_selection_tree(schema, root, options)?)
}

/// Generates the tree for `root_type_name`, every leaf set to `false`.
#[instrument(skip_all, level = "trace", fields(root = root_type_name))]
pub fn generate_selection_tree(
    schema: &Schema,
    root_type_name: &str,
    options: &Options,
) -> Result<SelectionTree, SchemaError> {
    if schema.type_kind(root_type_name) != Some(TypeKind::Object)
        || !schema.has_fields(root_type_name)
    {
        return Err(SchemaError::InvalidRootType(root_type_name.to_string()));
    }
    let generator = Generator { schema, options };
    Ok(generator.fields(root_type_name, &TypePath::root(root_type_name)))
}

struct Generator<'a> {
    schema: &'a Schema,
    options: &'a Options,
}

impl Generator<'_> {
    fn fields(&self, type_name: &str, path: &TypePath<'_>) -> SelectionTree {
        self.schema
            .fields(type_name)
            .filter_map(
                |definition| match classify_definition(self.schema, definition) {
                    Outcome::Include(field) => {
                        Some((definition.name.to_string(), self.field(field, path)))
                    }
                    Outcome::Skip => None,
                    Outcome::Fail(error) => {
                        tracing::debug!(
                            %error,
                            ty = type_name,
                            field = definition.name.as_str(),
                            "skipping field"
                        );
                        None
                    }
                },
            )
            .collect()
    }

    fn field(&self, field: FieldClass<'_>, path: &TypePath<'_>) -> Selection {
        let named_type = field.named_type.as_str();
        if field.kind.is_composite() && path.contains(named_type) {
            tracing::trace!(
                ty = named_type,
                field = field.definition.name.as_str(),
                "type already visited on this branch"
            );
            return self.shallow(named_type);
        }
        match field.kind {
            TypeKind::Object => Selection::Node(self.fields(named_type, &path.push(named_type))),
            TypeKind::Interface => {
                Selection::Fragment(self.interface(named_type, &path.push(named_type)))
            }
            TypeKind::Union => Selection::Fragment(self.union(named_type, &path.push(named_type))),
            TypeKind::Leaf => Selection::Leaf(false),
        }
    }

    /// The fields of `type_name`, all `false`, without descending further.
    fn shallow(&self, type_name: &str) -> Selection {
        Selection::Node(
            self.schema
                .fields(type_name)
                .map(|definition| (definition.name.to_string(), Selection::Leaf(false)))
                .collect(),
        )
    }

    fn interface(&self, interface: &str, path: &TypePath<'_>) -> SelectionTree {
        let mut tree = self.typename();
        tree.extend(self.fields(interface, path));
        for implementer in self.schema.implementers(interface) {
            tree.insert(fragment_key(implementer), self.branch(implementer, path));
        }
        tree
    }

    fn union(&self, union: &str, path: &TypePath<'_>) -> SelectionTree {
        let mut tree = self.typename();
        for member in self.schema.union_members(union) {
            tree.insert(fragment_key(member), self.branch(member, path));
        }
        tree
    }

    /// Inline fragment branch for one concrete type.
    fn branch(&self, type_name: &str, path: &TypePath<'_>) -> Selection {
        if path.contains(type_name) {
            return self.shallow(type_name);
        }
        Selection::Node(self.fields(type_name, &path.push(type_name)))
    }

    fn typename(&self) -> SelectionTree {
        let mut tree = SelectionTree::new();
        if self.options.include_typename {
            tree.insert(TYPENAME, Selection::Leaf(false));
        }
        tree
    }
}
