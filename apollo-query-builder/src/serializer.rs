//! Turns a [`SelectionTree`] back into GraphQL operation text.
//!
//! Lowering walks the tree against the schema and keeps what can be written;
//! formatting then writes the kept items on a single line.

use std::fmt;

use apollo_compiler::Name;
use apollo_compiler::ast::Value;
use apollo_compiler::schema::FieldDefinition;
use tracing::instrument;

use crate::OperationKind;
use crate::Options;
use crate::RequiredArguments;
use crate::arguments::ArgumentProvider;
use crate::arguments::PlaceholderArguments;
use crate::error::OperationError;
use crate::error::QueryBuilderError;
use crate::field_type::Outcome;
use crate::field_type::classify_field;
use crate::schema::Schema;
use crate::selection::Selection;
use crate::selection::SelectionTree;
use crate::selection::TYPENAME;
use crate::selection::fragment_type;

// The RECURSION_LIMIT is chosen to be:
//   < # expected to cause stack overflow &&
//   > # expected in a legitimate query
const RECURSION_LIMIT: usize = 512;

/// Writes the operation selected by `tree` on the root type of
/// `options.operation_type`.
#[instrument(skip_all, level = "trace", fields(operation = %options.operation_type))]
pub fn serialize_operation(
    schema: &Schema,
    tree: &SelectionTree,
    options: &Options,
) -> Result<String, QueryBuilderError> {
    let kind = options.operation_type;
    let root = schema
        .root_operation_name(kind)
        .ok_or(OperationError::MissingRootType(kind))?;

    let lowering = Lowering {
        schema,
        arguments: argument_provider(options),
    };
    let selection_set = lowering
        .selection_set(root, tree, false, 0)
        .into_result()?
        .map(SelectionSet::into_root_items)
        .unwrap_or_default();

    let operation = Operation {
        kind,
        // an empty operation is written without its name
        name: options
            .operation_name
            .as_deref()
            .filter(|_| !selection_set.is_empty()),
        selection_set,
    };
    Ok(operation.to_string())
}

fn argument_provider(options: &Options) -> Option<&dyn ArgumentProvider> {
    if let Some(provider) = options.argument_provider.as_deref() {
        return Some(provider);
    }
    match options.required_arguments {
        RequiredArguments::Omit => None,
        RequiredArguments::Placeholder => Some(&PlaceholderArguments),
    }
}

struct Operation<'a> {
    kind: OperationKind,
    name: Option<&'a str>,
    selection_set: Vec<Item<'a>>,
}

enum Item<'a> {
    Typename,
    Field {
        name: &'a str,
        arguments: Vec<(Name, Value)>,
        selection_set: Option<Vec<Item<'a>>>,
    },
    InlineFragment {
        type_condition: &'a str,
        selection_set: Vec<Item<'a>>,
    },
}

/// What one tree entry contributes to the enclosing selection set.
enum Lowered<'a> {
    Item(Item<'a>),
    /// `field {}`: an object whose own entries are all unselected.
    Touched(Item<'a>),
    /// Nothing to write, and only touched objects further down.
    Hollow,
}

#[derive(Default)]
struct SelectionSet<'a> {
    items: Vec<Item<'a>>,
    touched: Vec<Item<'a>>,
    hollow: bool,
}

impl<'a> SelectionSet<'a> {
    /// Touched fields are only written at the root, and only when nothing else
    /// is selected: `{}` next to real selections is not valid GraphQL.
    fn into_root_items(self) -> Vec<Item<'a>> {
        if self.items.is_empty() {
            self.touched
        } else {
            self.items
        }
    }

    /// Lowers the set as the body of a field or fragment built by `write`.
    ///
    /// A `touchable` body whose entries all turned out unselected is written
    /// empty, as a touched field.
    fn lower(
        self,
        write: impl FnOnce(Vec<Item<'a>>) -> Item<'a>,
        touchable: bool,
    ) -> Outcome<Lowered<'a>> {
        if !self.items.is_empty() {
            Outcome::Include(Lowered::Item(write(self.items)))
        } else if self.hollow || !self.touched.is_empty() {
            Outcome::Include(Lowered::Hollow)
        } else if touchable {
            Outcome::Include(Lowered::Touched(write(Vec::new())))
        } else {
            Outcome::Skip
        }
    }
}

struct Lowering<'a> {
    schema: &'a Schema,
    arguments: Option<&'a dyn ArgumentProvider>,
}

impl Lowering<'_> {
    /// Lowers the entries of `tree`, selected on `type_name`.
    ///
    /// With `abstract_order` (interface or union fields) `__typename` comes
    /// first, then fields, then inline fragments. Otherwise entries keep the
    /// tree's own order.
    fn selection_set<'t>(
        &self,
        type_name: &str,
        tree: &'t SelectionTree,
        abstract_order: bool,
        depth: usize,
    ) -> Outcome<SelectionSet<'t>> {
        if depth > RECURSION_LIMIT {
            tracing::error!("selection processing recursion limit({RECURSION_LIMIT}) exceeded");
            return Outcome::Fail(QueryBuilderError::RecursionLimitExceeded);
        }

        let mut set = SelectionSet::default();
        let mut fragments = Vec::new();
        if abstract_order && tree.get(TYPENAME).is_some_and(Selection::is_selected_leaf) {
            set.items.push(Item::Typename);
        }
        for (key, selection) in tree.iter() {
            let outcome = if key == TYPENAME {
                if abstract_order || !selection.is_selected_leaf() {
                    continue;
                }
                Outcome::Include(Lowered::Item(Item::Typename))
            } else if let Some(type_condition) =
                fragment_type(key).filter(|_| self.schema.field(type_name, key).is_none())
            {
                self.inline_fragment(type_name, type_condition, selection, depth)
            } else {
                self.field(type_name, key, selection, depth)
            };
            match outcome {
                Outcome::Include(Lowered::Item(item @ Item::InlineFragment { .. }))
                    if abstract_order =>
                {
                    fragments.push(item)
                }
                Outcome::Include(Lowered::Item(item)) => set.items.push(item),
                Outcome::Include(Lowered::Touched(item)) => set.touched.push(item),
                Outcome::Include(Lowered::Hollow) => set.hollow = true,
                Outcome::Skip => {}
                Outcome::Fail(error) => return Outcome::Fail(error),
            }
        }
        set.items.extend(fragments);
        Outcome::Include(set)
    }

    fn field<'t>(
        &self,
        parent_type: &str,
        name: &'t str,
        selection: &'t Selection,
        depth: usize,
    ) -> Outcome<Lowered<'t>> {
        let field = match classify_field(self.schema, parent_type, name) {
            Outcome::Include(field) => field,
            Outcome::Skip => {
                if selection != &Selection::Leaf(false) {
                    tracing::trace!(ty = parent_type, key = name, "no such field, skipping");
                }
                return Outcome::Skip;
            }
            Outcome::Fail(error) => return Outcome::Fail(error),
        };

        match selection {
            Selection::Leaf(false) => Outcome::Skip,
            Selection::Leaf(true) if field.kind.is_composite() => {
                tracing::trace!(
                    ty = parent_type,
                    key = name,
                    "composite field selected without a sub-selection, skipping"
                );
                Outcome::Skip
            }
            Selection::Leaf(true) => Outcome::Include(Lowered::Item(Item::Field {
                name,
                arguments: self.arguments(parent_type, field.definition),
                selection_set: None,
            })),
            Selection::Node(_) | Selection::Fragment(_) if !field.kind.is_composite() => {
                Outcome::Skip
            }
            Selection::Node(tree) | Selection::Fragment(tree) => {
                if tree.is_empty() {
                    return Outcome::Skip;
                }
                let abstract_order =
                    field.kind.is_abstract() || matches!(selection, Selection::Fragment(_));
                self.selection_set(field.named_type, tree, abstract_order, depth + 1)
                    .and_then(|set| {
                        set.lower(
                            |selection_set| Item::Field {
                                name,
                                arguments: self.arguments(parent_type, field.definition),
                                selection_set: Some(selection_set),
                            },
                            true,
                        )
                    })
            }
        }
    }

    fn inline_fragment<'t>(
        &self,
        parent_type: &str,
        type_condition: &'t str,
        selection: &'t Selection,
        depth: usize,
    ) -> Outcome<Lowered<'t>> {
        let Some(tree) = selection.as_tree() else {
            return Outcome::Skip;
        };
        let Some(kind) = self
            .schema
            .type_kind(type_condition)
            .filter(|_| self.schema.is_possible_type(parent_type, type_condition))
        else {
            tracing::trace!(
                ty = parent_type,
                type_condition,
                "fragment type cannot occur here, skipping"
            );
            return Outcome::Skip;
        };
        let abstract_order = kind.is_abstract() || matches!(selection, Selection::Fragment(_));
        self.selection_set(type_condition, tree, abstract_order, depth + 1)
            .and_then(|set| {
                set.lower(
                    |selection_set| Item::InlineFragment {
                        type_condition,
                        selection_set,
                    },
                    false,
                )
            })
    }

    fn arguments(&self, parent_type: &str, field: &FieldDefinition) -> Vec<(Name, Value)> {
        self.arguments
            .map(|provider| provider.arguments(self.schema, parent_type, field))
            .unwrap_or_default()
    }
}

impl fmt::Display for Operation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.keyword())?;
        if let Some(name) = self.name {
            write!(f, " {name}")?;
        }
        f.write_str(" ")?;
        format_selection_set(&self.selection_set, f)
    }
}

fn format_selection_set(selection_set: &[Item<'_>], f: &mut fmt::Formatter) -> fmt::Result {
    if selection_set.is_empty() {
        return f.write_str("{}");
    }
    f.write_str("{ ")?;
    for item in selection_set {
        format_item(item, f)?;
        f.write_str(" ")?;
    }
    f.write_str("}")
}

fn format_item(item: &Item<'_>, f: &mut fmt::Formatter) -> fmt::Result {
    match item {
        Item::Typename => f.write_str(TYPENAME),
        Item::Field {
            name,
            arguments,
            selection_set,
        } => {
            f.write_str(name)?;
            format_arguments(arguments, f)?;
            if let Some(selection_set) = selection_set {
                f.write_str(" ")?;
                format_selection_set(selection_set, f)?;
            }
            Ok(())
        }
        Item::InlineFragment {
            type_condition,
            selection_set,
        } => {
            write!(f, "... on {type_condition} ")?;
            format_selection_set(selection_set, f)
        }
    }
}

fn format_arguments(arguments: &[(Name, Value)], f: &mut fmt::Formatter) -> fmt::Result {
    if arguments.is_empty() {
        return Ok(());
    }
    f.write_str("(")?;
    for (index, (name, value)) in arguments.iter().enumerate() {
        if index != 0 {
            f.write_str(", ")?;
        }
        write!(f, "{name}: {value}")?;
    }
    f.write_str(")")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const SCHEMA: &str = r#"
        type Query { user: User node(id: ID!): Node }
        type Mutation { createUser(name: String!): User }
        interface Node { id: ID! }
        type User implements Node { id: ID! name: String! }
    "#;

    fn serialize(tree: serde_json::Value, options: &Options) -> Result<String, QueryBuilderError> {
        let schema = Schema::parse(SCHEMA).unwrap();
        let tree = SelectionTree::try_from(tree).unwrap();
        serialize_operation(&schema, &tree, options)
    }

    #[test]
    fn writes_single_line_operations() {
        let query = serialize(
            json!({ "user": { "id": true, "name": true } }),
            &Options::default(),
        )
        .unwrap();
        assert_eq!(query, "query { user { id name } }");
    }

    #[test]
    fn empty_operation_drops_the_name() {
        let options = Options::default().with_operation_name("Empty");
        assert_eq!(serialize(json!({}), &options).unwrap(), "query {}");
    }

    #[test]
    fn arguments_come_from_the_provider() {
        let options = Options {
            required_arguments: RequiredArguments::Placeholder,
            ..Options::new(OperationKind::Mutation)
        };
        let query = serialize(json!({ "createUser": { "id": true } }), &options).unwrap();
        assert_eq!(query, r#"mutation { createUser(name: "") { id } }"#);
    }

    #[test]
    fn missing_root_is_an_operation_error() {
        let error = serialize(json!({}), &Options::new(OperationKind::Subscription)).unwrap_err();
        assert!(matches!(
            error,
            QueryBuilderError::Operation(OperationError::MissingRootType(
                OperationKind::Subscription
            ))
        ));
    }

    #[test]
    fn recursion_limit() {
        let schema = Schema::parse("type Query { me: Person } type Person { friend: Person name: String }")
            .unwrap();
        let mut tree = SelectionTree::new();
        tree.insert("name", Selection::Leaf(true));
        for _ in 0..=RECURSION_LIMIT {
            let mut parent = SelectionTree::new();
            parent.insert("friend", Selection::Node(tree));
            tree = parent;
        }
        let mut root = SelectionTree::new();
        root.insert("me", Selection::Node(tree));
        assert!(matches!(
            serialize_operation(&schema, &root, &Options::default()),
            Err(QueryBuilderError::RecursionLimitExceeded)
        ));
    }

    #[test]
    fn unselected_objects_next_to_selections_are_left_out() {
        let schema = Schema::parse(
            r#"
            type Query { me: Person posts: [Post] }
            type Person { name: String friend: Person best: Person }
            type Post { title: String author: Person }
            "#,
        )
        .unwrap();
        let options = Options::default();
        let mut tree = crate::generate_operation_tree(&schema, &options).unwrap();
        assert!(tree.select(&["me", "name"]));
        assert_eq!(
            serialize_operation(&schema, &tree, &options).unwrap(),
            "query { me { name } }"
        );

        let tree = SelectionTree::try_from(json!({
            "me": { "name": true, "friend": { "name": false } },
            "posts": { "author": { "name": false } },
        }))
        .unwrap();
        assert_eq!(
            serialize_operation(&schema, &tree, &options).unwrap(),
            "query { me { name } }"
        );
    }

    #[test]
    fn untouched_generated_tree_is_empty() {
        let schema = Schema::parse(
            "type Query { me: Person } type Person { name: String friend: Person }",
        )
        .unwrap();
        let options = Options::default();
        let tree = crate::generate_operation_tree(&schema, &options).unwrap();
        assert_eq!(serialize_operation(&schema, &tree, &options).unwrap(), "query {}");
    }

    #[test]
    fn fields_named_like_fragment_keys() {
        let schema =
            Schema::parse("type Query { product: Product } type Product { id: ID! on_sale: Boolean }")
                .unwrap();
        let options = Options::default();
        let mut tree = crate::generate_operation_tree(&schema, &options).unwrap();
        assert!(tree.select(&["product", "on_sale"]));
        assert_eq!(
            serialize_operation(&schema, &tree, &options).unwrap(),
            "query { product { on_sale } }"
        );
    }

    #[test]
    fn fragments_need_a_possible_type() {
        let schema = Schema::parse(
            r#"
            type Query { user: User node: Node }
            interface Node { id: ID! }
            type User implements Node { id: ID! name: String }
            type Post { title: String }
            "#,
        )
        .unwrap();
        let tree = SelectionTree::try_from(json!({
            "user": { "id": true, "on_Post": { "title": true }, "on_User": { "name": true } },
            "node": { "on_Post": { "title": true }, "on_User": { "name": true } },
        }))
        .unwrap();
        assert_eq!(
            serialize_operation(&schema, &tree, &Options::default()).unwrap(),
            "query { user { id ... on User { name } } node { ... on User { name } } }"
        );
    }
}
