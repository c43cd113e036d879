//! Field arguments written by the serializer.
//!
//! Selection trees only say which fields to select, never with which
//! arguments. An [`ArgumentProvider`] fills that gap when the operation must
//! be executable as-is.
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast::FloatValue;
use apollo_compiler::ast::IntValue;
use apollo_compiler::ast::InputValueDefinition;
use apollo_compiler::ast::Type;
use apollo_compiler::ast::Value;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::FieldDefinition;

use crate::schema::Schema;

const MAX_INPUT_DEPTH: usize = 32;

/// Supplies argument literals for a selected field.
pub trait ArgumentProvider: std::fmt::Debug + Send + Sync {
    /// Arguments to write for `field` of `parent_type`, in order.
    fn arguments(
        &self,
        schema: &Schema,
        parent_type: &str,
        field: &FieldDefinition,
    ) -> Vec<(Name, Value)>;
}

/// Writes a placeholder literal for every required argument: one that is
/// non-null and has no default value.
///
/// | type          | literal                          |
/// |---------------|----------------------------------|
/// | `Int`         | `0`                              |
/// | `Float`       | `0.0`                            |
/// | `Boolean`     | `false`                          |
/// | other scalars | `""`                             |
/// | enum          | first value                      |
/// | list          | `[]`                             |
/// | input object  | object of its required fields    |
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderArguments;

impl ArgumentProvider for PlaceholderArguments {
    fn arguments(
        &self,
        schema: &Schema,
        _parent_type: &str,
        field: &FieldDefinition,
    ) -> Vec<(Name, Value)> {
        field
            .arguments
            .iter()
            .filter(|argument| is_required(argument))
            .filter_map(|argument| {
                let value = placeholder(schema, &argument.ty, 0)?;
                Some((argument.name.clone(), value))
            })
            .collect()
    }
}

fn is_required(argument: &InputValueDefinition) -> bool {
    argument.ty.is_non_null() && argument.default_value.is_none()
}

fn placeholder(schema: &Schema, ty: &Type, depth: usize) -> Option<Value> {
    if depth > MAX_INPUT_DEPTH {
        return None;
    }
    if ty.is_list() {
        return Some(Value::List(Vec::new()));
    }
    let name = ty.inner_named_type();
    let value = match name.as_str() {
        "Int" => Value::Int(IntValue::new_parsed("0")),
        "Float" => Value::Float(FloatValue::new_parsed("0.0")),
        "Boolean" => Value::Boolean(false),
        "String" | "ID" => Value::String(String::new()),
        _ => match schema.definitions().types.get(name)? {
            ExtendedType::Scalar(_) => Value::String(String::new()),
            ExtendedType::Enum(enum_type) => Value::Enum(enum_type.values.keys().next()?.clone()),
            ExtendedType::InputObject(input_object) => Value::Object(
                input_object
                    .fields
                    .values()
                    .filter(|field| is_required(field))
                    .map(|field| {
                        let value = placeholder(schema, &field.ty, depth + 1)?;
                        Some((field.name.clone(), Node::new(value)))
                    })
                    .collect::<Option<_>>()?,
            ),
            _ => return None,
        },
    };
    Some(value)
}
