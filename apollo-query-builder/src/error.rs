//! Errors raised while building selection trees and operations.
use apollo_compiler::validation::DiagnosticList;
use apollo_compiler::validation::WithErrors;
use displaydoc::Display;
use thiserror::Error;

use crate::OperationKind;

/// Error returned by the query builder entry points.
#[derive(Debug, Error, Display, derive_more::From)]
#[non_exhaustive]
pub enum QueryBuilderError {
    /// invalid input: {0}
    InputType(InputTypeError),
    /// schema error: {0}
    Schema(SchemaError),
    /// operation error: {0}
    Operation(OperationError),
    /// selection processing recursion limit exceeded
    #[from(ignore)]
    RecursionLimitExceeded,
}

/// Caller-supplied data does not have the expected shape.
#[derive(Debug, Error, Display, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InputTypeError {
    /// selection tree must be an object, found {0}
    NotAnObject(&'static str),
    /// selection at `{path}` must be a boolean or an object, found {found}
    InvalidSelection { path: String, found: &'static str },
}

/// Error in the schema.
#[derive(Debug, Error, Display, derive_more::From)]
#[non_exhaustive]
pub enum SchemaError {
    /// GraphQL schema is invalid: {0}
    Invalid(SchemaDiagnostics),
    /// schema does not define a query root type
    #[from(ignore)]
    MissingQueryRoot,
    /// type `{0}` is not an object type with fields
    #[from(ignore)]
    InvalidRootType(String),
}

/// The requested operation cannot be built against this schema.
#[derive(Debug, Error, Display, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationError {
    /// unsupported operation type '{0}', expected one of query, mutation or subscription
    Unsupported(String),
    /// schema does not define a {0} root type
    MissingRootType(OperationKind),
}

/// Collection of schema parsing and validation diagnostics.
#[derive(Debug)]
pub struct SchemaDiagnostics {
    pub(crate) errors: DiagnosticList,
}

impl SchemaDiagnostics {
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl std::fmt::Display for SchemaDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut errors = self.errors.iter();
        for (i, error) in errors.by_ref().take(5).enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{error}")?;
        }
        let remaining = errors.count();
        if remaining > 0 {
            write!(f, "\n...and {remaining} other errors")?;
        }
        Ok(())
    }
}

impl<T> From<WithErrors<T>> for SchemaError {
    fn from(WithErrors { errors, .. }: WithErrors<T>) -> Self {
        SchemaError::Invalid(SchemaDiagnostics { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_errors_name_the_operation_type() {
        let error = OperationError::MissingRootType(OperationKind::Subscription);
        assert_eq!(
            error.to_string(),
            "schema does not define a subscription root type"
        );

        let error = QueryBuilderError::from(OperationError::Unsupported("fetch".to_string()));
        assert_eq!(
            error.to_string(),
            "operation error: unsupported operation type 'fetch', expected one of query, mutation or subscription"
        );
    }

    #[test]
    fn schema_diagnostics_are_truncated() {
        let sdl = (0..7)
            .map(|i| format!("type T{i} {{ field: Missing{i} }}"))
            .collect::<Vec<_>>()
            .join("\n");
        let schema = format!("type Query {{ a: Int }}\n{sdl}");
        let Err(error) = apollo_compiler::Schema::parse_and_validate(schema, "schema.graphql")
        else {
            panic!("schema should not validate");
        };
        let error = SchemaError::from(error);
        let SchemaError::Invalid(diagnostics) = &error else {
            panic!("expected diagnostics, got {error:?}");
        };
        assert!(diagnostics.len() >= 7);
        let expected = format!("...and {} other errors", diagnostics.len() - 5);
        assert!(error.to_string().ends_with(&expected));
    }
}
