//! Options shared by the generator and the serializer.
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::arguments::ArgumentProvider;
use crate::error::OperationError;

/// GraphQL operation type.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub enum OperationKind {
    #[default]
    Query,
    Mutation,
    Subscription,
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

impl OperationKind {
    /// The keyword that starts an operation of this kind.
    pub const fn keyword(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

impl FromStr for OperationKind {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(OperationKind::Query),
            "mutation" => Ok(OperationKind::Mutation),
            "subscription" => Ok(OperationKind::Subscription),
            other => Err(OperationError::Unsupported(other.to_string())),
        }
    }
}

impl From<OperationKind> for apollo_compiler::ast::OperationType {
    fn from(value: OperationKind) -> Self {
        match value {
            OperationKind::Query => apollo_compiler::ast::OperationType::Query,
            OperationKind::Mutation => apollo_compiler::ast::OperationType::Mutation,
            OperationKind::Subscription => apollo_compiler::ast::OperationType::Subscription,
        }
    }
}

/// How field arguments are filled in when serializing a selection tree.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RequiredArguments {
    /// Never emit arguments.
    #[default]
    Omit,
    /// Emit a placeholder literal for every required argument.
    Placeholder,
}

/// Options recognized by both the generator and the serializer.
///
/// Deserializes from camelCase keys, so the same document can be shared with
/// other tooling:
///
/// ```yaml
/// includeTypename: true
/// operationType: mutation
/// operationName: CreateNewUser
/// requiredArguments: placeholder
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Options {
    /// Generator: add a `__typename` leaf under every interface or union field.
    /// Serializer: emit `__typename` where the leaf is selected.
    pub include_typename: bool,
    /// Selects the root type of the operation.
    pub operation_type: OperationKind,
    /// Written after the operation keyword when set.
    pub operation_name: Option<String>,
    pub required_arguments: RequiredArguments,
    /// Takes precedence over `required_arguments` when set.
    #[serde(skip)]
    pub argument_provider: Option<Arc<dyn ArgumentProvider>>,
}

impl Options {
    pub fn new(operation_type: OperationKind) -> Self {
        Self {
            operation_type,
            ..Default::default()
        }
    }

    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    pub fn with_typename(mut self) -> Self {
        self.include_typename = true;
        self
    }

    pub fn with_argument_provider(mut self, provider: Arc<dyn ArgumentProvider>) -> Self {
        self.argument_provider = Some(provider);
        self
    }
}
