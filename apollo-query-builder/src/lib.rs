//! Derive selection trees from a GraphQL schema, and write a selection tree
//! back as an operation.
//!
//! ```
//! use apollo_query_builder::Options;
//!
//! let sdl = "type Query { user: User } type User { id: ID! name: String! }";
//! let mut tree = apollo_query_builder::generate(sdl, &Options::default()).unwrap();
//! tree.select(&["user", "id"]);
//! tree.select(&["user", "name"]);
//! let query = apollo_query_builder::serialize(sdl, &tree, &Options::default()).unwrap();
//! assert_eq!(query, "query { user { id name } }");
//! ```
//!
//! Interface and union fields are generated with one `on_<TypeName>` branch
//! per possible type, written out as inline fragments. Keys of a selection tree
//! that do not match the schema are ignored when serializing, so trees saved
//! against an older schema still produce an operation.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]
#![warn(
    rustdoc::broken_intra_doc_links,
    unreachable_pub,
    unreachable_patterns,
    unused,
    unused_qualifications,
    dead_code,
    while_true,
    unconditional_panic,
    clippy::all
)]

pub mod arguments;
mod builder;
pub mod cache;
pub mod error;
mod field_type;
mod generator;
mod options;
mod schema;
pub mod selection;
mod serializer;

pub use crate::builder::QueryBuilder;
pub use crate::builder::build;
pub use crate::builder::generate;
pub use crate::builder::serialize;
pub use crate::error::QueryBuilderError;
pub use crate::generator::generate_operation_tree;
pub use crate::generator::generate_selection_tree;
pub use crate::options::OperationKind;
pub use crate::options::Options;
pub use crate::options::RequiredArguments;
pub use crate::schema::Schema;
pub use crate::selection::Selection;
pub use crate::selection::SelectionTree;
pub use crate::serializer::serialize_operation;
