//! Entry points working from SDL text.
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::Options;
use crate::cache::SchemaCache;
use crate::error::QueryBuilderError;
use crate::generator::generate_operation_tree;
use crate::schema::Schema;
use crate::selection::SelectionTree;
use crate::serializer::serialize_operation;

/// Generates the all-unselected tree for the operation root of `sdl`.
pub fn generate(sdl: &str, options: &Options) -> Result<SelectionTree, QueryBuilderError> {
    let schema = Schema::parse(sdl)?;
    generate_operation_tree(&schema, options)
}

/// Writes the operation selected by `tree` against `sdl`.
pub fn serialize(
    sdl: &str,
    tree: &SelectionTree,
    options: &Options,
) -> Result<String, QueryBuilderError> {
    let schema = Schema::parse(sdl)?;
    serialize_operation(&schema, tree, options)
}

/// Generates the tree of `sdl`, lets `mutator` select fields in place and
/// writes the resulting operation.
pub fn build(
    sdl: &str,
    mutator: impl FnOnce(&mut SelectionTree),
    options: &Options,
) -> Result<String, QueryBuilderError> {
    let schema = Schema::parse(sdl)?;
    build_with_schema(&schema, mutator, options)
}

fn build_with_schema(
    schema: &Schema,
    mutator: impl FnOnce(&mut SelectionTree),
    options: &Options,
) -> Result<String, QueryBuilderError> {
    let mut tree = generate_operation_tree(schema, options)?;
    mutator(&mut tree);
    serialize_operation(schema, &tree, options)
}

/// Same entry points as the free functions, parsing each distinct SDL text
/// only once.
///
/// Cheap to share between threads: the schema cache is internally
/// synchronized.
#[derive(Debug, Default)]
pub struct QueryBuilder {
    schemas: SchemaCache,
}

impl QueryBuilder {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            schemas: SchemaCache::new(capacity),
        }
    }

    pub fn schema(&self, sdl: &str) -> Result<Arc<Schema>, QueryBuilderError> {
        Ok(self.schemas.get_or_parse(sdl)?)
    }

    pub fn generate(&self, sdl: &str, options: &Options) -> Result<SelectionTree, QueryBuilderError> {
        generate_operation_tree(&*self.schema(sdl)?, options)
    }

    pub fn serialize(
        &self,
        sdl: &str,
        tree: &SelectionTree,
        options: &Options,
    ) -> Result<String, QueryBuilderError> {
        serialize_operation(&*self.schema(sdl)?, tree, options)
    }

    /// Like [`QueryBuilder::serialize`], for a tree still in JSON form.
    pub fn serialize_json(
        &self,
        sdl: &str,
        tree: &serde_json::Value,
        options: &Options,
    ) -> Result<String, QueryBuilderError> {
        let tree = SelectionTree::try_from(tree)?;
        self.serialize(sdl, &tree, options)
    }

    pub fn build(
        &self,
        sdl: &str,
        mutator: impl FnOnce(&mut SelectionTree),
        options: &Options,
    ) -> Result<String, QueryBuilderError> {
        build_with_schema(&*self.schema(sdl)?, mutator, options)
    }
}
