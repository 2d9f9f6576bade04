//! Compile request paths such as `/model/ICDC/nodes` into statements.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::engine::{Compiled, Engine};
use super::errors::CompileError;
use super::query_cache::{CacheMetrics, QueryCache};
use super::route_table::RouteTable;
use crate::config::CompilerConfig;
use crate::cypher::{ParamMap, Statement};

/// Owns a route table and the cache of its compiled routes.
#[derive(Debug)]
pub struct QueryCompiler {
    table: RouteTable,
    config: CompilerConfig,
    cache: QueryCache,
}

impl QueryCompiler {
    pub fn new(table: RouteTable, config: CompilerConfig) -> Self {
        let cache = QueryCache::new(config.cache.clone());
        QueryCompiler {
            table,
            config,
            cache,
        }
    }

    pub fn with_defaults(table: RouteTable) -> Self {
        Self::new(table, CompilerConfig::default())
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    fn engine(&self) -> Engine<'_> {
        Engine::new(&self.table)
            .with_params(self.config.use_params)
            .terminated(self.config.terminate)
    }

    /// Literal text embeds the values, so only parameterized compiles can be
    /// reused.
    fn caching(&self) -> bool {
        self.config.use_params && self.cache.is_enabled()
    }

    /// Compile one request path. A leading `/` is optional.
    pub fn compile(&self, path: &str) -> Result<Query, CompileError> {
        let path = path.strip_prefix('/').unwrap_or(path);
        let tokens: Vec<&str> = if path.is_empty() {
            Vec::new()
        } else {
            path.split('/').collect()
        };
        let engine = self.engine();

        if self.caching() {
            if let Some(hit) = engine
                .key_for(&tokens)
                .and_then(|key| self.cache.get(&key, path))
            {
                return Ok(Query::rebind(hit.compiled, &hit.captures));
            }
        }

        let compiled = engine.compile(&tokens).inspect_err(|e| {
            log::warn!("failed to compile '{}': {} ({})", path, e, e.offender());
        })?;
        let compiled = Arc::new(compiled);
        if self.caching() {
            self.cache.insert(Arc::clone(&compiled));
        }
        Ok(Query::fresh(compiled))
    }

    pub fn cache_metrics(&self) -> CacheMetrics {
        self.cache.metrics()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

/// A compiled request: a statement shared with every request on the same
/// route, plus this request's own parameter values.
#[derive(Debug, Clone)]
pub struct Query {
    compiled: Arc<Compiled>,
    params: ParamMap,
    cached: bool,
}

impl Query {
    fn fresh(compiled: Arc<Compiled>) -> Self {
        let params = compiled.statement.params().clone();
        Query {
            compiled,
            params,
            cached: false,
        }
    }

    /// Bind values captured from the request path, by route parameter name.
    fn rebind(compiled: Arc<Compiled>, captures: &[String]) -> Self {
        let mut params = compiled.statement.params().clone();
        for binding in &compiled.bindings {
            if let Some(value) = captures.get(binding.capture) {
                params.insert(binding.var.clone(), Value::String(value.clone()));
            }
        }
        Query {
            compiled,
            params,
            cached: true,
        }
    }

    pub fn statement(&self) -> &Statement {
        &self.compiled.statement
    }

    /// Keyed by property variable (`p0`, `p1`, ...), matching the
    /// placeholders in the statement text.
    pub fn params(&self) -> &ParamMap {
        &self.params
    }

    /// Value bound to a route parameter, e.g. `param("model")` for a
    /// `$model` segment.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.compiled
            .bindings
            .iter()
            .find(|b| b.name == name)
            .and_then(|b| self.params.get(&b.var))
    }

    pub fn path_id(&self) -> Option<&str> {
        self.compiled.path_id.as_deref()
    }

    pub fn key(&self) -> &str {
        &self.compiled.key
    }

    /// Whether this query reused a cached compile.
    pub fn from_cache(&self) -> bool {
        self.cached
    }

    /// Whether two queries share one compiled statement.
    pub fn shares_statement_with(&self, other: &Query) -> bool {
        Arc::ptr_eq(&self.compiled, &other.compiled)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.statement())
    }
}
