//! Compile URL-style request paths into Cypher statements using a
//! declarative route table.

pub mod engine;
pub mod errors;
pub mod function_registry;
pub mod query;
pub mod query_cache;
pub mod route_table;

pub use engine::{Binding, Compiled, Engine, PARAM_SEGMENT};
pub use errors::{CompileError, CompileErrorKind, Offender};
pub use query::{Query, QueryCompiler};
pub use query_cache::{CacheHit, CacheMetrics, QueryCache, QueryCacheConfig};
pub use route_table::{RouteTable, RouteTableError};
