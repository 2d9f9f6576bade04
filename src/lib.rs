//! pathcypher - Cypher statements from an entity AST or from request paths
//!
//! This crate provides:
//! - A property-graph AST (nodes, relationships, properties, triples, paths)
//!   that renders Cypher patterns, conditions and return items
//! - Clauses, functions and statements with literal or `$parameter` rendering
//! - A compiler that turns URL-style paths into statements using a
//!   declarative route table, with a cache keyed by route structure

pub mod config;
pub mod cypher;
pub mod path_compiler;
pub mod utils;
