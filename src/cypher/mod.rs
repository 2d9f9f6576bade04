//! Cypher AST: entities, path algebra, clauses and statements.

pub mod clauses;
pub mod entities;
pub mod errors;
pub mod functions;
pub mod literal;
pub mod path;
pub mod statement;

pub use clauses::{BoolOp, Clause, RemoveItem, Term};
pub use entities::{
    anon, as_alias, plain, plain_var, var_only, Direction, Entity, JoinHint, Node, ParamMap,
    Property, Relationship, Triple, VarContext,
};
pub use errors::PathError;
pub use functions::{Func, FuncKind};
pub use literal::{format_literal, RenderContext, RenderMode};
pub use path::Path;
pub use statement::{Statement, StatementRunner};
