//! Functions a route table may name in a `_func` directive.

use std::collections::HashMap;

use crate::cypher::{Func, FuncKind, Term};

/// Look up a function by the name route tables use for it.
pub fn get_function(name: &str) -> Option<FuncKind> {
    FUNCTIONS.get(name).copied()
}

/// Wrap a single term in the function.
pub fn apply(kind: FuncKind, arg: Term) -> Func {
    Func::new(kind, vec![arg])
}

lazy_static::lazy_static! {
    static ref FUNCTIONS: HashMap<&'static str, FuncKind> = {
        let mut m = HashMap::new();
        for kind in [
            FuncKind::Count,
            FuncKind::Exists,
            FuncKind::Labels,
            FuncKind::Group,
            FuncKind::And,
            FuncKind::Or,
            FuncKind::Not,
            FuncKind::IsNull,
            FuncKind::IsNotNull,
        ] {
            m.insert(kind.name(), kind);
        }
        m
    };
}
