//! Cypher function wrappers: `count(...)`, `exists(...)`, boolean joins.

use super::clauses::Term;
use super::entities::ParamMap;
use super::literal::{RenderContext, RenderMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuncKind {
    Count,
    Exists,
    Labels,
    Group,
    And,
    Or,
    Not,
    IsNull,
    IsNotNull,
}

impl FuncKind {
    pub fn name(self) -> &'static str {
        match self {
            FuncKind::Count => "count",
            FuncKind::Exists => "exists",
            FuncKind::Labels => "labels",
            FuncKind::Group => "group",
            FuncKind::And => "And",
            FuncKind::Or => "Or",
            FuncKind::Not => "Not",
            FuncKind::IsNull => "is_null",
            FuncKind::IsNotNull => "is_not_null",
        }
    }

    /// Context the wrapped arguments render in.
    fn context(self) -> RenderContext {
        match self {
            FuncKind::And | FuncKind::Or | FuncKind::Not => RenderContext::Condition,
            _ => RenderContext::Return,
        }
    }

    fn joiner(self) -> &'static str {
        match self {
            FuncKind::And => " AND ",
            FuncKind::Or => " OR ",
            FuncKind::Group => " ",
            _ => ",",
        }
    }

    fn wrap(self, slot: &str) -> String {
        match self {
            FuncKind::Count => format!("count({})", slot),
            FuncKind::Exists => format!("exists({})", slot),
            FuncKind::Labels => format!("labels({})", slot),
            FuncKind::Group => format!("({})", slot),
            FuncKind::And | FuncKind::Or => slot.to_string(),
            FuncKind::Not => format!("NOT {}", slot),
            FuncKind::IsNull => format!("{} IS NULL", slot),
            FuncKind::IsNotNull => format!("{} IS NOT NULL", slot),
        }
    }
}

/// A function applied to one or more terms, optionally returned under an alias.
#[derive(Debug, Clone, PartialEq)]
pub struct Func {
    kind: FuncKind,
    args: Vec<Term>,
    alias: Option<String>,
}

impl Func {
    pub fn new(kind: FuncKind, args: Vec<Term>) -> Self {
        Func {
            kind,
            args,
            alias: None,
        }
    }

    pub fn count(arg: impl Into<Term>) -> Self {
        Self::new(FuncKind::Count, vec![arg.into()])
    }

    pub fn exists(arg: impl Into<Term>) -> Self {
        Self::new(FuncKind::Exists, vec![arg.into()])
    }

    pub fn labels(arg: impl Into<Term>) -> Self {
        Self::new(FuncKind::Labels, vec![arg.into()])
    }

    pub fn group(arg: impl Into<Term>) -> Self {
        Self::new(FuncKind::Group, vec![arg.into()])
    }

    pub fn and(args: Vec<Term>) -> Self {
        Self::new(FuncKind::And, args)
    }

    pub fn or(args: Vec<Term>) -> Self {
        Self::new(FuncKind::Or, args)
    }

    pub fn not(arg: impl Into<Term>) -> Self {
        Self::new(FuncKind::Not, vec![arg.into()])
    }

    pub fn is_null(arg: impl Into<Term>) -> Self {
        Self::new(FuncKind::IsNull, vec![arg.into()])
    }

    pub fn is_not_null(arg: impl Into<Term>) -> Self {
        Self::new(FuncKind::IsNotNull, vec![arg.into()])
    }

    pub fn kind(&self) -> FuncKind {
        self.kind
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn render(&self, mode: RenderMode) -> String {
        let context = self.kind.context();
        let slot = self
            .args
            .iter()
            .flat_map(|a| a.render(context, mode))
            .collect::<Vec<_>>()
            .join(self.kind.joiner());
        let text = self.kind.wrap(&slot);
        match &self.alias {
            Some(alias) => format!("{} as {}", text, alias),
            None => text,
        }
    }

    pub fn collect_params(&self, params: &mut ParamMap) {
        let context = self.kind.context();
        for arg in &self.args {
            arg.collect_params(context, params);
        }
    }
}
