//! Statement clauses and the terms they take.

use std::fmt;

use super::entities::{Entity, Node, ParamMap, Property, Relationship, Triple};
use super::functions::Func;
use super::literal::{RenderContext, RenderMode};
use super::path::Path;

/// Anything a clause or function can take as an argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Entity(Entity),
    Func(Func),
    /// Passed through verbatim, e.g. `*` or `this.that`.
    Raw(String),
}

impl Term {
    pub fn render(&self, context: RenderContext, mode: RenderMode) -> Vec<String> {
        match self {
            Term::Entity(e) => e.render(context, mode),
            Term::Func(f) => vec![f.render(mode)],
            Term::Raw(s) => vec![s.clone()],
        }
    }

    /// Collect the values this term renders as `$var` in `context`.
    pub fn collect_params(&self, context: RenderContext, params: &mut ParamMap) {
        match self {
            Term::Func(f) => f.collect_params(params),
            Term::Raw(_) => {}
            Term::Entity(_) if context == RenderContext::Return => {}
            // an unowned property renders no condition
            Term::Entity(Entity::Property(p))
                if context == RenderContext::Condition && p.owner().is_none() => {}
            Term::Entity(e) => e.collect_params(params),
        }
    }
}

impl From<Entity> for Term {
    fn from(e: Entity) -> Self {
        Term::Entity(e)
    }
}

impl From<Node> for Term {
    fn from(n: Node) -> Self {
        Term::Entity(Entity::Node(n))
    }
}

impl From<Relationship> for Term {
    fn from(r: Relationship) -> Self {
        Term::Entity(Entity::Relationship(r))
    }
}

impl From<Property> for Term {
    fn from(p: Property) -> Self {
        Term::Entity(Entity::Property(p))
    }
}

impl From<Triple> for Term {
    fn from(t: Triple) -> Self {
        Term::Entity(Entity::Triple(t))
    }
}

impl From<Path> for Term {
    fn from(g: Path) -> Self {
        Term::Entity(Entity::Path(g))
    }
}

impl From<Func> for Term {
    fn from(f: Func) -> Self {
        Term::Func(f)
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::Raw(s.to_string())
    }
}

impl From<String> for Term {
    fn from(s: String) -> Self {
        Term::Raw(s)
    }
}

/// Build a `Vec<Term>` from heterogeneous arguments.
#[macro_export]
macro_rules! terms {
    ($($t:expr),* $(,)?) => {
        vec![$($crate::cypher::Term::from($t)),*]
    };
}

/// Operator joining WHERE conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoolOp {
    #[default]
    And,
    Or,
}

impl BoolOp {
    fn joiner(self) -> &'static str {
        match self {
            BoolOp::And => " AND ",
            BoolOp::Or => " OR ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemoveItem {
    /// `REMOVE n0:Label`
    Label(String),
    /// `REMOVE n0.prop`
    Property(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Match(Vec<Term>),
    OptionalMatch(Vec<Term>),
    Create(Vec<Term>),
    Merge(Vec<Term>),
    Where { terms: Vec<Term>, op: BoolOp },
    /// `update` writes `+=` instead of `=`.
    Set { terms: Vec<Term>, update: bool },
    OnCreateSet(Vec<Term>),
    OnMatchSet(Vec<Term>),
    Remove { target: Term, item: RemoveItem },
    Return(Vec<Term>),
    With(Vec<Term>),
    Unwind(Vec<Term>),
    Raw(String),
}

fn join_rendered(terms: &[Term], context: RenderContext, mode: RenderMode, joiner: &str) -> String {
    terms
        .iter()
        .flat_map(|t| t.render(context, mode))
        .collect::<Vec<_>>()
        .join(joiner)
}

/// SET-family clauses only look at property arguments.
fn render_assignments(terms: &[Term], mode: RenderMode, op: &str) -> String {
    terms
        .iter()
        .filter_map(|t| match t {
            Term::Entity(Entity::Property(p)) => p.assignment(mode, op),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(", ")
}

impl Clause {
    pub fn where_all(terms: Vec<Term>) -> Self {
        Clause::Where {
            terms,
            op: BoolOp::And,
        }
    }

    pub fn where_any(terms: Vec<Term>) -> Self {
        Clause::Where {
            terms,
            op: BoolOp::Or,
        }
    }

    pub fn set(terms: Vec<Term>) -> Self {
        Clause::Set {
            terms,
            update: false,
        }
    }

    pub fn set_update(terms: Vec<Term>) -> Self {
        Clause::Set {
            terms,
            update: true,
        }
    }

    pub fn remove_label(target: impl Into<Term>, label: &str) -> Self {
        Clause::Remove {
            target: target.into(),
            item: RemoveItem::Label(label.to_string()),
        }
    }

    pub fn remove_prop(target: impl Into<Term>, handle: &str) -> Self {
        Clause::Remove {
            target: target.into(),
            item: RemoveItem::Property(handle.to_string()),
        }
    }

    pub fn render(&self, mode: RenderMode) -> String {
        match self {
            Clause::Match(terms) => {
                format!("MATCH {}", join_rendered(terms, RenderContext::Pattern, mode, ", "))
            }
            Clause::OptionalMatch(terms) => format!(
                "OPTIONAL MATCH {}",
                join_rendered(terms, RenderContext::Pattern, mode, ", ")
            ),
            Clause::Create(terms) => {
                format!("CREATE {}", join_rendered(terms, RenderContext::Pattern, mode, ", "))
            }
            Clause::Merge(terms) => {
                format!("MERGE {}", join_rendered(terms, RenderContext::Pattern, mode, ", "))
            }
            Clause::Where { terms, op } => format!(
                "WHERE {}",
                join_rendered(terms, RenderContext::Condition, mode, op.joiner())
            ),
            Clause::Set { terms, update } => {
                let op = if *update { "+=" } else { "=" };
                format!("SET {}", render_assignments(terms, mode, op))
            }
            Clause::OnCreateSet(terms) => {
                format!("ON CREATE SET {}", render_assignments(terms, mode, "="))
            }
            Clause::OnMatchSet(terms) => {
                format!("ON MATCH SET {}", render_assignments(terms, mode, "="))
            }
            Clause::Remove { target, item } => {
                let target = target
                    .render(RenderContext::Return, mode)
                    .into_iter()
                    .next()
                    .unwrap_or_default();
                match item {
                    RemoveItem::Label(label) => format!("REMOVE {}:{}", target, label),
                    RemoveItem::Property(handle) => format!("REMOVE {}.{}", target, handle),
                }
            }
            Clause::Return(terms) => {
                format!("RETURN {}", join_rendered(terms, RenderContext::Return, mode, ", "))
            }
            Clause::With(terms) => {
                format!("WITH {}", join_rendered(terms, RenderContext::Return, mode, ", "))
            }
            Clause::Unwind(terms) => {
                format!("UNWIND {}", join_rendered(terms, RenderContext::Return, mode, ", "))
            }
            Clause::Raw(text) => text.clone(),
        }
    }

    pub fn collect_params(&self, params: &mut ParamMap) {
        let (terms, context) = match self {
            Clause::Match(terms)
            | Clause::OptionalMatch(terms)
            | Clause::Create(terms)
            | Clause::Merge(terms) => (terms.as_slice(), RenderContext::Pattern),
            Clause::Where { terms, .. }
            | Clause::Set { terms, .. }
            | Clause::OnCreateSet(terms)
            | Clause::OnMatchSet(terms) => (terms.as_slice(), RenderContext::Condition),
            Clause::Return(terms) | Clause::With(terms) | Clause::Unwind(terms) => {
                (terms.as_slice(), RenderContext::Return)
            }
            Clause::Remove { .. } | Clause::Raw(_) => return,
        };
        let set_like = matches!(
            self,
            Clause::Set { .. } | Clause::OnCreateSet(_) | Clause::OnMatchSet(_)
        );
        for term in terms {
            if set_like && !matches!(term, Term::Entity(Entity::Property(_))) {
                continue;
            }
            term.collect_params(context, params);
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(RenderMode::Literal))
    }
}
