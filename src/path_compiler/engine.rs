//! Interpreter that walks a request's tokens down a [`RouteTable`] and
//! builds one [`Statement`].
//!
//! Each token produces a new [`Walk`] from the previous one; nothing is
//! mutated behind the caller's back, and a failure leaves no partial result.

use crate::cypher::{
    as_alias, Clause, Entity, Node, Path, Property, Relationship, Statement, Term, VarContext,
};

use super::errors::{CompileError, CompileErrorKind, Offender};
use super::function_registry::apply;
use super::route_table::{
    EdgeSpec, FuncSpec, ItemSelector, Level, NodeSpec, PropSpec, ReturnSpec, RouteTable, Step,
};

/// Regex group that matches one parameter segment in a cache key.
pub const PARAM_SEGMENT: &str = "([a-zA-Z0-9_]+)";

/// Route parameter name bound to the property variable that carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub var: String,
    /// Index of the parameter segment among the key's capture groups.
    pub capture: usize,
}

/// The outcome of one successful compile.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub statement: Statement,
    /// Resolved route with parameter segments replaced by [`PARAM_SEGMENT`].
    pub key: String,
    /// In path order.
    pub bindings: Vec<Binding>,
    pub path_id: Option<String>,
}

/// State carried from one token to the next.
#[derive(Debug, Clone, Default)]
struct Walk {
    entity: Option<Entity>,
    key: Vec<String>,
    bindings: Vec<Binding>,
    /// Variable of the node introduced by `_node: _var`.
    var_node: Option<String>,
}

pub struct Engine<'a> {
    table: &'a RouteTable,
    use_params: bool,
    terminate: bool,
}

impl<'a> Engine<'a> {
    pub fn new(table: &'a RouteTable) -> Self {
        Engine {
            table,
            use_params: true,
            terminate: false,
        }
    }

    pub fn with_params(mut self, use_params: bool) -> Self {
        self.use_params = use_params;
        self
    }

    pub fn terminated(mut self, terminate: bool) -> Self {
        self.terminate = terminate;
        self
    }

    /// Compile a `/`-separated token list. Numbering starts fresh on every
    /// call, so equal routes yield equal text.
    pub fn compile(&self, tokens: &[&str]) -> Result<Compiled, CompileError> {
        let Some((&last, init)) = tokens.split_last() else {
            return Err(CompileError::new(
                CompileErrorKind::EmptyRequest,
                "No path tokens to compile",
                Offender::None,
            ));
        };
        let ctx = VarContext::new();
        let mut level: &Level = self.table.root();
        let mut walk = Walk::default();

        for &token in init {
            let (step, param) = resolve(level, token)?;
            walk = advance(&ctx, walk, token, step, param)?;
            level = &step.next;
        }

        let (step, param) = resolve(level, last)?;
        let walk = advance(&ctx, walk, last, step, param)?;
        let Some(ret) = &step.ret else {
            return Err(CompileError::token(
                CompileErrorKind::NoReturn,
                "Reached end of path, but found no _return spec",
                last,
            ));
        };
        self.finish(walk, ret, step.func.as_ref(), last)
    }

    /// The cache key a request resolves to, without building anything.
    pub fn key_for(&self, tokens: &[&str]) -> Option<String> {
        let mut level = self.table.root();
        let mut key = Vec::with_capacity(tokens.len());
        for token in tokens {
            let (step, param) = level.resolve(token)?;
            key.push(match param {
                Some(_) => PARAM_SEGMENT.to_string(),
                None => regex::escape(token),
            });
            level = &step.next;
        }
        Some(key.join("/"))
    }

    fn finish(
        &self,
        walk: Walk,
        ret: &ReturnSpec,
        step_func: Option<&FuncSpec>,
        token: &str,
    ) -> Result<Compiled, CompileError> {
        let Some(entity) = walk.entity else {
            return Err(CompileError::token(
                CompileErrorKind::NothingToReturn,
                "No entity to return",
                token,
            ));
        };

        let (items, func, path_id) = match ret {
            ReturnSpec::Items => (return_all(&entity), step_func, None),
            ReturnSpec::Named(name) => (return_named(&entity, name, token)?, step_func, None),
            ReturnSpec::Select {
                nodes,
                edges,
                func,
                path_id,
            } => {
                let func = func.as_ref().or(step_func);
                // a wrapped item is named by the function alias instead
                let items = select(&entity, nodes, edges, walk.var_node.as_deref(), func.is_none());
                if items.is_empty() {
                    return Err(CompileError::token(
                        CompileErrorKind::NothingToReturn,
                        "No named nodes or edges matching the path _return spec",
                        token,
                    ));
                }
                (items, func, path_id.clone())
            }
        };

        let items = match func {
            Some(spec) => items
                .into_iter()
                .map(|item| {
                    let f = apply(spec.kind, item);
                    Term::Func(match &spec.alias {
                        Some(alias) => f.with_alias(alias),
                        None => f,
                    })
                })
                .collect(),
            None => items,
        };

        let statement = Statement::new(vec![
            Clause::Match(vec![Term::Entity(entity)]),
            Clause::Return(items),
        ])
        .with_params(self.use_params)
        .terminated(self.terminate);

        Ok(Compiled {
            statement,
            key: walk.key.join("/"),
            bindings: walk.bindings,
            path_id,
        })
    }
}

fn resolve<'t>(level: &'t Level, token: &str) -> Result<(&'t Step, Option<&'t str>), CompileError> {
    match level.resolve(token) {
        Some((step, param)) => {
            log::debug!(
                "token '{}' resolved as {}",
                token,
                param.map_or_else(|| "literal".to_string(), |p| format!("${}", p))
            );
            Ok((step, param))
        }
        None => Err(CompileError::token(
            CompileErrorKind::TokenNotOnPath,
            format!("Token '{}' not on valid path", token),
            token,
        )),
    }
}

fn advance(
    ctx: &VarContext,
    walk: Walk,
    token: &str,
    step: &Step,
    param: Option<&str>,
) -> Result<Walk, CompileError> {
    let Walk {
        entity,
        mut key,
        mut bindings,
        mut var_node,
    } = walk;

    let prop = match (param, &step.prop) {
        (_, Some(spec)) => Some(build_prop(ctx, spec, Some(token))),
        (Some(name), None) => Some(ctx.prop(name, token)),
        (None, None) => None,
    };
    match param {
        Some(name) => {
            let capture = key.iter().filter(|seg| *seg == PARAM_SEGMENT).count();
            key.push(PARAM_SEGMENT.to_string());
            // a fixed `_value` does not come from the token
            let from_token = !matches!(step.prop, Some(PropSpec::Fixed { .. }));
            if let Some(p) = prop.as_ref().filter(|_| from_token) {
                bindings.push(Binding {
                    name: name.to_string(),
                    var: p.var().to_string(),
                    capture,
                });
            }
        }
        None => key.push(regex::escape(token)),
    }

    let entity = match prop {
        Some(prop) => Some(attach_prop(entity, prop, step, token)?),
        None => entity,
    };

    let new_entity = match &step.node {
        Some(spec) => {
            let built = build_node(ctx, spec, token)?;
            if matches!(spec, NodeSpec::Var) {
                var_node = built.nodes().first().map(|n| n.var().to_string());
            }
            Some(built)
        }
        None => None,
    };

    let entity = match &step.edge {
        Some(spec) => {
            let Some(incoming) = entity else {
                return Err(CompileError::token(
                    CompileErrorKind::NoIncomingEntity,
                    "No incoming entity to apply _edge to here",
                    token,
                ));
            };
            let Some(new_entity) = new_entity else {
                return Err(CompileError::token(
                    CompileErrorKind::NoNewEntity,
                    "No new entity to link to",
                    token,
                ));
            };
            Some(link(ctx, incoming, build_edge(ctx, spec), new_entity, token)?)
        }
        None => new_entity.or(entity),
    };

    Ok(Walk {
        entity,
        key,
        bindings,
        var_node,
    })
}

/// A plain node or relationship takes the property directly. A composite
/// needs the step to name the member by label or type.
fn attach_prop(
    entity: Option<Entity>,
    prop: Property,
    step: &Step,
    token: &str,
) -> Result<Entity, CompileError> {
    match entity {
        Some(Entity::Node(mut n)) => {
            n.add_prop(prop);
            Ok(Entity::Node(n))
        }
        Some(Entity::Relationship(mut r)) => {
            r.add_prop(prop);
            Ok(Entity::Relationship(r))
        }
        Some(mut composite) => {
            if step.node_selector.is_none() && step.edge_selector.is_none() {
                return Err(CompileError::token(
                    CompileErrorKind::AmbiguousPropTarget,
                    "Both _edge and _node must be defined here",
                    token,
                ));
            }
            if let Some(label) = &step.node_selector {
                if !composite.add_prop_to_node(label, prop.clone()) {
                    return Err(CompileError::token(
                        CompileErrorKind::NodeNotPresent,
                        "Node specified by _node is not present",
                        token,
                    ));
                }
            }
            if let Some(rel_type) = &step.edge_selector {
                if !composite.add_prop_to_edge(rel_type, prop) {
                    return Err(CompileError::token(
                        CompileErrorKind::EdgeNotPresent,
                        "Edge specified by _edge is not present",
                        token,
                    ));
                }
            }
            Ok(composite)
        }
        None => Err(CompileError::token(
            CompileErrorKind::NoIncomingEntity,
            "No incoming entity to attach the property to",
            token,
        )),
    }
}

fn build_prop(ctx: &VarContext, spec: &PropSpec, token: Option<&str>) -> Property {
    match spec {
        PropSpec::Handle(handle) => ctx.property(handle, token.map(Into::into)),
        PropSpec::Fixed { handle, value } => ctx.property(handle, Some(value.clone())),
    }
}

fn build_edge(ctx: &VarContext, spec: &EdgeSpec) -> Relationship {
    let mut r = ctx.relationship(&spec.rel_type).with_direction(spec.direction);
    r.set_join(spec.join.clone());
    r
}

fn build_node(ctx: &VarContext, spec: &NodeSpec, token: &str) -> Result<Entity, CompileError> {
    match spec {
        NodeSpec::Label(label) => Ok(Entity::Node(ctx.node(label))),
        NodeSpec::Var => Ok(Entity::Node(ctx.var_node())),
        NodeSpec::Block { label, prop, then } => {
            let mut node = ctx.node(label);
            if let Some(spec) = prop {
                node.add_prop(build_prop(ctx, spec, None));
            }
            match then {
                Some((edge, nested)) => {
                    let nested = build_node(ctx, nested, token)?;
                    link(ctx, Entity::Node(node), build_edge(ctx, edge), nested, token)
                }
                None => Ok(Entity::Node(node)),
            }
        }
    }
}

fn link(
    ctx: &VarContext,
    incoming: Entity,
    edge: Relationship,
    new_entity: Entity,
    token: &str,
) -> Result<Entity, CompileError> {
    match (incoming, new_entity) {
        (Entity::Node(n), Entity::Node(m)) => Ok(Entity::Triple(edge.relate(&n, &m))),
        (incoming, new_entity) => {
            Path::new(ctx, vec![incoming, Entity::Relationship(edge), new_entity])
                .map(Entity::Path)
                .map_err(|e| CompileError::unconnectable(e, token))
        }
    }
}

fn returnable(n: &Node) -> bool {
    !n.is_anonymous()
}

fn return_all(entity: &Entity) -> Vec<Term> {
    match entity {
        Entity::Node(_) | Entity::Relationship(_) => vec![Term::Entity(entity.clone())],
        composite => composite
            .nodes()
            .into_iter()
            .map(|n| Term::from(n.clone()))
            .collect(),
    }
}

fn return_named(entity: &Entity, name: &str, token: &str) -> Result<Vec<Term>, CompileError> {
    let mut items: Vec<Term> = entity
        .nodes()
        .into_iter()
        .filter(|n| returnable(n) && n.label() == Some(name))
        .map(|n| Term::from(n.clone()))
        .collect();
    if let Entity::Relationship(r) = entity {
        if !r.is_anonymous() && r.rel_type() == Some(name) {
            items.push(Term::from(r.clone()));
        }
    }
    if items.is_empty() {
        return Err(CompileError::token(
            CompileErrorKind::NothingToReturn,
            format!("No named node to return with label '{}'", name),
            token,
        ));
    }
    Ok(items)
}

fn aliased(entity: Entity, alias: Option<&str>, keep_alias: bool) -> Term {
    match alias {
        Some(alias) if keep_alias => Term::Entity(as_alias(&entity, alias)),
        _ => Term::Entity(entity),
    }
}

fn select(
    entity: &Entity,
    nodes: &[ItemSelector],
    edges: &[ItemSelector],
    var_node: Option<&str>,
    keep_alias: bool,
) -> Vec<Term> {
    let mut items = Vec::new();
    if nodes.iter().any(|s| s.name == "*") {
        items.push(Term::from("*"));
    } else if !nodes.is_empty() {
        for n in entity.nodes().into_iter().filter(|n| returnable(n)) {
            if let Some(sel) = nodes.iter().find(|s| n.label() == Some(s.name.as_str())) {
                items.push(aliased(Entity::Node(n.clone()), sel.alias.as_deref(), keep_alias));
            }
            if var_node == Some(n.var()) {
                if let Some(sel) = nodes.iter().find(|s| s.name == "_var") {
                    items.push(aliased(Entity::Node(n.clone()), sel.alias.as_deref(), keep_alias));
                }
            }
        }
    }
    for r in entity.edges().into_iter().filter(|r| !r.is_anonymous()) {
        if let Some(sel) = edges.iter().find(|s| r.rel_type() == Some(s.name.as_str())) {
            items.push(aliased(Entity::Relationship(r.clone()), sel.alias.as_deref(), keep_alias));
        }
    }
    items
}
