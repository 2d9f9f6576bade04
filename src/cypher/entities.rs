//! Property-graph entities: nodes, relationships, properties and triples.
//!
//! Every entity renders itself in three contexts (see [`RenderContext`]) and
//! the caller always states the [`RenderMode`]; nothing here holds global
//! render state. Variable names come from an explicit [`VarContext`].

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use super::errors::PathError;
use super::literal::{format_literal, RenderContext, RenderMode};
use super::path::Path;

/// Parameter name (a property variable) to bound value.
pub type ParamMap = BTreeMap<String, Value>;

/// Hands out per-type monotonic variable names (`n0`, `r0`, `p0`, ...).
///
/// Two constructions that start from fresh (or freshly reset) contexts number
/// their entities identically, which keeps rendered text comparable.
#[derive(Debug, Default)]
pub struct VarContext {
    nodes: Cell<usize>,
    relationships: Cell<usize>,
    properties: Cell<usize>,
    paths: Cell<usize>,
}

impl VarContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart every counter at zero.
    pub fn reset(&self) {
        for counter in [
            &self.nodes,
            &self.relationships,
            &self.properties,
            &self.paths,
        ] {
            counter.set(0);
        }
    }

    fn next(counter: &Cell<usize>, prefix: char) -> String {
        let n = counter.get();
        counter.set(n + 1);
        format!("{}{}", prefix, n)
    }

    pub(crate) fn next_path_var(&self) -> String {
        Self::next(&self.paths, 'g')
    }

    /// A labelled node.
    pub fn node(&self, label: &str) -> Node {
        Node::with_var(Self::next(&self.nodes, 'n'), Some(label.to_string()))
    }

    /// A node carrying only a variable.
    pub fn var_node(&self) -> Node {
        Node::with_var(Self::next(&self.nodes, 'n'), None)
    }

    /// A node that renders as `()`.
    pub fn anonymous_node(&self) -> Node {
        self.var_node().anon()
    }

    /// A labelled node holding one property per entry of a flattened record.
    pub fn node_with_props<I, K, V>(&self, label: &str, props: I) -> Node
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut node = self.node(label);
        for (handle, value) in props {
            let handle = handle.into();
            node.add_prop(self.property(&handle, Some(value.into())));
        }
        node
    }

    /// A typed relationship pointing left to right.
    pub fn relationship(&self, rel_type: &str) -> Relationship {
        Relationship::with_var(
            Self::next(&self.relationships, 'r'),
            Some(rel_type.to_string()),
        )
    }

    pub fn var_relationship(&self) -> Relationship {
        Relationship::with_var(Self::next(&self.relationships, 'r'), None)
    }

    /// A relationship that renders as `--`.
    pub fn anonymous_relationship(&self) -> Relationship {
        self.var_relationship().anon()
    }

    /// A property; a `None` value binds a variable without filtering on it.
    pub fn property(&self, handle: &str, value: Option<Value>) -> Property {
        Property {
            var: Self::next(&self.properties, 'p'),
            handle: handle.to_string(),
            value,
            alias: None,
            owner: None,
        }
    }

    /// Shorthand for a property with a value.
    pub fn prop(&self, handle: &str, value: impl Into<Value>) -> Property {
        self.property(handle, Some(value.into()))
    }

    /// Stitch entities into a connected [`Path`].
    pub fn path(&self, args: Vec<Entity>) -> Result<Path, PathError> {
        Path::new(self, args)
    }
}

/// Which way a relationship points when it relates two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Right,
    Left,
}

impl Direction {
    /// Order a pair so the first element is the triple's from-node.
    pub fn orient<T>(self, a: T, b: T) -> (T, T) {
        match self {
            Direction::Right => (a, b),
            Direction::Left => (b, a),
        }
    }

    /// Attach the arrow head to a rendered relationship pattern.
    pub fn arrow(self, rel_pattern: &str) -> String {
        match self {
            Direction::Right => format!("{}>", rel_pattern),
            Direction::Left => format!("<{}", rel_pattern),
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
        }
    }
}

/// Endpoint labels used to connect a relationship between two composite
/// fragments: `(from_label)` on the left fragment, `(to_label)` on the right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinHint {
    pub from_label: String,
    pub to_label: String,
}

fn render_props(props: &[Property], mode: RenderMode) -> String {
    let rendered: Vec<String> = props.iter().filter_map(|p| p.pattern(mode)).collect();
    if rendered.is_empty() {
        String::new()
    } else {
        format!(" {{{}}}", rendered.join(","))
    }
}

fn with_alias(var: &str, alias: Option<&str>) -> String {
    match alias {
        Some(alias) => format!("{} as {}", var, alias),
        None => var.to_string(),
    }
}

fn upsert_prop(props: &mut Vec<Property>, owner: &str, mut prop: Property) {
    prop.owner = Some(owner.to_string());
    match props.iter_mut().find(|p| p.handle == prop.handle) {
        Some(existing) => *existing = prop,
        None => props.push(prop),
    }
}

fn collect_props(props: &[Property], params: &mut ParamMap) {
    for prop in props {
        prop.collect_params(params);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    var: String,
    label: Option<String>,
    props: Vec<Property>,
    alias: Option<String>,
    anonymous: bool,
}

impl Node {
    fn with_var(var: String, label: Option<String>) -> Self {
        Node {
            var,
            label,
            props: Vec::new(),
            alias: None,
            anonymous: false,
        }
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    pub fn props(&self) -> &[Property] {
        &self.props
    }

    pub fn prop(&self, handle: &str) -> Option<&Property> {
        self.props.iter().find(|p| p.handle == handle)
    }

    /// Attach a property, replacing any property with the same handle.
    pub fn add_prop(&mut self, prop: Property) {
        upsert_prop(&mut self.props, &self.var, prop);
    }

    pub fn with_prop(mut self, prop: Property) -> Self {
        self.add_prop(prop);
        self
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn anon(mut self) -> Self {
        self.anonymous = true;
        self
    }

    pub fn plain(mut self) -> Self {
        self.props.clear();
        self
    }

    pub fn var_only(mut self) -> Self {
        self.label = None;
        self
    }

    /// Endpoint identity used when stitching and when grouping walks.
    pub fn same_endpoint(&self, other: &Node) -> bool {
        self.var == other.var
    }

    /// `(self)-[r]->(m)`, honouring the relationship's direction.
    pub fn relate_to(&self, r: &Relationship, m: &Node) -> Triple {
        r.relate(self, m)
    }

    pub fn pattern(&self, mode: RenderMode) -> String {
        let props = render_props(&self.props, mode);
        let var = if self.anonymous { "" } else { self.var.as_str() };
        match &self.label {
            Some(label) => format!("({}:{}{})", var, label, props),
            None => format!("({}{})", var, props),
        }
    }

    pub fn conditions(&self, mode: RenderMode) -> Vec<String> {
        self.props.iter().filter_map(|p| p.condition(mode)).collect()
    }

    pub fn return_item(&self) -> Option<String> {
        if self.anonymous {
            return None;
        }
        Some(with_alias(&self.var, self.alias.as_deref()))
    }

    pub fn collect_params(&self, params: &mut ParamMap) {
        collect_props(&self.props, params);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    var: String,
    rel_type: Option<String>,
    props: Vec<Property>,
    alias: Option<String>,
    anonymous: bool,
    direction: Direction,
    join: Option<JoinHint>,
}

impl Relationship {
    fn with_var(var: String, rel_type: Option<String>) -> Self {
        Relationship {
            var,
            rel_type,
            props: Vec::new(),
            alias: None,
            anonymous: false,
            direction: Direction::Right,
            join: None,
        }
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    pub fn rel_type(&self) -> Option<&str> {
        self.rel_type.as_deref()
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn join(&self) -> Option<&JoinHint> {
        self.join.as_ref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    pub fn props(&self) -> &[Property] {
        &self.props
    }

    pub fn prop(&self, handle: &str) -> Option<&Property> {
        self.props.iter().find(|p| p.handle == handle)
    }

    pub fn add_prop(&mut self, prop: Property) {
        upsert_prop(&mut self.props, &self.var, prop);
    }

    pub fn with_prop(mut self, prop: Property) -> Self {
        self.add_prop(prop);
        self
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_join(mut self, from_label: &str, to_label: &str) -> Self {
        self.join = Some(JoinHint {
            from_label: from_label.to_string(),
            to_label: to_label.to_string(),
        });
        self
    }

    pub fn set_join(&mut self, join: Option<JoinHint>) {
        self.join = join;
    }

    pub fn anon(mut self) -> Self {
        self.anonymous = true;
        self
    }

    pub fn plain(mut self) -> Self {
        self.props.clear();
        self
    }

    pub fn var_only(mut self) -> Self {
        self.rel_type = None;
        self
    }

    /// Build the triple `n -> m`, or `m -> n` for a left-pointing relationship.
    pub fn relate(&self, n: &Node, m: &Node) -> Triple {
        let (from, to) = self.direction.orient(n, m);
        Triple::new(from.clone(), self.clone(), to.clone())
    }

    /// Rendered without the arrow head, e.g. `-[r0:has_a]-`.
    pub fn pattern(&self, mode: RenderMode) -> String {
        let props = render_props(&self.props, mode);
        if self.anonymous && self.rel_type.is_none() && props.is_empty() {
            return "--".to_string();
        }
        let var = if self.anonymous { "" } else { self.var.as_str() };
        match &self.rel_type {
            Some(rel_type) => format!("-[{}:{}{}]-", var, rel_type, props),
            None => format!("-[{}{}]-", var, props),
        }
    }

    pub fn conditions(&self, mode: RenderMode) -> Vec<String> {
        self.props.iter().filter_map(|p| p.condition(mode)).collect()
    }

    pub fn return_item(&self) -> Option<String> {
        if self.anonymous {
            return None;
        }
        Some(with_alias(&self.var, self.alias.as_deref()))
    }

    pub fn collect_params(&self, params: &mut ParamMap) {
        collect_props(&self.props, params);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    var: String,
    handle: String,
    value: Option<Value>,
    alias: Option<String>,
    owner: Option<String>,
}

impl Property {
    /// The parameter name this property binds to.
    pub fn var(&self) -> &str {
        &self.var
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref().filter(|v| !v.is_null())
    }

    /// Variable of the node or relationship this property belongs to.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        self
    }

    /// Point the property at an entity variable without attaching it.
    pub fn owned_by(mut self, owner_var: &str) -> Self {
        self.owner = Some(owner_var.to_string());
        self
    }

    pub fn plain(mut self) -> Self {
        self.value = None;
        self
    }

    fn value_text(&self, mode: RenderMode) -> Option<String> {
        let value = self.value()?;
        Some(match mode {
            RenderMode::Literal => format_literal(value),
            RenderMode::Parameterized => format!("${}", self.var),
        })
    }

    /// `handle:value`, or `None` when there is no value to match on.
    pub fn pattern(&self, mode: RenderMode) -> Option<String> {
        let value = self.value_text(mode)?;
        Some(format!("{}:{}", self.handle, value))
    }

    /// `owner.handle = value`
    pub fn condition(&self, mode: RenderMode) -> Option<String> {
        self.assignment(mode, "=")
    }

    /// `owner.handle <op> value`; SET uses `=` or `+=`.
    pub fn assignment(&self, mode: RenderMode, op: &str) -> Option<String> {
        let owner = self.owner.as_deref()?;
        let value = self.value_text(mode)?;
        Some(format!("{}.{} {} {}", owner, self.handle, op, value))
    }

    pub fn return_item(&self) -> Option<String> {
        let owner = self.owner.as_deref()?;
        Some(with_alias(
            &format!("{}.{}", owner, self.handle),
            self.alias.as_deref(),
        ))
    }

    pub fn collect_params(&self, params: &mut ParamMap) {
        if let Some(value) = self.value() {
            params.insert(self.var.clone(), value.clone());
        }
    }
}

/// `(from)-[edge]->(to)`: the atomic connected unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Triple {
    from: Node,
    edge: Relationship,
    to: Node,
}

impl Triple {
    pub fn new(from: Node, edge: Relationship, to: Node) -> Self {
        Triple { from, edge, to }
    }

    pub fn from_node(&self) -> &Node {
        &self.from
    }

    pub fn to_node(&self) -> &Node {
        &self.to
    }

    pub fn edge(&self) -> &Relationship {
        &self.edge
    }

    pub fn nodes(&self) -> [&Node; 2] {
        [&self.from, &self.to]
    }

    pub fn edges(&self) -> [&Relationship; 1] {
        [&self.edge]
    }

    pub(crate) fn nodes_mut(&mut self) -> [&mut Node; 2] {
        [&mut self.from, &mut self.to]
    }

    pub(crate) fn edge_mut(&mut self) -> &mut Relationship {
        &mut self.edge
    }

    pub(crate) fn map_parts(
        self,
        node: impl Fn(Node) -> Node,
        edge: impl Fn(Relationship) -> Relationship,
    ) -> Self {
        Triple {
            from: node(self.from),
            edge: edge(self.edge),
            to: node(self.to),
        }
    }

    pub fn same_as(&self, other: &Triple) -> bool {
        self.edge.var == other.edge.var
            && self.from.same_endpoint(&other.from)
            && self.to.same_endpoint(&other.to)
    }

    pub fn pattern(&self, mode: RenderMode) -> String {
        format!(
            "{}{}{}",
            self.from.pattern(mode),
            Direction::Right.arrow(&self.edge.pattern(mode)),
            self.to.pattern(mode)
        )
    }

    pub fn return_items(&self) -> Vec<String> {
        [
            self.from.return_item(),
            self.edge.return_item(),
            self.to.return_item(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub fn collect_params(&self, params: &mut ParamMap) {
        self.from.collect_params(params);
        self.edge.collect_params(params);
        self.to.collect_params(params);
    }

    /// Attach `prop` to the first endpoint labelled `label`.
    pub fn add_prop_to_node(&mut self, label: &str, prop: Property) -> bool {
        let Some(var) = self
            .nodes()
            .into_iter()
            .find(|n| n.label() == Some(label))
            .map(|n| n.var.clone())
        else {
            return false;
        };
        for n in self.nodes_mut() {
            if n.var == var {
                n.add_prop(prop.clone());
            }
        }
        true
    }

    pub fn add_prop_to_edge(&mut self, rel_type: &str, prop: Property) -> bool {
        if self.edge.rel_type() != Some(rel_type) {
            return false;
        }
        self.edge.add_prop(prop);
        true
    }
}

/// The closed set of AST entities.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Node(Node),
    Relationship(Relationship),
    Property(Property),
    Triple(Triple),
    Path(Path),
}

impl From<Node> for Entity {
    fn from(n: Node) -> Self {
        Entity::Node(n)
    }
}

impl From<Relationship> for Entity {
    fn from(r: Relationship) -> Self {
        Entity::Relationship(r)
    }
}

impl From<Property> for Entity {
    fn from(p: Property) -> Self {
        Entity::Property(p)
    }
}

impl From<Triple> for Entity {
    fn from(t: Triple) -> Self {
        Entity::Triple(t)
    }
}

impl From<Path> for Entity {
    fn from(g: Path) -> Self {
        Entity::Path(g)
    }
}

impl Entity {
    /// Render in the given context. Conditions of a node or relationship
    /// expand to one item per valued property.
    pub fn render(&self, context: RenderContext, mode: RenderMode) -> Vec<String> {
        match (self, context) {
            (Entity::Node(n), RenderContext::Pattern) => vec![n.pattern(mode)],
            (Entity::Node(n), RenderContext::Condition) => n.conditions(mode),
            (Entity::Node(n), RenderContext::Return) => n.return_item().into_iter().collect(),
            (Entity::Relationship(r), RenderContext::Pattern) => vec![r.pattern(mode)],
            (Entity::Relationship(r), RenderContext::Condition) => r.conditions(mode),
            (Entity::Relationship(r), RenderContext::Return) => {
                r.return_item().into_iter().collect()
            }
            (Entity::Property(p), RenderContext::Pattern) => p.pattern(mode).into_iter().collect(),
            (Entity::Property(p), RenderContext::Condition) => {
                p.condition(mode).into_iter().collect()
            }
            (Entity::Property(p), RenderContext::Return) => p.return_item().into_iter().collect(),
            (Entity::Triple(t), RenderContext::Return) => t.return_items(),
            (Entity::Triple(t), _) => vec![t.pattern(mode)],
            (Entity::Path(g), RenderContext::Return) => g.return_items(),
            (Entity::Path(g), _) => vec![g.pattern(mode)],
        }
    }

    /// Record every valued property this entity renders in a pattern or
    /// condition context.
    pub fn collect_params(&self, params: &mut ParamMap) {
        match self {
            Entity::Node(n) => n.collect_params(params),
            Entity::Relationship(r) => r.collect_params(params),
            Entity::Property(p) => p.collect_params(params),
            Entity::Triple(t) => t.collect_params(params),
            Entity::Path(g) => g.collect_params(params),
        }
    }

    /// Distinct member nodes of a composite, in order of first appearance.
    pub fn nodes(&self) -> Vec<&Node> {
        match self {
            Entity::Node(n) => vec![n],
            Entity::Triple(t) => t.nodes().to_vec(),
            Entity::Path(g) => g.nodes(),
            Entity::Relationship(_) | Entity::Property(_) => Vec::new(),
        }
    }

    pub fn edges(&self) -> Vec<&Relationship> {
        match self {
            Entity::Relationship(r) => vec![r],
            Entity::Triple(t) => t.edges().to_vec(),
            Entity::Path(g) => g.edges(),
            Entity::Node(_) | Entity::Property(_) => Vec::new(),
        }
    }

    /// Attach `prop` to the node labelled `label`, wherever it sits in
    /// this entity. Returns false when there is no such node.
    pub fn add_prop_to_node(&mut self, label: &str, prop: Property) -> bool {
        match self {
            Entity::Node(n) if n.label() == Some(label) => {
                n.add_prop(prop);
                true
            }
            Entity::Triple(t) => t.add_prop_to_node(label, prop),
            Entity::Path(g) => g.add_prop_to_node(label, prop),
            _ => false,
        }
    }

    pub fn add_prop_to_edge(&mut self, rel_type: &str, prop: Property) -> bool {
        match self {
            Entity::Relationship(r) if r.rel_type() == Some(rel_type) => {
                r.add_prop(prop);
                true
            }
            Entity::Triple(t) => t.add_prop_to_edge(rel_type, prop),
            Entity::Path(g) => g.add_prop_to_edge(rel_type, prop),
            _ => false,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Entity::Node(_) => "Node",
            Entity::Relationship(_) => "Relationship",
            Entity::Property(_) => "Property",
            Entity::Triple(_) => "Triple",
            Entity::Path(_) => "Path",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Entity::Property(p) => p.handle.clone(),
            other => other
                .render(RenderContext::Pattern, RenderMode::Literal)
                .join(", "),
        };
        write!(f, "{}({})", self.kind(), text)
    }
}

/// Copy of `entity` returned under `alias`. Triples and paths have no alias
/// of their own and come back unchanged.
pub fn as_alias(entity: &Entity, alias: &str) -> Entity {
    match entity {
        Entity::Node(n) => Entity::Node(n.clone().with_alias(alias)),
        Entity::Relationship(r) => Entity::Relationship(r.clone().with_alias(alias)),
        Entity::Property(p) => Entity::Property(p.clone().with_alias(alias)),
        other => other.clone(),
    }
}

/// Copy of `entity` with properties (or a property's value) removed.
pub fn plain(entity: &Entity) -> Entity {
    match entity {
        Entity::Node(n) => Entity::Node(n.clone().plain()),
        Entity::Relationship(r) => Entity::Relationship(r.clone().plain()),
        Entity::Property(p) => Entity::Property(p.clone().plain()),
        Entity::Triple(t) => Entity::Triple(t.clone().map_parts(Node::plain, Relationship::plain)),
        Entity::Path(g) => Entity::Path(g.map_triples(|t| t.map_parts(Node::plain, Relationship::plain))),
    }
}

/// Copy of `entity` that renders without its variable.
pub fn anon(entity: &Entity) -> Entity {
    match entity {
        Entity::Node(n) => Entity::Node(n.clone().anon()),
        Entity::Relationship(r) => Entity::Relationship(r.clone().anon()),
        other => other.clone(),
    }
}

/// Copy of `entity` without label or type. Inside a triple or path only the
/// endpoint labels go; edge types stay.
pub fn var_only(entity: &Entity) -> Entity {
    match entity {
        Entity::Node(n) => Entity::Node(n.clone().var_only()),
        Entity::Relationship(r) => Entity::Relationship(r.clone().var_only()),
        Entity::Triple(t) => Entity::Triple(t.clone().map_parts(Node::var_only, |r| r)),
        Entity::Path(g) => Entity::Path(g.map_triples(|t| t.map_parts(Node::var_only, |r| r))),
        other => other.clone(),
    }
}

pub fn plain_var(entity: &Entity) -> Entity {
    plain(&var_only(entity))
}
