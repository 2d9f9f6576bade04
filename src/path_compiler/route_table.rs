//! Route tables: nested maps of path segments to AST-building directives.
//!
//! A table is parsed once, up front, into a typed instruction tree. Every
//! malformed block is reported at load time, so compiling a request only has
//! to deal with the request itself.
//!
//! ```yaml
//! model:
//!   _node: model
//!   $model:
//!     _prop: handle
//!     nodes:
//!       _node: node
//!       _edge: { _type: has_node, _dir: _left }
//!       _return: _items
//! ```

use std::path::Path as FsPath;

use serde_json::{Map, Value};
use thiserror::Error;

use super::errors::{CompileError, CompileErrorKind};
use super::function_registry::get_function;
use crate::cypher::{Direction, FuncKind, JoinHint};

#[derive(Debug, Error)]
pub enum RouteTableError {
    #[error("Failed to read route table: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse route table YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse route table JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid route table: {0}")]
    Invalid(#[from] CompileError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropSpec {
    /// Property whose value is the current token.
    Handle(String),
    /// Property with a value fixed by the table.
    Fixed { handle: String, value: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSpec {
    pub rel_type: String,
    pub direction: Direction,
    pub join: Option<JoinHint>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeSpec {
    Label(String),
    /// An unlabelled node that `_return` can select as `_var`.
    Var,
    Block {
        label: String,
        prop: Option<PropSpec>,
        /// `(this)-[edge]->(node)`
        then: Option<(EdgeSpec, Box<NodeSpec>)>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncSpec {
    pub kind: FuncKind,
    pub alias: Option<String>,
}

/// `label`, `label@alias`, `*` or `_var`.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSelector {
    pub name: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReturnSpec {
    /// Return the entity itself, or every node of a composite.
    Items,
    /// Return the members labelled (or typed) with this name.
    Named(String),
    Select {
        nodes: Vec<ItemSelector>,
        edges: Vec<ItemSelector>,
        func: Option<FuncSpec>,
        path_id: Option<String>,
    },
}

/// Directives found at one route level.
///
/// On a literal level `node` and `edge` build new entities. On a `$param`
/// level they only name which member of the incoming entity receives the
/// bound property, and land in `node_selector` and `edge_selector`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Step {
    pub node: Option<NodeSpec>,
    pub edge: Option<EdgeSpec>,
    pub node_selector: Option<String>,
    pub edge_selector: Option<String>,
    pub prop: Option<PropSpec>,
    pub ret: Option<ReturnSpec>,
    pub func: Option<FuncSpec>,
    pub next: Level,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Level {
    literals: Vec<(String, Step)>,
    param: Option<(String, Box<Step>)>,
}

impl Level {
    /// Match a token against a literal segment first, then the parameter
    /// marker. Returns the step and, for a parameter match, its name.
    pub fn resolve(&self, token: &str) -> Option<(&Step, Option<&str>)> {
        if let Some((_, step)) = self.literals.iter().find(|(seg, _)| seg == token) {
            return Some((step, None));
        }
        self.param
            .as_ref()
            .map(|(name, step)| (step.as_ref(), Some(name.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty() && self.param.is_none()
    }

    fn children(&self) -> impl Iterator<Item = (String, &Step)> {
        self.literals
            .iter()
            .map(|(seg, step)| (seg.clone(), step))
            .chain(
                self.param
                    .iter()
                    .map(|(name, step)| (format!("${}", name), step.as_ref())),
            )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteTable {
    root: Level,
}

impl RouteTable {
    pub fn from_value(value: &Value) -> Result<Self, CompileError> {
        let value = match value.get("paths") {
            Some(inner) => inner,
            None => value,
        };
        let Value::Object(map) = value else {
            return Err(CompileError::block(
                CompileErrorKind::MalformedRouteTable,
                "Route table must be a map of path segments",
                value,
            ));
        };
        let table = RouteTable {
            root: parse_level(map)?,
        };
        log::debug!("Loaded route table with {} routes", table.routes().len());
        Ok(table)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, RouteTableError> {
        let value: Value = serde_yaml::from_str(text)?;
        Ok(Self::from_value(&value)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, RouteTableError> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value)?)
    }

    /// Load a `.json` file as JSON and anything else as YAML.
    pub fn from_file(path: impl AsRef<FsPath>) -> Result<Self, RouteTableError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        log::info!("Loading route table from {}", path.display());
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_yaml_str(&text),
        }
    }

    pub fn root(&self) -> &Level {
        &self.root
    }

    /// Every route that ends in a `_return`, with `$name` for parameter
    /// segments, in table order.
    pub fn routes(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_routes("", &self.root, &mut out);
        out
    }
}

fn collect_routes(prefix: &str, level: &Level, out: &mut Vec<String>) {
    for (segment, step) in level.children() {
        let route = format!("{}/{}", prefix, segment);
        if step.ret.is_some() {
            out.push(route.clone());
        }
        collect_routes(&route, &step.next, out);
    }
}

fn parse_level(map: &Map<String, Value>) -> Result<Level, CompileError> {
    let mut level = Level::default();
    for (key, value) in map {
        if key.starts_with('_') {
            continue;
        }
        if let Some(name) = key.strip_prefix('$') {
            if level.param.is_some() {
                return Err(CompileError::block(
                    CompileErrorKind::MalformedRouteTable,
                    format!("More than one parameter marker at this level ('{}')", key),
                    &Value::Object(map.clone()),
                ));
            }
            level.param = Some((name.to_string(), Box::new(parse_step(value, true)?)));
        } else {
            level.literals.push((key.clone(), parse_step(value, false)?));
        }
    }
    Ok(level)
}

fn parse_step(value: &Value, is_param: bool) -> Result<Step, CompileError> {
    let map = match value {
        Value::Object(map) => map,
        Value::Null => return Ok(Step::default()),
        other => {
            return Err(CompileError::block(
                CompileErrorKind::MalformedRouteTable,
                "Route level must be a map",
                other,
            ))
        }
    };

    let mut step = Step::default();
    for (key, block) in map.iter().filter(|(k, _)| k.starts_with('_')) {
        match key.as_str() {
            "_node" if is_param => {
                step.node_selector = Some(selector(block, CompileErrorKind::MalformedNode)?)
            }
            "_edge" if is_param => {
                step.edge_selector = Some(selector(block, CompileErrorKind::MalformedEdge)?)
            }
            "_node" => step.node = Some(parse_node(block)?),
            "_edge" => step.edge = Some(parse_edge(block)?),
            "_prop" => step.prop = Some(parse_prop(block)?),
            "_return" => step.ret = Some(parse_return(block)?),
            "_func" => step.func = Some(parse_func(block)?),
            other => log::warn!("Ignoring unknown route directive '{}'", other),
        }
    }
    step.next = parse_level(map)?;
    Ok(step)
}

fn selector(block: &Value, kind: CompileErrorKind) -> Result<String, CompileError> {
    match block.as_str() {
        Some(label) => Ok(label.to_string()),
        None => Err(CompileError::block(
            kind,
            "On a parameter level _node and _edge must name a label or type",
            block,
        )),
    }
}

fn non_empty_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn parse_node(block: &Value) -> Result<NodeSpec, CompileError> {
    match block {
        Value::String(s) if s == "_var" => Ok(NodeSpec::Var),
        Value::String(s) => Ok(NodeSpec::Label(s.clone())),
        Value::Object(map) => {
            let Some(label) = non_empty_str(map, "_label") else {
                return Err(CompileError::block(
                    CompileErrorKind::MalformedNode,
                    "_node block requires _label key",
                    block,
                ));
            };
            let prop = map.get("_prop").map(parse_prop).transpose()?;
            let then = match (map.get("_edge"), map.get("_node")) {
                (Some(edge), Some(node)) => {
                    Some((parse_edge(edge)?, Box::new(parse_node(node)?)))
                }
                _ => None,
            };
            Ok(NodeSpec::Block {
                label: label.to_string(),
                prop,
                then,
            })
        }
        other => Err(CompileError::block(
            CompileErrorKind::MalformedNode,
            "Can't process _node block",
            other,
        )),
    }
}

fn parse_edge(block: &Value) -> Result<EdgeSpec, CompileError> {
    let malformed = |description: &str| {
        CompileError::block(CompileErrorKind::MalformedEdge, description, block)
    };
    match block {
        Value::String(s) => Ok(EdgeSpec {
            rel_type: s.clone(),
            direction: Direction::Right,
            join: None,
        }),
        Value::Object(map) => {
            let Some(rel_type) = non_empty_str(map, "_type") else {
                return Err(malformed("_edge block requires _type key"));
            };
            let direction = match map.get("_dir").map(|d| d.as_str()) {
                None | Some(Some("_right")) => Direction::Right,
                Some(Some("_left")) => Direction::Left,
                Some(_) => return Err(malformed("_dir must be _right or _left")),
            };
            let join = match map.get("_join") {
                None => None,
                Some(Value::Array(pair)) => match pair.as_slice() {
                    [Value::String(from), Value::String(to)] => Some(JoinHint {
                        from_label: from.clone(),
                        to_label: to.clone(),
                    }),
                    _ => return Err(malformed("_join must list two node labels")),
                },
                Some(_) => return Err(malformed("_join must list two node labels")),
            };
            Ok(EdgeSpec {
                rel_type: rel_type.to_string(),
                direction,
                join,
            })
        }
        _ => Err(malformed("Can't process _edge block")),
    }
}

fn parse_prop(block: &Value) -> Result<PropSpec, CompileError> {
    match block {
        Value::String(s) => Ok(PropSpec::Handle(s.clone())),
        Value::Object(map) => match (non_empty_str(map, "_handle"), map.get("_value")) {
            (Some(handle), Some(value)) if !value.is_null() => Ok(PropSpec::Fixed {
                handle: handle.to_string(),
                value: value.clone(),
            }),
            _ => Err(CompileError::block(
                CompileErrorKind::MalformedProp,
                "Can't process _prop block",
                block,
            )),
        },
        other => Err(CompileError::block(
            CompileErrorKind::MalformedProp,
            "Can't process _prop block",
            other,
        )),
    }
}

fn parse_func(block: &Value) -> Result<FuncSpec, CompileError> {
    let Some(text) = block.as_str() else {
        return Err(CompileError::block(
            CompileErrorKind::MalformedFunc,
            "Block type other than simple string not yet handled for _func",
            block,
        ));
    };
    let ItemSelector { name, alias } = parse_selector(text);
    match get_function(&name) {
        Some(kind) => Ok(FuncSpec { kind, alias }),
        None => Err(CompileError::block(
            CompileErrorKind::UnknownFunction,
            format!("Sorry, no cypher function '{}' is currently defined", name),
            block,
        )),
    }
}

fn parse_selector(text: &str) -> ItemSelector {
    match text.split_once('@') {
        Some((name, alias)) => ItemSelector {
            name: name.to_string(),
            alias: Some(alias.to_string()),
        },
        None => ItemSelector {
            name: text.to_string(),
            alias: None,
        },
    }
}

fn parse_selectors(block: &Value, key: &str) -> Result<Vec<ItemSelector>, CompileError> {
    let Some(list) = block.get(key) else {
        return Ok(Vec::new());
    };
    let Value::Array(items) = list else {
        return Err(CompileError::block(
            CompileErrorKind::MalformedReturn,
            format!("{} key must point to a list", key),
            block,
        ));
    };
    items
        .iter()
        .map(|item| {
            item.as_str().map(parse_selector).ok_or_else(|| {
                CompileError::block(
                    CompileErrorKind::MalformedReturn,
                    format!("{} entries must be strings", key),
                    block,
                )
            })
        })
        .collect()
}

fn parse_return(block: &Value) -> Result<ReturnSpec, CompileError> {
    match block {
        Value::String(s) if s == "_items" => Ok(ReturnSpec::Items),
        Value::String(s) => Ok(ReturnSpec::Named(s.clone())),
        Value::Object(map) => Ok(ReturnSpec::Select {
            nodes: parse_selectors(block, "_nodes")?,
            edges: parse_selectors(block, "_edges")?,
            func: map.get("_func").map(parse_func).transpose()?,
            path_id: map.get("_path_id").and_then(Value::as_str).map(str::to_string),
        }),
        other => Err(CompileError::block(
            CompileErrorKind::MalformedReturn,
            "_return block must be _items, a label, or a map",
            other,
        )),
    }
}
