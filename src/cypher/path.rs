//! Path algebra: stitching nodes, relationships, triples and paths into one
//! or more connected patterns.

use std::collections::VecDeque;

use super::entities::{Direction, Entity, Node, ParamMap, Property, Relationship, Triple, VarContext};
use super::errors::PathError;
use super::literal::RenderMode;

/// An ordered list of triples forming one or more connected fragments.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    var: String,
    triples: Vec<Triple>,
}

/// Entities consumed but not yet turned into a triple.
enum Scratch {
    Empty,
    Node(Node),
    NodeRel(Node, Relationship),
    Rel(Relationship),
}

fn shares_endpoint(s: &Triple, t: &Triple) -> bool {
    s.nodes()
        .iter()
        .any(|a| t.nodes().iter().any(|b| a.same_endpoint(b)))
}

fn invalid(entity: Entity, position: usize) -> PathError {
    PathError::InvalidArgument {
        entity: entity.to_string(),
        position,
    }
}

struct PathBuilder {
    triples: Vec<Triple>,
    /// Node a following `Relationship, Node` pair continues from. `None` when
    /// the last appended fragment has no single end.
    tail: Option<Node>,
}

impl PathBuilder {
    fn append(&mut self, fragment: Vec<Triple>, position: usize) -> Result<(), PathError> {
        if let Some(last) = self.triples.last() {
            let touches = fragment
                .iter()
                .any(|t| last.same_as(t) || shares_endpoint(last, t));
            if !touches {
                return Err(PathError::NoOverlap { position });
            }
        }
        for t in fragment {
            if !self.triples.iter().any(|x| x.same_as(&t)) {
                self.triples.push(t);
            }
        }
        Ok(())
    }

    fn fragment_tail(fragment: &[Triple]) -> Option<Node> {
        match fragment {
            [only] => Some(only.to_node().clone()),
            _ => None,
        }
    }

    fn append_fragment(&mut self, fragment: Vec<Triple>, position: usize) -> Result<(), PathError> {
        let tail = Self::fragment_tail(&fragment);
        self.append(fragment, position)?;
        self.tail = tail;
        Ok(())
    }

    fn append_relation(
        &mut self,
        r: &Relationship,
        from: &Node,
        to: &Node,
        position: usize,
    ) -> Result<(), PathError> {
        self.append(vec![r.relate(from, to)], position)?;
        self.tail = Some(to.clone());
        Ok(())
    }

    /// Connect the previous fragment to `fragment` through `r`, using the
    /// relationship's join hints to pick both endpoints.
    fn join(
        &mut self,
        r: Relationship,
        fragment: Vec<Triple>,
        position: usize,
    ) -> Result<(), PathError> {
        let rel_position = position - 1;
        let Some(hint) = r.join() else {
            return Err(PathError::AmbiguousEnds {
                position: rel_position,
            });
        };
        let left = self.triples.last().and_then(|last| {
            last.nodes()
                .into_iter()
                .find(|n| n.label() == Some(hint.from_label.as_str()))
                .cloned()
        });
        let right = fragment
            .iter()
            .flat_map(|t| t.nodes())
            .find(|n| n.label() == Some(hint.to_label.as_str()))
            .cloned();
        match (left, right) {
            (Some(left), Some(right)) => {
                self.append(vec![r.relate(&left, &right)], position)?;
                self.append_fragment(fragment, position)
            }
            _ => Err(PathError::JoinEndpointsNotFound {
                position: rel_position,
            }),
        }
    }

    fn step(&mut self, scratch: Scratch, entity: Entity, position: usize) -> Result<Scratch, PathError> {
        match (scratch, entity) {
            (Scratch::Empty, Entity::Node(n)) => Ok(Scratch::Node(n)),
            (Scratch::Empty, Entity::Relationship(r)) => {
                if self.triples.is_empty() {
                    Err(invalid(Entity::Relationship(r), position))
                } else {
                    Ok(Scratch::Rel(r))
                }
            }
            (Scratch::Empty, Entity::Triple(t)) => {
                self.append_fragment(vec![t], position)?;
                Ok(Scratch::Empty)
            }
            (Scratch::Empty, Entity::Path(g)) => {
                self.append_fragment(g.triples, position)?;
                Ok(Scratch::Empty)
            }
            (Scratch::Node(n), Entity::Relationship(r)) => Ok(Scratch::NodeRel(n, r)),
            (Scratch::NodeRel(n, r), Entity::Node(m)) => {
                self.append_relation(&r, &n, &m, position)?;
                Ok(Scratch::Empty)
            }
            (Scratch::NodeRel(n, r), Entity::Triple(t)) => {
                self.append(vec![r.relate(&n, t.from_node())], position)?;
                self.append_fragment(vec![t], position)?;
                Ok(Scratch::Empty)
            }
            (Scratch::NodeRel(n, r), Entity::Path(g)) => {
                let [first] = g.triples.as_slice() else {
                    return Err(PathError::AmbiguousToNode { position });
                };
                self.append(vec![r.relate(&n, first.from_node())], position)?;
                self.append_fragment(g.triples, position)?;
                Ok(Scratch::Empty)
            }
            (Scratch::Rel(r), Entity::Node(m)) => {
                let Some(from) = self.tail.clone() else {
                    return Err(PathError::AmbiguousFromNode { position });
                };
                self.append_relation(&r, &from, &m, position)?;
                Ok(Scratch::Empty)
            }
            (Scratch::Rel(r), Entity::Triple(t)) => {
                self.join(r, vec![t], position)?;
                Ok(Scratch::Empty)
            }
            (Scratch::Rel(r), Entity::Path(g)) => {
                self.join(r, g.triples, position)?;
                Ok(Scratch::Empty)
            }
            (_, entity) => Err(invalid(entity, position)),
        }
    }
}

/// One element of a rendered walk.
enum Step<'a> {
    Node(&'a Node),
    Edge(&'a Relationship, Direction),
}

impl Path {
    /// Consume a flat sequence of entities. Legal shapes are
    /// `Node, Relationship, Node`, a `Relationship, Node` continuation from
    /// the previous end, and ready triples or paths that share an endpoint
    /// with what came before.
    pub fn new(ctx: &VarContext, args: Vec<Entity>) -> Result<Self, PathError> {
        let mut builder = PathBuilder {
            triples: Vec::new(),
            tail: None,
        };
        let mut scratch = Scratch::Empty;
        for (i, entity) in args.into_iter().enumerate() {
            scratch = builder.step(scratch, entity, i + 1)?;
        }
        if !matches!(scratch, Scratch::Empty) || builder.triples.is_empty() {
            return Err(PathError::IncompletePath);
        }
        Ok(Path {
            var: ctx.next_path_var(),
            triples: builder.triples,
        })
    }

    pub fn from_triples(ctx: &VarContext, triples: Vec<Triple>) -> Result<Self, PathError> {
        Self::new(ctx, triples.into_iter().map(Entity::Triple).collect())
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub(crate) fn map_triples(&self, f: impl Fn(Triple) -> Triple) -> Path {
        Path {
            var: self.var.clone(),
            triples: self.triples.iter().cloned().map(f).collect(),
        }
    }

    /// Distinct nodes in order of first appearance.
    pub fn nodes(&self) -> Vec<&Node> {
        let mut out: Vec<&Node> = Vec::new();
        for n in self.triples.iter().flat_map(|t| t.nodes()) {
            if !out.iter().any(|seen| seen.same_endpoint(n)) {
                out.push(n);
            }
        }
        out
    }

    pub fn edges(&self) -> Vec<&Relationship> {
        let mut out: Vec<&Relationship> = Vec::new();
        for r in self.triples.iter().map(Triple::edge) {
            if !out.iter().any(|seen| seen.var() == r.var()) {
                out.push(r);
            }
        }
        out
    }

    /// Attach `prop` to every copy of the first node labelled `label`.
    pub fn add_prop_to_node(&mut self, label: &str, prop: Property) -> bool {
        let Some(var) = self
            .nodes()
            .into_iter()
            .find(|n| n.label() == Some(label))
            .map(|n| n.var().to_string())
        else {
            return false;
        };
        for t in &mut self.triples {
            for n in t.nodes_mut() {
                if n.var() == var {
                    n.add_prop(prop.clone());
                }
            }
        }
        true
    }

    /// Attach `prop` to every copy of the first relationship of type `rel_type`.
    pub fn add_prop_to_edge(&mut self, rel_type: &str, prop: Property) -> bool {
        let Some(var) = self
            .edges()
            .into_iter()
            .find(|r| r.rel_type() == Some(rel_type))
            .map(|r| r.var().to_string())
        else {
            return false;
        };
        for t in &mut self.triples {
            if t.edge().var() == var {
                t.edge_mut().add_prop(prop.clone());
            }
        }
        true
    }

    /// Group chained triples into walks; triples that touch neither end of
    /// the current walk start a new one.
    fn walks(&self) -> Vec<VecDeque<Step<'_>>> {
        let mut walks = Vec::new();
        let mut acc: VecDeque<Step<'_>> = VecDeque::new();
        for t in &self.triples {
            let (from, edge, to) = (t.from_node(), t.edge(), t.to_node());
            let ends = match (acc.front(), acc.back()) {
                (Some(Step::Node(first)), Some(Step::Node(last))) => Some((*first, *last)),
                _ => None,
            };
            match ends {
                None => {
                    acc.extend([
                        Step::Node(from),
                        Step::Edge(edge, Direction::Right),
                        Step::Node(to),
                    ]);
                }
                Some((first, _)) if from.same_endpoint(first) => {
                    acc.push_front(Step::Edge(edge, Direction::Left));
                    acc.push_front(Step::Node(to));
                }
                Some((_, last)) if from.same_endpoint(last) => {
                    acc.push_back(Step::Edge(edge, Direction::Right));
                    acc.push_back(Step::Node(to));
                }
                Some((first, _)) if to.same_endpoint(first) => {
                    acc.push_front(Step::Edge(edge, Direction::Right));
                    acc.push_front(Step::Node(from));
                }
                Some((_, last)) if to.same_endpoint(last) => {
                    acc.push_back(Step::Edge(edge, Direction::Left));
                    acc.push_back(Step::Node(from));
                }
                Some(_) => {
                    walks.push(std::mem::take(&mut acc));
                    acc.extend([
                        Step::Node(from),
                        Step::Edge(edge, Direction::Right),
                        Step::Node(to),
                    ]);
                }
            }
        }
        if !acc.is_empty() {
            walks.push(acc);
        }
        walks
    }

    pub fn pattern(&self, mode: RenderMode) -> String {
        self.walks()
            .iter()
            .map(|walk| {
                walk.iter()
                    .map(|step| match step {
                        Step::Node(n) => n.pattern(mode),
                        Step::Edge(r, dir) => dir.arrow(&r.pattern(mode)),
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn return_items(&self) -> Vec<String> {
        self.nodes().iter().filter_map(|n| n.return_item()).collect()
    }

    /// Values from every triple; a branch walk renders its own copy of a
    /// shared node.
    pub fn collect_params(&self, params: &mut ParamMap) {
        for t in &self.triples {
            t.collect_params(params);
        }
    }
}
