//! Statement assembly from entities, clauses and functions

use std::cell::RefCell;

use pathcypher::cypher::{
    Clause, Func, Node, ParamMap, Statement, StatementRunner, Triple, VarContext,
};
use pathcypher::terms;
use serde_json::json;

struct TermFixture {
    property: Node,
    term: Node,
    link: Triple,
}

fn term_fixture(ctx: &VarContext) -> TermFixture {
    let property = ctx
        .node("property")
        .with_prop(ctx.prop("handle", "disease_type"));
    let term = ctx.node_with_props("term", [("value", "Ewing's sarcoma"), ("origin", "NCIt")]);
    let link = ctx
        .relationship("has_term")
        .anon()
        .relate(&property.clone().plain(), &term.clone().plain());
    TermFixture {
        property,
        term,
        link,
    }
}

fn merge_term(f: &TermFixture) -> Vec<Clause> {
    vec![
        Clause::Match(terms![f.property.clone()]),
        Clause::Merge(terms![f.term.clone()]),
        Clause::Merge(terms![f.link.clone()]),
        Clause::Return(terms![f.term.clone()]),
    ]
}

#[test]
fn test_merge_term_parameterized() {
    let ctx = VarContext::new();
    let f = term_fixture(&ctx);
    let stmt = Statement::new(merge_term(&f)).with_params(true);

    assert_eq!(
        stmt.render(),
        "MATCH (n0:property {handle:$p0}) MERGE (n1:term {value:$p1,origin:$p2}) \
         MERGE (n0:property)-[:has_term]->(n1:term) RETURN n1"
    );
    let params = stmt.params();
    assert_eq!(params.len(), 3);
    assert_eq!(params["p0"], json!("disease_type"));
    assert_eq!(params["p1"], json!("Ewing's sarcoma"));
    assert_eq!(params["p2"], json!("NCIt"));
}

#[test]
fn test_merge_term_literal_escapes_quotes() {
    let ctx = VarContext::new();
    let f = term_fixture(&ctx);
    let stmt = Statement::new(merge_term(&f)).with_params(false).terminated(true);

    assert_eq!(
        stmt.to_string(),
        "MATCH (n0:property {handle:'disease_type'}) \
         MERGE (n1:term {value:'Ewing\\'s sarcoma',origin:'NCIt'}) \
         MERGE (n0:property)-[:has_term]->(n1:term) RETURN n1;"
    );
}

#[test]
fn test_condition_functions() {
    let ctx = VarContext::new();
    let f = term_fixture(&ctx);
    let origin = f.term.prop("origin").cloned().unwrap();

    let stmt = Statement::new(vec![
        Clause::Match(terms![f.term.clone().plain()]),
        Clause::where_any(terms![f.term.clone()]),
        Clause::Return(terms![Func::is_not_null(origin).with_alias("has_origin")]),
    ]);
    assert_eq!(
        stmt.render_with(pathcypher::cypher::RenderMode::Literal),
        "MATCH (n1:term) WHERE n1.value = 'Ewing\\'s sarcoma' OR n1.origin = 'NCIt' \
         RETURN n1.origin IS NOT NULL as has_origin"
    );

    let negated = Clause::Where {
        terms: terms![Func::not(Func::exists(f.property.prop("handle").cloned().unwrap()))],
        op: Default::default(),
    };
    assert_eq!(negated.to_string(), "WHERE NOT exists(n0.handle)");
}

/// Records what it was asked to run.
#[derive(Default)]
struct Recorder {
    calls: RefCell<Vec<(String, ParamMap)>>,
}

impl StatementRunner for Recorder {
    type Output = usize;
    type Error = String;

    fn run(&self, text: &str, params: &ParamMap) -> Result<usize, String> {
        self.calls.borrow_mut().push((text.to_string(), params.clone()));
        Ok(self.calls.borrow().len())
    }
}

#[test]
fn test_runner_receives_params_only_when_parameterized() {
    let ctx = VarContext::new();
    let f = term_fixture(&ctx);
    let recorder = Recorder::default();

    Statement::new(merge_term(&f))
        .with_params(true)
        .run_with(&recorder)
        .unwrap();
    Statement::new(merge_term(&f))
        .with_params(false)
        .run_with(&recorder)
        .unwrap();

    let calls = recorder.calls.borrow();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].0.contains("$p1"));
    assert_eq!(calls[0].1.len(), 3);
    assert!(calls[1].0.contains("'NCIt'"));
    assert!(calls[1].1.is_empty());
}
