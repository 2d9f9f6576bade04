//! Compiling request paths against the shared route table

use pathcypher::config::CompilerConfig;
use pathcypher::path_compiler::{
    CompileErrorKind, Offender, QueryCompiler, RouteTable, RouteTableError,
};
use serde_json::json;
use test_case::test_case;

use super::fixtures::{compiler, compiler_with, table};

#[test]
fn test_routes_listing() {
    assert_eq!(
        table().routes(),
        vec![
            "/models",
            "/models/count",
            "/model/$model",
            "/model/$model/nodes",
            "/model/$model/nodes/count",
            "/model/$model/graph",
            "/model/$model/node/$handle",
            "/node/$handle/properties",
            "/tag/$key/$value",
            "/tag/$key/$value/entities",
            "/tag/$key/$value/entities/count",
            "/icdc",
        ]
    );
}

#[test_case("/models", "MATCH (n0:model) RETURN n0" ; "all models")]
#[test_case("/models/count", "MATCH (n0:model) RETURN count(*)" ; "count star")]
#[test_case("/model/ICDC", "MATCH (n0:model {handle:$p0}) RETURN n0" ; "one model")]
#[test_case(
    "/model/ICDC/nodes",
    "MATCH (n1:node)-[r0:has_node]->(n0:model {handle:$p0}) RETURN n1" ;
    "model nodes"
)]
#[test_case(
    "/model/ICDC/nodes/count",
    "MATCH (n1:node)-[r0:has_node]->(n0:model {handle:$p0}) RETURN count(n1) as n_count" ;
    "step function with alias"
)]
#[test_case(
    "/model/ICDC/graph",
    "MATCH (n1:node)-[r0:has_node]->(n0:model {handle:$p0}) RETURN n1, n0" ;
    "all items of a triple"
)]
#[test_case(
    "/model/ICDC/node/demographic",
    "MATCH (n1:node {handle:$p1})-[r0:has_node]->(n0:model {handle:$p0}) RETURN n1" ;
    "property placed by node selector"
)]
#[test_case(
    "/node/demographic/properties",
    "MATCH (n0:node {handle:$p0})-[r0:has_property]->(n1:property) RETURN n0 as owner, n1 as prop" ;
    "aliased selections"
)]
#[test_case(
    "/tag/Category/administrative",
    "MATCH (n0:tag {key:$p0,value:$p1}) RETURN n0" ;
    "two parameters on one node"
)]
#[test_case(
    "/tag/Category/administrative/entities",
    "MATCH (n1)-[r0:has_tag]->(n0:tag {key:$p0,value:$p1}) RETURN n1 as entity" ;
    "unlabelled node"
)]
#[test_case(
    "/tag/Category/administrative/entities/count",
    "MATCH (n1)-[r0:has_tag]->(n0:tag {key:$p0,value:$p1}) RETURN count(n1)" ;
    "count unlabelled node"
)]
#[test_case(
    "/icdc",
    "MATCH (n1:node)-[r0:has_node]->(n0:model {handle:$p0}) RETURN n1" ;
    "composite node block"
)]
fn test_compiled_text(path: &str, expected: &str) {
    let query = compiler().compile(path).unwrap();
    assert_eq!(query.to_string(), expected);
}

#[test]
fn test_params_and_path_id() {
    let qc = compiler();

    let query = qc.compile("/model/ICDC/nodes").unwrap();
    assert_eq!(query.path_id(), Some("model_nodes"));
    assert_eq!(query.param("model"), Some(&json!("ICDC")));
    assert_eq!(query.params()["p0"], json!("ICDC"));

    let query = qc.compile("/model/ICDC/node/demographic").unwrap();
    assert_eq!(query.path_id(), None);
    assert_eq!(query.param("model"), Some(&json!("ICDC")));
    assert_eq!(query.param("handle"), Some(&json!("demographic")));
    assert_eq!(query.params().len(), 2);

    let query = qc.compile("/tag/Category/administrative/entities").unwrap();
    assert_eq!(query.path_id(), Some("tag_entities"));
    assert_eq!(query.param("key"), Some(&json!("Category")));
    assert_eq!(query.param("value"), Some(&json!("administrative")));

    let query = qc.compile("/icdc").unwrap();
    assert_eq!(query.params()["p0"], json!("ICDC"));
    assert_eq!(query.param("model"), None);
}

#[test]
fn test_same_route_shares_one_compile() {
    let qc = compiler();

    let icdc = qc.compile("/model/ICDC/node/demographic").unwrap();
    let ctdc = qc.compile("/model/CTDC/node/diagnosis").unwrap();

    assert!(!icdc.from_cache());
    assert!(ctdc.from_cache());
    assert!(icdc.shares_statement_with(&ctdc));
    assert_eq!(icdc.key(), ctdc.key());
    assert_eq!(ctdc.param("model"), Some(&json!("CTDC")));
    assert_eq!(ctdc.param("handle"), Some(&json!("diagnosis")));
    assert_eq!(ctdc.params()["p0"], json!("CTDC"));
    assert_eq!(ctdc.params()["p1"], json!("diagnosis"));
    // the first request keeps its own values
    assert_eq!(icdc.params()["p1"], json!("demographic"));
}

#[test]
fn test_cache_covers_every_route() {
    let qc = compiler();
    let first = [
        "/models",
        "/models/count",
        "/model/ICDC",
        "/model/ICDC/nodes",
        "/model/ICDC/nodes/count",
        "/model/ICDC/graph",
        "/model/ICDC/node/demographic",
        "/node/demographic/properties",
        "/tag/Category/administrative",
        "/tag/Category/administrative/entities",
        "/tag/Category/administrative/entities/count",
        "/icdc",
    ];
    let second = [
        "/models",
        "/models/count",
        "/model/CTDC",
        "/model/CTDC/nodes",
        "/model/CTDC/nodes/count",
        "/model/CTDC/graph",
        "/model/CTDC/node/diagnosis",
        "/node/diagnosis/properties",
        "/tag/13/other",
        "/tag/13/other/entities",
        "/tag/13/other/entities/count",
        "/icdc",
    ];

    for path in first {
        assert!(!qc.compile(path).unwrap().from_cache(), "{}", path);
    }
    for (a, b) in first.iter().zip(second) {
        let earlier = qc.compile(a).unwrap();
        let hit = qc.compile(b).unwrap();
        assert!(hit.from_cache(), "{}", b);
        assert!(earlier.shares_statement_with(&hit), "{}", b);
    }

    let count = qc.compile("/tag/13/other/entities/count").unwrap();
    assert_eq!(count.params()["p0"], json!("13"));
    assert_eq!(count.params()["p1"], json!("other"));

    let metrics = qc.cache_metrics();
    assert_eq!(metrics.size, first.len());
    assert_eq!(metrics.evictions, 0);

    qc.clear_cache();
    assert!(!qc.compile("/models").unwrap().from_cache());
}

#[test]
fn test_value_outside_capture_class_recompiles() {
    let qc = compiler();
    qc.compile("/model/ICDC/nodes").unwrap();

    let odd = qc.compile("/model/IC-DC/nodes").unwrap();
    assert!(!odd.from_cache());
    assert_eq!(odd.param("model"), Some(&json!("IC-DC")));
}

#[test]
fn test_literal_rendering() {
    let qc = compiler_with(CompilerConfig {
        use_params: false,
        terminate: true,
        ..Default::default()
    });

    let query = qc.compile("/tag/Category/administrative/entities").unwrap();
    assert_eq!(
        query.to_string(),
        "MATCH (n1)-[r0:has_tag]->(n0:tag {key:'Category',value:'administrative'}) RETURN n1 as entity;"
    );
    assert_eq!(query.param("key"), Some(&json!("Category")));
    assert!(!qc.compile("/tag/Category/administrative/entities").unwrap().from_cache());
}

#[test_case("/bogus", CompileErrorKind::TokenNotOnPath ; "unknown first token")]
#[test_case("/model/ICDC/bogus", CompileErrorKind::TokenNotOnPath ; "unknown inner token")]
#[test_case("/model", CompileErrorKind::NoReturn ; "stops before a return")]
#[test_case("/model/ICDC/node", CompileErrorKind::NoReturn ; "stops before parameter")]
#[test_case("/", CompileErrorKind::EmptyRequest ; "empty request")]
fn test_request_errors(path: &str, kind: CompileErrorKind) {
    let qc = compiler();
    let err = qc.compile(path).unwrap_err();
    assert_eq!(err.kind(), kind);
    assert_eq!(qc.cache_metrics().size, 0);
}

#[test]
fn test_error_names_offending_token() {
    let err = compiler().compile("/model/ICDC/bogus").unwrap_err();
    assert_eq!(err.offender(), &Offender::Token("bogus".into()));
    assert_eq!(err.description(), "Token 'bogus' not on valid path");
}

const FAULTY_ROUTES: &str = r#"
orphan:
  _node: node
  _edge: has_node
  _return: _items
broken:
  _node: model
  _return: term
ambiguous:
  _node: model
  nodes:
    _node: node
    _edge: has_node
    $handle:
      _prop: handle
      _return: _items
misedge:
  _node: model
  nodes:
    _node: node
    _edge: has_node
    $handle:
      _edge: has_file
      _prop: handle
      _return: _items
dangling:
  _node: model
  next:
    _edge: has_node
    _return: _items
missing:
  _node: model
  nodes:
    _node: node
    _edge: has_node
    $handle:
      _node: term
      _prop: handle
      _return: _items
"#;

#[test_case("/misedge/nodes/x", CompileErrorKind::EdgeNotPresent ; "selector names absent edge")]
#[test_case("/dangling/next", CompileErrorKind::NoNewEntity ; "edge without new entity")]
#[test_case("/orphan", CompileErrorKind::NoIncomingEntity ; "edge without incoming entity")]
#[test_case("/broken", CompileErrorKind::NothingToReturn ; "named return not in entity")]
#[test_case("/ambiguous/nodes/x", CompileErrorKind::AmbiguousPropTarget ; "prop on a triple")]
#[test_case("/missing/nodes/x", CompileErrorKind::NodeNotPresent ; "selector names absent node")]
fn test_route_errors(path: &str, kind: CompileErrorKind) {
    let table = RouteTable::from_yaml_str(FAULTY_ROUTES).unwrap();
    let qc = QueryCompiler::with_defaults(table);
    let err = qc.compile(path).unwrap_err();
    assert_eq!(err.kind(), kind);
}

const BIOSPECIMEN_ROUTES: &str = r#"
sample:
  _node:
    _label: sample
    _edge: of_case
    _node: case
  _return: _items
  files:
    _node:
      _label: file
      _edge: of_aliquot
      _node: aliquot
    _edge: { _type: of_sample, _dir: _left, _join: [sample, aliquot] }
    _return:
      _nodes: [file]
      _edges: [of_sample@link]
    diagnoses:
      _node: diagnosis
      _edge: has_diagnosis
      _return: _items
  loose:
    _node:
      _label: file
      _edge: of_aliquot
      _node: aliquot
    _edge: of_sample
    _return: _items
  $since:
    _edge: of_case
    _prop: since
    _return:
      _edges: [of_case]
"#;

fn biospecimens() -> QueryCompiler {
    QueryCompiler::with_defaults(RouteTable::from_yaml_str(BIOSPECIMEN_ROUTES).unwrap())
}

#[test_case(
    "/sample",
    "MATCH (n0:sample)-[r0:of_case]->(n1:case) RETURN n0, n1" ;
    "pre-composed node block"
)]
#[test_case(
    "/sample/files",
    "MATCH (n2:file)-[r1:of_aliquot]->(n3:aliquot)-[r2:of_sample]->(n0:sample)-[r0:of_case]->(n1:case) \
     RETURN n2, r2 as link" ;
    "join hint and aliased edge"
)]
#[test_case(
    "/sample/2020",
    "MATCH (n0:sample)-[r0:of_case {since:$p0}]->(n1:case) RETURN r0" ;
    "property placed by edge selector"
)]
fn test_composite_routes(path: &str, expected: &str) {
    let query = biospecimens().compile(path).unwrap();
    assert_eq!(query.to_string(), expected);
}

#[test]
fn test_edge_selector_binds_route_parameter() {
    let qc = biospecimens();
    qc.compile("/sample/2020").unwrap();
    let hit = qc.compile("/sample/2021").unwrap();
    assert!(hit.from_cache());
    assert_eq!(hit.param("since"), Some(&json!("2021")));
}

#[test_case("/sample/loose" ; "two triples without join hint")]
#[test_case("/sample/files/diagnoses" ; "continuation from a multi-triple path")]
fn test_unconnectable_routes(path: &str) {
    let err = biospecimens().compile(path).unwrap_err();
    assert_eq!(err.kind(), CompileErrorKind::Unconnectable);
    assert_eq!(err.offender(), &Offender::Token(path.rsplit('/').next().unwrap().into()));
}

#[test_case(
    "a:\n  _func: median\n  _return: _items\n",
    CompileErrorKind::UnknownFunction ;
    "unknown function"
)]
#[test_case(
    "a:\n  $x:\n    _return: _items\n  $y:\n    _return: _items\n",
    CompileErrorKind::MalformedRouteTable ;
    "two parameters on one level"
)]
#[test_case(
    "a:\n  _node:\n    _prop: handle\n",
    CompileErrorKind::MalformedNode ;
    "node block without label"
)]
#[test_case(
    "a:\n  _edge:\n    _dir: _left\n",
    CompileErrorKind::MalformedEdge ;
    "edge block without type"
)]
#[test_case(
    "a:\n  _return: [node]\n",
    CompileErrorKind::MalformedReturn ;
    "return as a list"
)]
fn test_malformed_tables_fail_at_load(yaml: &str, kind: CompileErrorKind) {
    match RouteTable::from_yaml_str(yaml) {
        Err(RouteTableError::Invalid(err)) => assert_eq!(err.kind(), kind),
        other => panic!("expected an invalid table, got {:?}", other),
    }
}
