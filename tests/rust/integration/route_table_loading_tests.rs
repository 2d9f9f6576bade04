//! Loading route tables from YAML and JSON files

use std::io::Write;

use pathcypher::path_compiler::{CompileErrorKind, QueryCompiler, RouteTable, RouteTableError};
use tempfile::{Builder, NamedTempFile};

use super::fixtures::{table, ROUTES};

fn write_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_yaml_file_matches_inline_table() {
    let file = write_file(".yml", ROUTES);
    let loaded = RouteTable::from_file(file.path()).unwrap();
    assert_eq!(loaded, table());
}

#[test]
fn test_json_file() {
    let file = write_file(
        ".json",
        r#"{
            "paths": {
                "model": {
                    "_node": "model",
                    "$model": {
                        "_prop": "handle",
                        "nodes": {
                            "_node": "node",
                            "_edge": {"_type": "has_node", "_dir": "_left"},
                            "_return": {"_nodes": ["node"]}
                        }
                    }
                }
            }
        }"#,
    );
    let loaded = RouteTable::from_file(file.path()).unwrap();
    assert_eq!(loaded.routes(), vec!["/model/$model/nodes"]);

    let query = QueryCompiler::with_defaults(loaded)
        .compile("/model/ICDC/nodes")
        .unwrap();
    assert_eq!(
        query.to_string(),
        "MATCH (n1:node)-[r0:has_node]->(n0:model {handle:$p0}) RETURN n1"
    );
}

#[test]
fn test_table_without_paths_wrapper() {
    let loaded = RouteTable::from_yaml_str("models:\n  _node: model\n  _return: _items\n").unwrap();
    assert_eq!(loaded.routes(), vec!["/models"]);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = RouteTable::from_file(dir.path().join("routes.yml")).unwrap_err();
    assert!(matches!(err, RouteTableError::Io(_)));
}

#[test]
fn test_unparsable_files() {
    let file = write_file(".yaml", "paths: [unclosed\n");
    let err = RouteTable::from_file(file.path()).unwrap_err();
    assert!(matches!(err, RouteTableError::Yaml(_)));

    let file = write_file(".json", "{\"paths\": ");
    let err = RouteTable::from_file(file.path()).unwrap_err();
    assert!(matches!(err, RouteTableError::Json(_)));
}

#[test]
fn test_invalid_table_in_file() {
    let file = write_file(".yml", "paths:\n  a:\n    _func: median\n    _return: _items\n");
    match RouteTable::from_file(file.path()) {
        Err(RouteTableError::Invalid(err)) => {
            assert_eq!(err.kind(), CompileErrorKind::UnknownFunction);
            assert_eq!(
                err.description(),
                "Sorry, no cypher function 'median' is currently defined"
            );
        }
        other => panic!("expected an invalid table, got {:?}", other),
    }
}

#[test]
fn test_scalar_table_is_rejected() {
    let err = RouteTable::from_yaml_str("just a string").unwrap_err();
    match err {
        RouteTableError::Invalid(err) => {
            assert_eq!(err.kind(), CompileErrorKind::MalformedRouteTable)
        }
        other => panic!("expected an invalid table, got {:?}", other),
    }
}
