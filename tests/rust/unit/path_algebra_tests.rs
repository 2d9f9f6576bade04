//! Path stitching and walk rendering through the public API

use pathcypher::cypher::{
    Direction, Entity, Node, Path, PathError, Relationship, RenderContext, RenderMode, Triple,
    VarContext,
};

struct Biospecimens {
    ctx: VarContext,
    case: Node,
    sample: Node,
    aliquot: Node,
    file: Node,
}

fn biospecimens() -> Biospecimens {
    let ctx = VarContext::new();
    let case = ctx.node("case");
    let sample = ctx.node("sample");
    let aliquot = ctx.node("aliquot");
    let file = ctx.node("file");
    Biospecimens {
        ctx,
        case,
        sample,
        aliquot,
        file,
    }
}

fn pattern(path: &Path) -> String {
    path.pattern(RenderMode::Literal)
}

fn tri(r: &Relationship, n: &Node, m: &Node) -> Entity {
    Entity::Triple(r.relate(n, m))
}

#[test]
fn test_node_relationship_chain() {
    let b = biospecimens();
    let of_case = b.ctx.relationship("of_case");
    let of_sample = b.ctx.relationship("of_sample");

    let path = Path::new(
        &b.ctx,
        vec![
            b.aliquot.clone().into(),
            of_sample.into(),
            b.sample.clone().into(),
            of_case.into(),
            b.case.clone().into(),
        ],
    )
    .unwrap();
    assert_eq!(
        pattern(&path),
        "(n2:aliquot)-[r1:of_sample]->(n1:sample)-[r0:of_case]->(n0:case)"
    );
    assert_eq!(path.return_items(), vec!["n2", "n1", "n0"]);
    assert_eq!(path.triples().len(), 2);
}

#[test]
fn test_join_hints_connect_two_fragments() {
    let b = biospecimens();
    let of_case = b.ctx.relationship("of_case");
    let of_aliquot = b.ctx.relationship("of_aliquot");
    let join = b
        .ctx
        .relationship("of_sample")
        .with_direction(Direction::Left)
        .with_join("sample", "aliquot");

    let path = Path::new(
        &b.ctx,
        vec![
            tri(&of_case, &b.sample, &b.case),
            join.into(),
            tri(&of_aliquot, &b.file, &b.aliquot),
        ],
    )
    .unwrap();
    assert_eq!(
        pattern(&path),
        "(n3:file)-[r1:of_aliquot]->(n2:aliquot)-[r2:of_sample]->(n1:sample)-[r0:of_case]->(n0:case)"
    );
}

#[test]
fn test_branches_render_as_separate_walks() {
    let b = biospecimens();
    let of_case = b.ctx.relationship("of_case");
    let of_sample = b.ctx.relationship("of_sample");
    let from_sample = b.ctx.relationship("of_sample");

    let path = Path::new(
        &b.ctx,
        vec![
            tri(&of_case, &b.sample, &b.case),
            tri(&of_sample, &b.aliquot, &b.sample),
            tri(&from_sample, &b.file, &b.sample),
        ],
    )
    .unwrap();
    assert_eq!(
        pattern(&path),
        "(n2:aliquot)-[r1:of_sample]->(n1:sample)-[r0:of_case]->(n0:case), (n3:file)-[r2:of_sample]->(n1:sample)"
    );
    // shared nodes are listed once
    assert_eq!(path.nodes().len(), 4);
}

#[test]
fn test_reversed_edge_renders_left_arrow() {
    let b = biospecimens();
    let of_case = b.ctx.relationship("of_case");
    let has_file = b.ctx.relationship("has_file");

    let path = Path::from_triples(
        &b.ctx,
        vec![
            of_case.relate(&b.sample, &b.case),
            has_file.relate(&b.sample, &b.file),
        ],
    )
    .unwrap();
    assert_eq!(
        pattern(&path),
        "(n3:file)<-[r1:has_file]-(n1:sample)-[r0:of_case]->(n0:case)"
    );
}

#[test]
fn test_structural_errors_report_positions() {
    let b = biospecimens();
    let of_case = b.ctx.relationship("of_case");
    let of_file = b.ctx.relationship("of_file");

    let err = Path::new(&b.ctx, vec![b.case.clone().into(), b.sample.clone().into()]).unwrap_err();
    assert!(matches!(err, PathError::InvalidArgument { position: 2, .. }));

    let err = Path::new(&b.ctx, vec![of_case.clone().into()]).unwrap_err();
    assert_eq!(err.position(), Some(1));

    let err = Path::new(&b.ctx, vec![b.sample.clone().into(), of_case.clone().into()]).unwrap_err();
    assert_eq!(err, PathError::IncompletePath);

    let disjoint = vec![
        tri(&of_case, &b.sample, &b.case),
        tri(&of_file, &b.file, &b.aliquot),
    ];
    let err = Path::new(&b.ctx, disjoint).unwrap_err();
    assert_eq!(err, PathError::NoOverlap { position: 2 });

    let unhinted = vec![
        tri(&of_case, &b.sample, &b.case),
        b.ctx.relationship("of_sample").into(),
        tri(&of_file, &b.file, &b.aliquot),
    ];
    let err = Path::new(&b.ctx, unhinted).unwrap_err();
    assert_eq!(err, PathError::AmbiguousEnds { position: 2 });

    let bad_hint = vec![
        tri(&of_case, &b.sample, &b.case),
        b.ctx
            .relationship("of_sample")
            .with_join("sample", "bogus")
            .into(),
        tri(&of_file, &b.file, &b.aliquot),
    ];
    let err = Path::new(&b.ctx, bad_hint).unwrap_err();
    assert_eq!(err, PathError::JoinEndpointsNotFound { position: 2 });
}

#[test]
fn test_path_as_entity_in_each_context() {
    let b = biospecimens();
    let t: Triple = b.ctx.relationship("of_case").relate(&b.sample, &b.case);
    let path = Path::from_triples(&b.ctx, vec![t]).unwrap();
    let entity = Entity::Path(path);

    assert_eq!(
        entity.render(RenderContext::Pattern, RenderMode::Literal),
        vec!["(n1:sample)-[r0:of_case]->(n0:case)"]
    );
    assert_eq!(
        entity.render(RenderContext::Return, RenderMode::Literal),
        vec!["n1", "n0"]
    );
    assert_eq!(entity.edges().len(), 1);
}
