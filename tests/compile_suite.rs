use std::path::Path;

use sfc_scl::{Config, Diagram, EngineKind, Theme, compile_with_options, parse_scl, render_svg};

fn read_fixture(rel: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(rel);
    assert!(path.exists(), "fixture missing: {rel}");
    std::fs::read_to_string(&path).expect("fixture read failed")
}

fn compile_fixture(rel: &str, engine: EngineKind) -> Diagram {
    let mut config = Config::default();
    config.layout.engine = engine;
    compile_with_options(&read_fixture(rel), &config).expect("compile failed")
}

fn assert_positioned(diagram: &Diagram, fixture: &str) {
    for node in &diagram.nodes {
        assert!(
            node.position.x.is_finite() && node.position.y.is_finite(),
            "{fixture}: node {} has a non-finite position",
            node.id
        );
    }
}

fn edge_pairs(diagram: &Diagram) -> Vec<(&str, &str)> {
    diagram
        .edges
        .iter()
        .map(|edge| (edge.source.as_str(), edge.target.as_str()))
        .collect()
}

#[test]
fn compile_all_fixtures() {
    // Keep this list explicit so new fixtures must be added intentionally.
    let fixtures = [
        "basic.scl",
        "branching.scl",
        "dangling.scl",
        "example.scl",
        "messy.scl",
        "multiline_conditions.scl",
    ];

    for rel in fixtures {
        for engine in [EngineKind::Dagre, EngineKind::Layered] {
            let diagram = compile_fixture(rel, engine);
            assert!(!diagram.nodes.is_empty(), "{rel}: no nodes");
            assert_positioned(&diagram, rel);

            let json = diagram.to_json_pretty().expect("serialize failed");
            let reloaded = Diagram::from_json(&json).expect("reload failed");
            assert_eq!(reloaded, diagram, "{rel}: document did not round-trip");

            let svg = render_svg(&diagram, &Theme::default());
            assert!(svg.contains("<svg"), "{rel}: missing <svg tag");
            assert!(svg.contains("</svg>"), "{rel}: missing </svg tag");
        }
    }
}

#[test]
fn branching_fixture_shape() {
    let diagram = compile_fixture("branching.scl", EngineKind::Layered);
    let ids: Vec<&str> = diagram.nodes.iter().map(|node| node.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "Idle",
            "T_Fill",
            "Fill",
            "T_Full",
            "Heat",
            "Mix",
            "T_HeatDone",
            "T_MixDone",
            "Drain",
            "T_Empty"
        ]
    );
    assert_eq!(
        edge_pairs(&diagram),
        vec![
            ("Idle", "T_Fill"),
            ("T_Fill", "Fill"),
            ("Fill", "T_Full"),
            ("T_Full", "Heat"),
            ("T_Full", "Mix"),
            ("Heat", "T_HeatDone"),
            ("Mix", "T_MixDone"),
            ("T_HeatDone", "Drain"),
            ("T_MixDone", "Drain"),
            ("Drain", "T_Empty"),
            ("T_Empty", "Idle"),
        ]
    );
    // Drain was redeclared; only the action after the second declaration survives.
    assert_eq!(diagram.node("Drain").unwrap().actions(), ["Valve_Out=1".to_string()]);
    assert_eq!(diagram.node("Drain").unwrap().height, 104.0);

    let heat = diagram.node("Heat").unwrap().position;
    let mix = diagram.node("Mix").unwrap().position;
    assert_eq!(heat.y, mix.y);
    assert!(heat.x < mix.x);
}

#[test]
fn multiline_conditions_are_joined() {
    let chart = parse_scl(&read_fixture("multiline_conditions.scl"));
    assert_eq!(
        chart.node("T_Ready").unwrap().condition(),
        Some("Pressure > 2.5 AND Temperature < 80 AND NOT Fault")
    );
    assert_eq!(chart.node("T_Done").unwrap().condition(), Some("Counter >= 100 OR Abort"));
    assert!(chart.edge("T_Done", "Wait").unwrap().is_jump());
}

#[test]
fn dangling_edges_survive_layout() {
    for engine in [EngineKind::Dagre, EngineKind::Layered] {
        let diagram = compile_fixture("dangling.scl", engine);
        assert_eq!(diagram.nodes.len(), 3);
        assert_eq!(
            edge_pairs(&diagram),
            vec![
                ("Nowhere", "Orphan"),
                ("Orphan", "T_Out"),
                ("T_Out", "Missing"),
                ("Ghost", "T_Late"),
            ]
        );
        assert!(diagram.node("Nowhere").is_none());
    }
}

#[test]
fn messy_input_is_tolerated() {
    let chart = parse_scl(&read_fixture("messy.scl"));
    let ids: Vec<&str> = chart.nodes.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["Lower", "MixedCase"]);
    assert!(chart.node("Lower").unwrap().actions().is_empty());
    assert_eq!(
        chart.node("MixedCase").unwrap().condition(),
        Some("x > 0 STEP STEPPER is not a keyword TRANSITION")
    );
    assert!(!chart.edge("Lower", "MixedCase").unwrap().is_jump());
    assert!(chart.edge("MixedCase", "Lower").unwrap().is_jump());
    assert_eq!(chart.edge_count(), 2);
}

#[test]
fn layout_keeps_ranks_top_to_bottom() {
    for engine in [EngineKind::Dagre, EngineKind::Layered] {
        let diagram = compile_fixture("basic.scl", engine);
        let centers: Vec<f32> = ["Start", "T1", "Running", "T2", "Stopped"]
            .iter()
            .map(|id| diagram.node(id).unwrap().center().1)
            .collect();
        assert!(
            centers.windows(2).all(|pair| pair[0] < pair[1]),
            "{engine:?}: ranks out of order: {centers:?}"
        );
    }
}
