use std::path::{Path, PathBuf};

use approx::assert_relative_eq;
use treatment_atlas::choropleth::{ColorToken, HoverTracker, RegionBinder, TooltipState};
use treatment_atlas::data::load_polygon_feed;
use treatment_atlas::layout::{FlowMeasure, Viewport, compute_sankey};
use treatment_atlas::{Dataset, GraphError, RenderOptions, render_map, render_sankey, sample};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn assert_valid_svg(svg: &str, what: &str) {
    assert!(svg.contains("<svg"), "{what}: missing <svg tag");
    assert!(svg.contains("</svg>"), "{what}: missing </svg tag");
}

#[test]
fn renders_builtin_sample_views() {
    let options = RenderOptions::modern();
    let dataset = sample::dataset();

    let sankey = render_sankey(&dataset, &options).expect("sample sankey renders");
    assert_valid_svg(&sankey, "sample sankey");
    assert!(sankey.contains("Referral to Specialist: 120"));

    let map = render_map(&dataset, sample::tile_feed(), &TooltipState::default(), &options)
        .expect("sample map renders");
    assert_valid_svg(&map, "sample map");
    assert_eq!(map.matches("<path class=\"region").count(), 52);
}

#[test]
fn branching_fixture_lays_out_by_longest_path() {
    let dataset = Dataset::load(&fixture("clinic_network.json")).expect("fixture read failed");
    let viewport = Viewport::default();
    let layout = compute_sankey(&dataset, &viewport, FlowMeasure::Incident).expect("acyclic");

    assert_eq!(layout.column_count, 4);
    let column = |id: &str| layout.node(id).map(|n| n.column_index);
    assert_eq!(column("screening"), Some(0));
    assert_eq!(column("symptoms"), Some(0));
    assert_eq!(column("neuro"), Some(1));
    assert_eq!(column("genetic"), Some(2));
    assert_eq!(column("treatment"), Some(3));

    let genetic = layout.node("genetic").expect("genetic node");
    assert_relative_eq!(genetic.value, 120.0);
    assert_relative_eq!(genetic.height(), layout.pixels(120.0), epsilon = 1e-9);

    let last = layout.node("treatment").expect("treatment node");
    assert_relative_eq!(last.x1, viewport.width - viewport.margin_right, epsilon = 1e-9);
    for node in &layout.nodes {
        assert!(node.vertical_start >= viewport.margin_top - 1e-9);
        assert!(node.vertical_end <= viewport.height - viewport.margin_bottom + 1e-9);
    }
}

#[test]
fn throughput_measure_shrinks_pass_through_nodes() {
    let dataset = Dataset::load(&fixture("clinic_network.json")).expect("fixture read failed");
    let layout =
        compute_sankey(&dataset, &Viewport::default(), FlowMeasure::Throughput).expect("acyclic");
    assert_relative_eq!(layout.node("genetic").expect("genetic").value, 65.0);
    assert_relative_eq!(layout.node("neuro").expect("neuro").value, 45.0);
}

#[test]
fn cyclic_fixture_is_rejected() {
    let dataset = Dataset::load(&fixture("cyclic.json")).expect("fixture read failed");
    let err = compute_sankey(&dataset, &Viewport::default(), FlowMeasure::Incident)
        .expect_err("cycle must fail");
    match err.downcast_ref::<GraphError>() {
        Some(GraphError::Cycle { stages }) => {
            assert_eq!(stages, &["review".to_string(), "followup".to_string()]);
        }
        other => panic!("expected cycle error, got {other:?}"),
    }
}

#[test]
fn fixture_feed_binds_and_renders_with_hover() {
    let dataset = Dataset::load(&fixture("clinic_network.json")).expect("fixture read failed");
    let feed = load_polygon_feed(&fixture("clinic_regions.json")).expect("feed read failed");
    assert_eq!(feed.len(), 4);
    assert_eq!(feed[0].geometry.0[0].interiors().len(), 1);
    assert_eq!(feed[1].geometry.0.len(), 2);

    let options = RenderOptions::modern();
    let metrics = dataset.metric_table().expect("unique ids");
    let classifier = options.choropleth.classifier();
    let binder = RegionBinder::new(&feed, &metrics, &classifier, &options.choropleth.palette);
    let tokens: Vec<ColorToken> = binder.iter().map(|r| r.token).collect();
    assert_eq!(
        tokens,
        [
            ColorToken::High,
            ColorToken::MediumHigh,
            ColorToken::Low,
            ColorToken::NoData
        ]
    );

    let mut hover = HoverTracker::default();
    hover.on_enter("B", &binder);
    let svg = render_map(&dataset, &feed, hover.state(), &options).expect("map renders");
    assert_valid_svg(&svg, "fixture map");
    assert!(svg.contains("State: BB"));
    assert!(svg.contains("Adoption Rate: 70%"));

    hover.on_enter("D", &binder);
    let svg = render_map(&dataset, &feed, hover.state(), &options).expect("map renders");
    assert!(svg.contains("No data available"));
}
