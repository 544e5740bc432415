use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use treatment_atlas::choropleth::{HoverTracker, RegionBinder};
use treatment_atlas::config::ChoroplethConfig;
use treatment_atlas::data::{FlowSpec, StageSpec};
use treatment_atlas::layout::{FlowMeasure, Viewport, layout_with_measure, normalize};
use treatment_atlas::render::render_map_svg;
use treatment_atlas::sample;
use treatment_atlas::theme::Theme;

/// `columns` layers of `rows` stages, each stage feeding two stages of the next layer.
fn layered_graph(columns: usize, rows: usize) -> (Vec<StageSpec>, Vec<FlowSpec>) {
    let id = |col: usize, row: usize| format!("s{col}_{row}");
    let mut stages = Vec::with_capacity(columns * rows);
    let mut flows = Vec::new();
    for col in 0..columns {
        for row in 0..rows {
            stages.push(StageSpec {
                id: id(col, row),
                name: format!("Stage {col}.{row}"),
            });
            if col + 1 < columns {
                for target in [row, (row + 1) % rows] {
                    flows.push(FlowSpec {
                        source_id: id(col, row),
                        target_id: id(col + 1, target),
                        weight: 1.0 + ((col * 7 + row * 3 + target) % 11) as f64,
                    });
                }
            }
        }
    }
    (stages, flows)
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    for (columns, rows) in [(4, 1), (8, 8), (16, 32)] {
        let (stages, flows) = layered_graph(columns, rows);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{columns}x{rows}")),
            &(stages, flows),
            |b, (stages, flows)| {
                b.iter(|| {
                    let graph = normalize(black_box(stages), black_box(flows)).expect("acyclic");
                    black_box(graph.column_count());
                });
            },
        );
    }
    group.finish();
}

fn bench_sankey(c: &mut Criterion) {
    let mut group = c.benchmark_group("sankey");
    let viewport = Viewport {
        width: 1600.0,
        height: 1200.0,
        ..Viewport::default()
    };
    for (columns, rows) in [(4, 1), (8, 8), (16, 32)] {
        let (stages, flows) = layered_graph(columns, rows);
        let graph = normalize(&stages, &flows).expect("acyclic");
        for measure in [FlowMeasure::Incident, FlowMeasure::Throughput] {
            group.bench_with_input(
                BenchmarkId::new(format!("{measure:?}"), format!("{columns}x{rows}")),
                &graph,
                |b, graph| {
                    b.iter(|| {
                        let layout = layout_with_measure(black_box(graph), &viewport, measure)
                            .expect("layout failed");
                        black_box(layout.links.len());
                    });
                },
            );
        }
    }
    group.finish();
}

fn bench_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("map");
    let config = ChoroplethConfig::default();
    let theme = Theme::modern();
    let metrics = sample::dataset().metric_table().expect("sample ids are unique");
    let classifier = config.classifier();

    group.bench_function("bind", |b| {
        b.iter(|| {
            let binder =
                RegionBinder::new(sample::tile_feed(), &metrics, &classifier, &config.palette);
            black_box(binder.iter().count());
        });
    });
    group.bench_function("render_hovered", |b| {
        b.iter(|| {
            let binder =
                RegionBinder::new(sample::tile_feed(), &metrics, &classifier, &config.palette);
            let mut hover = HoverTracker::default();
            hover.on_enter(black_box("48"), &binder);
            let svg = render_map_svg(binder, hover.state(), &theme, &config);
            black_box(svg.len());
        });
    });
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_normalize, bench_sankey, bench_map
);
criterion_main!(benches);
