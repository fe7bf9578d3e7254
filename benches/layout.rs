use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use taxonomy_layout::config::{Config, LayoutConfig, LayoutEngine};
use taxonomy_layout::layout::compute_layout;
use taxonomy_layout::model::{Level, TaxonomyNode};
use taxonomy_layout::render::{Highlight, render_svg};
use taxonomy_layout::tree;

/// Full five-level taxonomy with `fanout` children under every node.
fn balanced_taxonomy(pillars: usize, fanout: usize) -> Vec<TaxonomyNode> {
    let mut nodes = Vec::new();
    let mut frontier: Vec<(String, Level)> = Vec::new();
    for idx in 0..pillars {
        let id = format!("p{idx}");
        nodes.push(
            TaxonomyNode::new(&id, format!("Pillar {idx}"), Level::Pillar, None, idx as i64)
                .with_objective("Own the conversation about reliability and long-term value")
                .with_audiences(["Customers", "Investors", "Media", "Regulators"]),
        );
        frontier.push((id, Level::Pillar));
    }
    while let Some((parent, level)) = frontier.pop() {
        let Some(child_level) = level.child() else {
            continue;
        };
        for idx in 0..fanout {
            let id = format!("{parent}.{idx}");
            let mut node = TaxonomyNode::new(
                &id,
                format!("{} {idx}", child_level.label()),
                child_level,
                Some(parent.as_str()),
                idx as i64,
            );
            if idx % 2 == 0 {
                node = node.with_geographies(["Global", "Europe"]);
            }
            nodes.push(node);
            frontier.push((id, child_level));
        }
    }
    nodes
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    for (name, pillars, fanout) in [("small", 1, 2), ("medium", 2, 3), ("large", 3, 4)] {
        let nodes = balanced_taxonomy(pillars, fanout);
        for engine in [LayoutEngine::Tidy, LayoutEngine::Layered] {
            let config = LayoutConfig {
                engine,
                ..LayoutConfig::default()
            };
            let id = BenchmarkId::new(format!("{engine:?}").to_lowercase(), name);
            group.bench_with_input(id, &nodes, |b, nodes| {
                b.iter(|| {
                    let layout = compute_layout(black_box(nodes), &config).expect("layout failed");
                    black_box(layout.nodes.len());
                });
            });
        }
    }
    group.finish();
}

fn bench_tree_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree");
    let nodes = balanced_taxonomy(3, 4);
    group.bench_function("search_by_name", |b| {
        b.iter(|| black_box(tree::search_by_name(black_box(&nodes), "topic 3").len()));
    });
    group.bench_function("build_tree", |b| {
        b.iter(|| black_box(tree::build_tree(black_box(&nodes)).len()));
    });
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let config = Config::default();
    for (name, pillars, fanout) in [("small", 1, 2), ("medium", 2, 3)] {
        let nodes = balanced_taxonomy(pillars, fanout);
        let layout = compute_layout(&nodes, &config.layout).expect("layout failed");
        group.bench_with_input(BenchmarkId::from_parameter(name), &nodes, |b, nodes| {
            b.iter(|| {
                let svg = render_svg(&layout, black_box(nodes), &config, &Highlight::default());
                black_box(svg.len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_layout, bench_tree_ops, bench_render);
criterion_main!(benches);
