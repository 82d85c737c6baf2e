use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use research_tree::config::{Config, LayoutConfig};
use research_tree::ir::Entity;
use research_tree::layout::compute_layout;
use research_tree::parser::parse_entities;
use research_tree::render::render_svg;
use std::hint::black_box;

const CATEGORIES: [&str; 8] = [
    "Construction",
    "Smithing",
    "Power",
    "Medicine",
    "Farming",
    "Weapons",
    "Armor",
    "Logistics",
];

/// Synthetic research tree: one chain of `tiers` entities per category. Every
/// `cross_every`th tier also depends on the previous category, and `loose`
/// unconnected entities fill the isolated grid.
fn synthetic_tree(tiers: usize, cross_every: usize, loose: usize) -> Vec<Entity> {
    let mut out = Vec::new();
    for (c, category) in CATEGORIES.iter().enumerate() {
        for tier in 0..tiers {
            let id = format!("{category}_{tier}");
            let mut prerequisites = Vec::new();
            if tier > 0 {
                prerequisites.push(format!("{category}_{}", tier - 1));
            }
            if c > 0 && cross_every > 0 && tier % cross_every == cross_every - 1 {
                prerequisites.push(format!("{}_{}", CATEGORIES[c - 1], tier.saturating_sub(1)));
            }
            out.push(Entity {
                id: id.clone(),
                label: format!("{category} {}", tier + 1),
                category: category.to_string(),
                prerequisites,
                finished: tier < tiers / 3,
            });
        }
    }
    for i in 0..loose {
        out.push(Entity::new(&format!("loose_{i}"), &format!("Loose{i}"), &[]));
    }
    out
}

fn document_source(entities: &[Entity]) -> String {
    let mut out = String::from("[\n");
    for (idx, entity) in entities.iter().enumerate() {
        let prereqs: Vec<String> = entity
            .prerequisites
            .iter()
            .map(|p| format!("\"{p}\""))
            .collect();
        out.push_str(&format!(
            "  {{\"id\": \"{}\", \"label\": \"{}\", \"prerequisites\": [{}], \"finished\": {}}}",
            entity.id,
            entity.label,
            prereqs.join(", "),
            entity.finished
        ));
        out.push_str(if idx + 1 < entities.len() { ",\n" } else { "\n" });
    }
    out.push(']');
    out
}

fn sizes() -> [(&'static str, Vec<Entity>); 3] {
    [
        ("small", synthetic_tree(4, 3, 6)),
        ("medium", synthetic_tree(12, 2, 20)),
        ("large", synthetic_tree(40, 2, 60)),
    ]
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, entities) in sizes() {
        let input = document_source(&entities);
        group.bench_with_input(BenchmarkId::from_parameter(name), &input, |b, data| {
            b.iter(|| {
                let parsed = parse_entities(black_box(data)).expect("parse failed");
                black_box(parsed.entities.len());
            });
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = LayoutConfig::default();
    for (name, entities) in sizes() {
        group.bench_with_input(BenchmarkId::from_parameter(name), &entities, |b, data| {
            b.iter(|| {
                let layout = compute_layout(black_box(data), &config).expect("layout failed");
                black_box(layout.nodes.len());
            });
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_svg");
    let config = Config::default();
    for (name, entities) in sizes() {
        let layout = compute_layout(&entities, &config.layout).expect("layout failed");
        group.bench_with_input(BenchmarkId::from_parameter(name), &layout, |b, data| {
            b.iter(|| {
                let svg = render_svg(black_box(data), &config.theme, &config.layout, &config.render);
                black_box(svg.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_parse, bench_layout, bench_render
);
criterion_main!(benches);
