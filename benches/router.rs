use ancestry_layout::config::Config;
use ancestry_layout::geometry::ViewportBox;
use ancestry_layout::layout::{RowLayout, compute_static_tree, group_by_generation, group_families, route_connectors};
use ancestry_layout::member::Member;
use ancestry_layout::render::{TreeScene, render_svg};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// Couples per generation, each with `children` kids who marry into the next row.
fn synthetic_family(generations: i64, couples: usize, children: usize) -> Vec<Member> {
    let mut members = Vec::new();
    let mut next_id = 1i64;
    let mut previous: Vec<(i64, i64)> = Vec::new();
    for generation in (0..generations).rev() {
        let mut row = Vec::with_capacity(couples);
        for couple in 0..couples {
            let a = next_id;
            let b = next_id + 1;
            next_id += 2;
            let mut first = Member::new(a, format!("Member {a}"), generation);
            if !previous.is_empty() {
                let (p1, p2) = previous[couple % previous.len()];
                first = first.with_parents([p1, p2]);
            }
            members.push(first);
            members.push(Member::new(b, format!("Member {b}"), generation));
            row.push((a, b));
        }
        for (idx, &(p1, p2)) in row.iter().enumerate() {
            for kid in 1..children {
                let id = next_id;
                next_id += 1;
                if generation > 0 {
                    members.push(
                        Member::new(id, format!("Member {id} {idx}.{kid}"), generation - 1).with_parents([p1, p2]),
                    );
                }
            }
        }
        previous = row;
    }
    members
}

fn viewport(config: &Config) -> ViewportBox {
    ViewportBox::new(config.render.width, config.render.height)
}

fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping");
    for (generations, couples, children) in [(4i64, 4usize, 3usize), (6, 12, 4), (8, 30, 5)] {
        let members = synthetic_family(generations, couples, children);
        let name = format!("members_{}", members.len());
        group.bench_with_input(BenchmarkId::from_parameter(name), &members, |b, members| {
            b.iter(|| {
                let generations = group_by_generation(black_box(members));
                let families = group_families(black_box(members));
                black_box((generations.len(), families.len()));
            });
        });
    }
    group.finish();
}

fn bench_connector_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("connector_routing");
    let config = Config::default();
    for (generations, couples, children) in [(4i64, 4usize, 3usize), (6, 12, 4), (8, 30, 5)] {
        let members = synthetic_family(generations, couples, children);
        let rows = RowLayout::compute(&group_by_generation(&members), &config.layout, viewport(&config));
        let families = group_families(&members);
        let name = format!("families_{}", families.len());
        group.bench_with_input(BenchmarkId::from_parameter(name), &families, |b, families| {
            b.iter(|| {
                let connectors = route_connectors(black_box(families), &rows, &config.router);
                black_box(connectors.len());
            });
        });
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let config = Config::default();
    for (generations, couples, children) in [(4i64, 4usize, 3usize), (6, 12, 4)] {
        let members = synthetic_family(generations, couples, children);
        let name = format!("members_{}", members.len());
        group.bench_with_input(BenchmarkId::from_parameter(name), &members, |b, members| {
            b.iter(|| {
                let (tree, rows) =
                    compute_static_tree(black_box(members), &config.layout, &config.router, viewport(&config));
                let scene = TreeScene {
                    generations: &tree.generations,
                    connectors: &tree.connectors,
                    geometry: &rows,
                    width: rows.width(),
                    height: rows.height(),
                    presentation: None,
                };
                let svg = render_svg(&scene, &config.theme, &config);
                black_box(svg.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_grouping, bench_connector_routing, bench_end_to_end
);
criterion_main!(benches);
