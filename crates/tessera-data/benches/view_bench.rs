use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use tessera_data::ecs::{Component, EntityComponentManager};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position(i32);
impl Component for Position {}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RenderTag;
impl Component for RenderTag {}

fn bench_views(c: &mut Criterion) {
    let mut ecm = EntityComponentManager::with_max_entities(10_000).unwrap();

    // Setup 10,000 entities, half of them tagged
    for i in 0..10_000 {
        let e = ecm.create_entity().unwrap();
        ecm.add_component(e, Position(i)).unwrap();
        if i % 2 == 0 {
            ecm.add_component(e, RenderTag).unwrap();
        }
    }

    let mut group = c.benchmark_group("ECS Views");

    group.bench_function("Filtered (Position & RenderTag)", |b| {
        b.iter(|| {
            let mut count = 0;
            for (_, (pos, _tag)) in ecm.view::<(Position, RenderTag)>().unwrap() {
                count += pos.0;
                black_box(count);
            }
        });
    });

    group.bench_function("Single (Position only)", |b| {
        b.iter(|| {
            let mut count = 0;
            for (_, (pos,)) in ecm.view::<(Position,)>().unwrap() {
                count += pos.0;
                black_box(count);
            }
        });
    });

    group.bench_function("Unfiltered", |b| {
        b.iter(|| black_box(ecm.view::<()>().unwrap().into_iter().count()));
    });

    group.finish();
}

criterion_group!(benches, bench_views);
criterion_main!(benches);
