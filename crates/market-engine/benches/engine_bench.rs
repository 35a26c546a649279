use criterion::{criterion_group, criterion_main, Criterion};

use market_core::CommodityId;
use market_engine::MarketEngine;

fn bench_ticks(c: &mut Criterion) {
    let mut engine = MarketEngine::new(42);
    engine.add_bonus(50_000.0);
    engine.buy(CommodityId::Dom, Some(200.0));
    engine.securitize(CommodityId::Dom, 100.0);
    c.bench_function("engine_tick", |b| {
        b.iter(|| {
            engine.tick();
        })
    });
}

fn bench_save(c: &mut Criterion) {
    let mut engine = MarketEngine::new(42);
    for _ in 0..500 {
        engine.tick();
    }
    c.bench_function("engine_save_json", |b| {
        b.iter(|| {
            let _ = engine.save().to_json();
        })
    });
}

criterion_group!(benches, bench_ticks, bench_save);
criterion_main!(benches);
