//! Run these benches with `cargo bench --bench indexes -- --verbose`

use criterion::{criterion_group, criterion_main, Criterion};
use enso_report::{ClimateIndex, Dataset, IndexExtractor};
use strum::IntoEnumIterator;

#[path = "../tests/utils/mod.rs"]
mod utils;

criterion_main!(index_benches);

criterion_group!(index_benches, load_bench, extract_all_bench);

fn load_bench(c: &mut Criterion) {
    let window = utils::window();
    let observed = utils::observed_dataset(window);
    let mme = utils::ocean_dataset(window, 0.0);
    let members: Vec<_> = (0..8)
        .map(|k| utils::ocean_dataset(window, 0.1 * k as f64 - 0.4))
        .collect();
    let member_refs: Vec<&dyn Dataset> = members.iter().map(|m| m as &dyn Dataset).collect();

    c.bench_function("index_load", |b| {
        b.iter(|| {
            let _x = IndexExtractor::load(window, &observed, &mme, &member_refs).expect("oops");
        });
    });
}

fn extract_all_bench(c: &mut Criterion) {
    let window = utils::window();
    let observed = utils::observed_dataset(window);
    let mme = utils::ocean_dataset(window, 0.0);
    let members: Vec<_> = (0..8)
        .map(|k| utils::ocean_dataset(window, 0.1 * k as f64 - 0.4))
        .collect();
    let member_refs: Vec<&dyn Dataset> = members.iter().map(|m| m as &dyn Dataset).collect();
    let extractor = IndexExtractor::load(window, &observed, &mme, &member_refs).expect("oops");

    c.bench_function("index_extract_all", |b| {
        b.iter(|| {
            for index in ClimateIndex::iter() {
                let _x = extractor.extract(index).expect("oops");
            }
        });
    });
}
