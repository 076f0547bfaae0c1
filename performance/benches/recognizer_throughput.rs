use criterion::{criterion_group, criterion_main, Criterion};
use rand::SeedableRng;

pub fn recognizer_throughput_bench(c: &mut Criterion) {
    let mb = match std::env::var("RECOGNIZER_THROUGHPUT_MB") {
        Ok(val) => match val.parse::<usize>() {
            Ok(val) => val,
            Err(_) => panic!["Failed to parse env var RECOGNIZER_THROUGHPUT_MB={} as an integer", val],
        },
        Err(_) => 5,
    };
    let weights = Default::default();
    let mut rng = rand::prelude::StdRng::seed_from_u64(43);
    let input = performance::generate_random_sgml_document(&mut rng, mb * 1000 * 1000, &weights);

    let mut group = c.benchmark_group("recognizer-throughput");
    group.sample_size(10);
    group.bench_function("tokens_only", |b| {
        b.iter(|| performance::run_recognizer(&input))
    });
    group.bench_function("with_char_refs", |b| {
        b.iter(|| performance::run_expansion(&input, sgmlcore::entity::EntityTable::new()))
    });
    group.finish();
}

criterion_group!(benches, recognizer_throughput_bench);
criterion_main!(benches);
