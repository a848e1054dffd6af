//! Benchmark for region synthesis.
//!
//! Run with: cargo bench --package terraseed_procedural --bench synth_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use terraseed_procedural::noise::{octave_weights, ValueNoise};
use terraseed_procedural::{
    map, ArtifactCodec, GenerationKey, MacroVars, MappingVersion, RegionCoord, Synthesizer,
};

fn key(seed: i64) -> GenerationKey {
    GenerationKey::new(RegionCoord::new(0, 0), seed, MacroVars::default())
}

fn benchmark_region_synthesis(c: &mut Criterion) {
    let mut group = c.benchmark_group("region_synthesis");

    for size in [32usize, 64, 128] {
        let synth = Synthesizer::new(size);
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &synth, |b, synth| {
            let mut seed = 0i64;
            b.iter(|| {
                seed = seed.wrapping_add(1);
                black_box(synth.build(&key(seed)))
            });
        });
    }

    group.finish();
}

fn benchmark_mapping(c: &mut Criterion) {
    let vars = MacroVars::new([12, 34, 56, 78, 90, 10, 30, 50, 70, 90]);

    c.bench_function("mapping_v2", |b| {
        let mut seed = 0i64;
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(map(MappingVersion::V2, black_box(seed), &vars))
        });
    });
}

fn benchmark_value_noise(c: &mut Criterion) {
    let noise = ValueNoise::new(42);
    let weights = octave_weights(0.6);

    c.bench_function("value_noise_3_octaves", |b| {
        let mut x = 0.0f64;
        b.iter(|| {
            x += 0.37;
            black_box(noise.octaved(black_box(x), black_box(x * 0.7), &weights))
        });
    });
}

fn benchmark_codec(c: &mut Criterion) {
    let artifact = Synthesizer::new(64).build(&key(42));
    let encoded = ArtifactCodec::encode(&artifact);

    c.bench_function("artifact_encode_64", |b| {
        b.iter(|| black_box(ArtifactCodec::encode(black_box(&artifact))));
    });
    c.bench_function("artifact_decode_64", |b| {
        b.iter(|| black_box(ArtifactCodec::decode(black_box(&encoded))));
    });
}

criterion_group!(
    benches,
    benchmark_region_synthesis,
    benchmark_mapping,
    benchmark_value_noise,
    benchmark_codec,
);
criterion_main!(benches);
