//! Benchmarks for request resolution and registry access
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use unified_voice::engine::{tag_text, FineControl, SynthesisRequest};
use unified_voice::speaker::SpeakerRegistry;
use unified_voice::sdk::recommend::recommend;
use unified_voice::SynthesisOptions;

/// Benchmark mode resolution from caller options
fn bench_request_resolution(c: &mut Criterion) {
    let cases = vec![
        ("plain", SynthesisOptions::default()),
        ("emotion", SynthesisOptions::new().with_emotion("happy").with_speed(1.3)),
        ("language", SynthesisOptions::new().with_target_language("en")),
        (
            "instruction",
            SynthesisOptions::new()
                .with_instruction("speak like a pirate")
                .with_emotion("angry"),
        ),
    ];

    let mut group = c.benchmark_group("request_resolution");
    for (name, options) in &cases {
        group.bench_with_input(BenchmarkId::new("from_options", name), options, |b, o| {
            b.iter(|| SynthesisRequest::from_options(black_box(o)))
        });
    }
    group.finish();
}

/// Benchmark fine-control compilation and language tagging
fn bench_control_text(c: &mut Criterion) {
    let control = FineControl {
        emotion: Some("excited".to_string()),
        speed: 1.4,
        volume: 0.8,
        pitch: Some("high".to_string()),
    };

    c.bench_function("fine_control_compile", |b| {
        b.iter(|| black_box(&control).compile())
    });
    c.bench_function("tag_text", |b| {
        b.iter(|| tag_text(black_box("jp"), black_box("おはようございます")))
    });
}

/// Benchmark the advisory recommendation across text lengths
fn bench_recommend(c: &mut Criterion) {
    let options = SynthesisOptions::default();
    let mut group = c.benchmark_group("recommend");
    for len in [16usize, 200, 2000] {
        let text = "字".repeat(len);
        group.bench_with_input(BenchmarkId::new("chars", len), &text, |b, text| {
            b.iter(|| recommend(black_box(text), &options, true, 200))
        });
    }
    group.finish();
}

/// Benchmark registry reads on a populated document
fn bench_registry_listing(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("speaker_features.json");
    let mut document = serde_json::Map::new();
    for i in 0..500 {
        document.insert(
            format!("speaker_{:03}", i),
            serde_json::json!({
                "engine": "feature_vector",
                "voice_payload": { "feature_file": format!("/tmp/speaker_{:03}_se.json", i) },
                "reference_audio_path": "/tmp/ref.wav",
                "created_time": "2024-01-01 00:00:00",
            }),
        );
    }
    std::fs::write(&path, serde_json::to_string(&document).unwrap()).unwrap();

    let registry = SpeakerRegistry::load(&path);
    c.bench_function("registry_ids_500", |b| b.iter(|| registry.ids()));
    c.bench_function("registry_count_by_engine_500", |b| {
        b.iter(|| registry.count_by_engine())
    });
}

criterion_group!(
    benches,
    bench_request_resolution,
    bench_control_text,
    bench_recommend,
    bench_registry_listing,
);

criterion_main!(benches);
