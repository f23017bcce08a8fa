use criterion::{Criterion, black_box, criterion_group, criterion_main};
use gptp_clock_quality::tlv::{decode_clock_quality, encode_clock_quality};
use gptp_clock_quality::{ClockQualityConfig, ClockQualityMeasurement, IngressEventRecorder};

fn filled_recorder(count: u64) -> IngressEventRecorder {
    let recorder = IngressEventRecorder::enabled(ClockQualityConfig::default());
    for i in 0..count {
        #[allow(clippy::cast_possible_wrap)]
        let err = (i % 41) as i64 - 20;
        let ts = 1_000_000_000 + i * 125_000_000;
        recorder.record_measurement(&ClockQualityMeasurement::new(err, ts));
    }
    recorder
}

fn metrics_benchmark(c: &mut Criterion) {
    // 300 s at 8 Sync/s
    let recorder = filled_recorder(2_400);

    c.bench_function("compute_metrics_60s", |b| {
        b.iter(|| recorder.compute_metrics(black_box(60)))
    });

    c.bench_function("compute_metrics_300s", |b| {
        b.iter(|| recorder.compute_metrics(black_box(300)))
    });

    c.bench_function("record_measurement", |b| {
        let recorder = IngressEventRecorder::enabled(ClockQualityConfig::default());
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            recorder.record_measurement(black_box(&ClockQualityMeasurement::new(
                12,
                1_000_000_000 + i * 125_000_000,
            )))
        });
    });
}

fn tlv_benchmark(c: &mut Criterion) {
    let metrics = filled_recorder(2_400).compute_metrics(300);
    let encoded = encode_clock_quality("Milan", &metrics);

    c.bench_function("tlv_encode_snapshot", |b| {
        b.iter(|| encode_clock_quality(black_box("Milan"), black_box(&metrics)))
    });

    c.bench_function("tlv_decode_snapshot", |b| {
        b.iter(|| decode_clock_quality(black_box(&encoded)).unwrap())
    });
}

criterion_group!(benches, metrics_benchmark, tlv_benchmark);
criterion_main!(benches);
