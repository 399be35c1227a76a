//! Criterion benchmarks for the simulator and the full projection.

use bf_core::aggregate::aggregate;
use bf_core::{
    build_projection_report, EventRecord, IssueStatus, MonteCarloSimulator, RateEstimate,
    SimulationParams,
};
use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn bench_simulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulate");
    let rates = RateEstimate::single(4.0);

    // The dashboard slider range: 100..=5000 trials over twelve weeks.
    for trials in [100usize, 1000, 5000] {
        let simulator = MonteCarloSimulator::new(SimulationParams::new(trials, 12).with_seed(1));
        group.throughput(Throughput::Elements((trials * 12) as u64));
        group.bench_with_input(BenchmarkId::new("single_rate", trials), &trials, |b, _| {
            b.iter(|| black_box(simulator.simulate(black_box(&rates))));
        });
    }

    let grouped = RateEstimate::from_rates((0..20).map(|i| (Some(format!("p{i:02}")), 0.25)));
    let simulator = MonteCarloSimulator::new(SimulationParams::new(1000, 12).with_seed(1));
    group.bench_function("twenty_groups_1000", |b| {
        b.iter(|| black_box(simulator.simulate(black_box(&grouped))));
    });

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let matrix = MonteCarloSimulator::new(SimulationParams::new(5000, 52).with_seed(3))
        .simulate(&RateEstimate::single(6.0));
    let Ok(matrix) = matrix else {
        return;
    };
    c.bench_function("aggregate_5000x52", |b| {
        b.iter(|| black_box(aggregate(black_box(&matrix), 120.0)));
    });
}

fn bench_report(c: &mut Criterion) {
    let base = Utc.with_ymd_and_hms(2023, 1, 2, 8, 0, 0).unwrap();
    let records: Vec<EventRecord> = (0..2_000i64)
        .map(|i| {
            let status = if i % 3 == 0 {
                IssueStatus::Closed
            } else {
                IssueStatus::Open
            };
            EventRecord::new(base + Duration::hours(i * 13), status)
        })
        .collect();

    c.bench_function("report_2000_records_1000x12", |b| {
        b.iter(|| {
            black_box(build_projection_report(
                black_box(&records),
                1_333,
                667,
                1000,
                12,
                Some(5),
            ))
        });
    });
}

criterion_group!(benches, bench_simulate, bench_aggregate, bench_report);
criterion_main!(benches);
