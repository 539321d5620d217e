use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use d2h_core::BinnedSeries;
use d2h_core::merge::rebin_weighted;
use d2h_core::syst::rms_relative_systematics;
use std::hint::black_box;

fn make_series(name: &str, n: usize, shift: f64) -> BinnedSeries {
    let edges: Vec<f64> = (0..=n).map(|i| i as f64 * 0.5).collect();
    let content: Vec<f64> = (0..n).map(|i| 1.0 + shift + (i as f64 * 0.37).sin().abs()).collect();
    let errors: Vec<f64> = content.iter().map(|c| 0.05 * c).collect();
    BinnedSeries::from_parts(name, edges, content, errors).unwrap()
}

fn bench_rebin(c: &mut Criterion) {
    let mut group = c.benchmark_group("core_rebin");

    for n in [16usize, 128, 1024] {
        let h = make_series("h", n, 0.0);
        // Merge pairs of source bins.
        let target: Vec<f64> = h.bin_edges.iter().step_by(2).copied().collect();
        group.bench_with_input(BenchmarkId::new("pairs", n), &n, |b, _| {
            b.iter(|| black_box(rebin_weighted(&h, &target).unwrap()))
        });
    }

    group.finish();
}

fn bench_rms(c: &mut Criterion) {
    let mut group = c.benchmark_group("core_syst");

    for n_variants in [4usize, 32, 256] {
        let central = make_series("central", 64, 0.0);
        let variants: Vec<BinnedSeries> =
            (0..n_variants).map(|k| make_series("v", 64, 0.01 * k as f64)).collect();
        let refs: Vec<&BinnedSeries> = variants.iter().collect();
        group.bench_with_input(BenchmarkId::new("rms", n_variants), &n_variants, |b, _| {
            b.iter(|| black_box(rms_relative_systematics(&central, &refs)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rebin, bench_rms);
criterion_main!(benches);
