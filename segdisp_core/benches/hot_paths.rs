use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use segdisp_core::mocks::ScriptedConverter;
use segdisp_core::{
    DigitBuffer, DisplayLayout, EngineCfg, FILTER_WINDOW, MovingAverageFilter, build_engine,
};
use segdisp_hardware::SimPanel;
use segdisp_traits::MonotonicClock;

// Synthetic 10-bit trace with xorshift noise around a slow ramp
fn synth_trace(n: usize, seed: u32) -> Vec<u16> {
    let mut state = seed.max(1);
    (0..n)
        .map(|i| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let base = (i / 64 % 1024) as u16;
            base.saturating_add((state % 8) as u16).min(1023)
        })
        .collect()
}

fn configure(g: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>) {
    // Allow quick tweaking without CLI flags (Criterion 0.5):
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p segdisp_core --bench hot_paths
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }
}

pub fn bench_filter(c: &mut Criterion) {
    let mut g = c.benchmark_group("filter");
    configure(&mut g);
    let trace = synth_trace(50_000, 0xC0FFEE);

    g.bench_function("moving_average_update", |b| {
        b.iter_batched(
            || MovingAverageFilter::<FILTER_WINDOW>::seed([0; FILTER_WINDOW]),
            |mut f| {
                for &x in &trace {
                    black_box(f.update(black_box(x)));
                }
            },
            BatchSize::SmallInput,
        )
    });
    g.bench_function("encode_measurement", |b| {
        let layout = DisplayLayout::default();
        b.iter(|| {
            for &x in &trace {
                black_box(DigitBuffer::from_measurement(black_box(x), &layout));
            }
        })
    });
    g.finish();
}

pub fn bench_tick(c: &mut Criterion) {
    let mut g = c.benchmark_group("refresh");
    configure(&mut g);
    let panel = SimPanel::new();
    let mut engine = build_engine(
        panel.digit_lines(),
        panel.segment_bus(),
        ScriptedConverter::new([512]),
        MonotonicClock::new(),
        EngineCfg::default(),
    )
    .expect("build engine");
    engine.prime().expect("prime");

    g.bench_function("scheduler_tick", |b| {
        b.iter(|| black_box(engine.tick().expect("tick")))
    });
    g.finish();
}

criterion_group!(hot_paths, bench_filter, bench_tick);
criterion_main!(hot_paths);
