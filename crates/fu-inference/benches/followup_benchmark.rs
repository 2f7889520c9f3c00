use criterion::{Criterion, criterion_group, criterion_main};
use fu_core::{CensoredSample, EventStatus};
use fu_inference::{BootstrapConfig, milestone_difference_ci, quantify};
use rand::{Rng, SeedableRng};
use rand_distr::Exp1;
use std::hint::black_box;

fn simulated_arm(n: usize, seed: u64) -> (Vec<f64>, Vec<EventStatus>, Vec<f64>) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut observed = Vec::with_capacity(n);
    let mut statuses = Vec::with_capacity(n);
    let mut potential = Vec::with_capacity(n);
    for _ in 0..n {
        let pfu = 30.0 - rng.gen_range(0.0..12.0);
        let event_t = rng.sample::<f64, _>(Exp1) / 0.05;
        let dropout_t = rng.sample::<f64, _>(Exp1) / 0.02;
        let (t, s) = if event_t <= dropout_t && event_t <= pfu {
            (event_t, EventStatus::Event)
        } else if dropout_t < event_t && dropout_t <= pfu {
            (dropout_t, EventStatus::LostToFollowUp)
        } else {
            (pfu, EventStatus::AdminCensored)
        };
        observed.push(t);
        statuses.push(s);
        potential.push(pfu);
    }
    (observed, statuses, potential)
}

fn bench_quantify(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantify_follow_up");
    for n in [100usize, 500] {
        let (observed, statuses, potential) = simulated_arm(n, 42);
        group.bench_function(format!("n{n}"), |b| {
            b.iter(|| {
                let res = quantify(
                    black_box(&observed),
                    black_box(&statuses),
                    black_box(&potential),
                )
                .unwrap();
                black_box(res.distributions.len())
            })
        });
    }
    group.finish();
}

fn bench_bootstrap(c: &mut Criterion) {
    let (observed_a, statuses_a, _) = simulated_arm(100, 1);
    let (observed_b, statuses_b, _) = simulated_arm(100, 2);
    let a = CensoredSample::new(
        observed_a,
        statuses_a.iter().map(|s| s.is_event()).collect(),
    )
    .unwrap();
    let b = CensoredSample::new(
        observed_b,
        statuses_b.iter().map(|s| s.is_event()).collect(),
    )
    .unwrap();

    let cfg = BootstrapConfig { resample_count: 1_000, conf_level: 0.95, seed: 9, n_threads: 0 };
    c.bench_function("milestone_difference_ci_1000", |bch| {
        bch.iter(|| {
            let ci = milestone_difference_ci(black_box(&a), black_box(&b), 12.0, &cfg).unwrap();
            black_box(ci.km)
        })
    });
}

criterion_group!(benches, bench_quantify, bench_bootstrap);
criterion_main!(benches);
