//! Distribution-level properties of the follow-up quantifier, the
//! Kaplan-Meier milestone intervals, and the stability bounds, exercised on
//! hand-checked and simulated trial data.

use fu_core::EventStatus;
use fu_inference::{
    FollowUpMeasure, extreme_scenarios, kaplan_meier, kaplan_meier_milestones, quantify,
};
use rand::{Rng, SeedableRng};
use rand_distr::Exp1;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct SimulatedTrial {
    observed: Vec<f64>,
    statuses: Vec<EventStatus>,
    potential: Vec<f64>,
}

/// Simulate one arm of a trial: uniform accrual over `accrual` months within
/// a study of `study` months, exponential event and dropout hazards,
/// administrative censoring at the cutoff. Standard-exponential draws are
/// scaled by the rates so that two calls with the same seed but different
/// rates see pointwise-coupled latent times.
fn simulate_trial(
    n: usize,
    accrual: f64,
    study: f64,
    event_rate: f64,
    dropout_rate: f64,
    seed: u64,
) -> SimulatedTrial {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut observed = Vec::with_capacity(n);
    let mut statuses = Vec::with_capacity(n);
    let mut potential = Vec::with_capacity(n);

    for _ in 0..n {
        let entry: f64 = rng.gen_range(0.0..accrual);
        let pfu = study - entry;
        let event_t = rng.sample::<f64, _>(Exp1) / event_rate;
        let dropout_t = rng.sample::<f64, _>(Exp1) / dropout_rate;

        let (t, status) = if event_t <= dropout_t && event_t <= pfu {
            (event_t, EventStatus::Event)
        } else if dropout_t < event_t && dropout_t <= pfu {
            (dropout_t, EventStatus::LostToFollowUp)
        } else {
            (pfu, EventStatus::AdminCensored)
        };

        observed.push(t);
        statuses.push(status);
        potential.push(pfu);
    }

    SimulatedTrial { observed, statuses, potential }
}

// ---------------------------------------------------------------------------
// Kaplan-Meier
// ---------------------------------------------------------------------------

#[test]
fn km_reference_scenario() {
    // Five subjects, two deaths at t=10 out of a risk set of 4.
    let times = [5.0, 10.0, 10.0, 15.0, 20.0];
    let events = [true, true, true, true, false];
    let km = kaplan_meier(&times, &events).unwrap();

    assert!((km.survival_at(5.0) - 0.8).abs() < 1e-12);
    assert!((km.survival_at(10.0) - 0.4).abs() < 1e-12);
    assert!((km.survival_at(15.0) - 0.2).abs() < 1e-12);
    // Flat through the trailing censoring at 20.
    assert!((km.survival_at(17.0) - 0.2).abs() < 1e-12);
    assert!((km.survival_at(20.0) - 0.2).abs() < 1e-12);
}

#[test]
fn km_is_one_at_zero_and_non_increasing() {
    let sim = simulate_trial(200, 12.0, 30.0, 0.05, 0.02, 11);
    let indicator: Vec<bool> = sim.statuses.iter().map(|s| s.is_event()).collect();
    let km = kaplan_meier(&sim.observed, &indicator).unwrap();

    assert!((km.survival_at(0.0) - 1.0).abs() < 1e-12);
    let mut prev = 1.0;
    for step in &km.steps {
        assert!(step.survival <= prev + 1e-12);
        prev = step.survival;
    }
}

#[test]
fn milestone_ci_brackets_estimate_between_observed_times() {
    let sim = simulate_trial(150, 12.0, 30.0, 0.06, 0.02, 23);
    let indicator: Vec<bool> = sim.statuses.iter().map(|s| s.is_event()).collect();

    // Query strictly between consecutive distinct observed times.
    let mut sorted = sim.observed.clone();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    let queries: Vec<f64> =
        sorted.windows(2).step_by(10).map(|w| 0.5 * (w[0] + w[1])).collect();

    let out = kaplan_meier_milestones(&sim.observed, &indicator, &queries, 0.95).unwrap();
    for m in &out {
        let s = m.survival.expect("defined between observed times");
        if let (Some(lo), Some(hi)) = (m.lower, m.upper) {
            assert!(lo <= s && s <= hi, "CI does not bracket at {}", m.time);
            assert!((0.0..=1.0).contains(&lo) && (0.0..=1.0).contains(&hi));
        }
    }
}

#[test]
fn milestone_at_any_observed_time_is_always_flagged() {
    let datasets: Vec<(Vec<f64>, Vec<bool>)> = vec![
        (vec![5.0, 10.0, 10.0, 15.0, 20.0], vec![true, true, false, true, false]),
        {
            let sim = simulate_trial(60, 10.0, 24.0, 0.07, 0.03, 5);
            let ind: Vec<bool> = sim.statuses.iter().map(|s| s.is_event()).collect();
            (sim.observed, ind)
        },
    ];

    for (times, events) in &datasets {
        let out = kaplan_meier_milestones(times, events, times, 0.95).unwrap();
        for m in &out {
            assert!(
                m.survival.is_none() && m.lower.is_none() && m.upper.is_none(),
                "query at observed time {} was not flagged",
                m.time
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Follow-up quantifier
// ---------------------------------------------------------------------------

#[test]
fn all_seven_distributions_are_survivor_like() {
    for seed in [3, 17] {
        let sim = simulate_trial(120, 12.0, 30.0, 0.05, 0.03, seed);
        let res = quantify(&sim.observed, &sim.statuses, &sim.potential).unwrap();

        for d in &res.distributions {
            // The Korn product refits its conditional KM on a shrinking
            // subset; where that subset gets very small the product can
            // wiggle by O(1/m^2), so it only gets the loose tolerance.
            let tol = if d.measure == FollowUpMeasure::KornPotentialFollowUp { 0.05 } else { 1e-12 };
            assert!(
                d.curve.is_non_increasing(tol),
                "{} is not non-increasing",
                d.measure.label()
            );
            if let Some(&first) = d.curve.ys().first() {
                assert!(first <= 1.0 + 1e-12);
            }
        }
    }
}

#[test]
fn medians_table_has_seven_labelled_rows() {
    let sim = simulate_trial(80, 10.0, 24.0, 0.06, 0.02, 29);
    let res = quantify(&sim.observed, &sim.statuses, &sim.potential).unwrap();
    let table = res.medians();
    assert_eq!(table.len(), 7);
    assert_eq!(table[0].0, FollowUpMeasure::ObservationTime.label());
    assert_eq!(table[5].0, FollowUpMeasure::KornPotentialFollowUp.label());
}

#[test]
fn korn_median_does_not_decrease_with_less_dropout() {
    // Same seed couples the latent accrual/event/dropout draws; only the
    // dropout hazard changes between the two arms.
    let heavy = simulate_trial(150, 12.0, 30.0, 0.04, 0.03, 41);
    let light = simulate_trial(150, 12.0, 30.0, 0.04, 0.005, 41);

    let res_heavy = quantify(&heavy.observed, &heavy.statuses, &heavy.potential).unwrap();
    let res_light = quantify(&light.observed, &light.statuses, &light.potential).unwrap();

    let m_heavy = res_heavy
        .distribution(FollowUpMeasure::KornPotentialFollowUp)
        .median
        .expect("korn median defined under heavy dropout");
    let m_light = res_light
        .distribution(FollowUpMeasure::KornPotentialFollowUp)
        .median
        .expect("korn median defined under light dropout");

    assert!(
        m_light >= m_heavy - 1e-9,
        "korn median fell from {m_heavy} to {m_light} as dropout decreased"
    );
}

// ---------------------------------------------------------------------------
// Stability bounds
// ---------------------------------------------------------------------------

#[test]
fn stability_scenarios_respect_invariants() {
    let sim = simulate_trial(100, 12.0, 30.0, 0.05, 0.04, 59);
    let indicator: Vec<bool> = sim.statuses.iter().map(|s| s.is_event()).collect();
    let s = extreme_scenarios(&sim.observed, &indicator).unwrap();

    assert!(s.lower.events.iter().all(|&e| e));
    assert_eq!(s.lower.times, sim.observed);

    for ((orig_t, orig_e), (up_t, up_e)) in
        sim.observed.iter().zip(indicator.iter()).zip(s.upper.iter())
    {
        assert_eq!(*orig_e, up_e);
        assert!(up_t >= *orig_t);
    }
}

#[test]
fn stability_curves_bound_the_estimate() {
    let sim = simulate_trial(100, 12.0, 30.0, 0.05, 0.04, 61);
    let indicator: Vec<bool> = sim.statuses.iter().map(|s| s.is_event()).collect();

    let km = kaplan_meier(&sim.observed, &indicator).unwrap();
    let s = extreme_scenarios(&sim.observed, &indicator).unwrap();
    let km_lower = kaplan_meier(&s.lower.times, &s.lower.events).unwrap();
    let km_upper = kaplan_meier(&s.upper.times, &s.upper.events).unwrap();

    for step in &km.steps {
        let t = step.time;
        assert!(km_lower.survival_at(t) <= step.survival + 1e-12);
        assert!(km_upper.survival_at(t) >= step.survival - 1e-12);
    }
}
