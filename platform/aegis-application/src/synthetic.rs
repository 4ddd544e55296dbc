use aegis_domain::value_objects::bar::Bar;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 2024-01-01T00:00:00Z
pub const SYNTHETIC_START_TS: i64 = 1_704_067_200;
pub const SYNTHETIC_STEP_SECONDS: i64 = 3_600;

/// Deterministic hourly random-walk bars for smoke runs and tests.
///
/// The same `(count, seed)` always yields the same bars.
pub fn synthetic_bars(count: usize, seed: u64) -> Vec<Bar> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut bars = Vec::with_capacity(count);
    let mut close = 100.0f64;

    for idx in 0..count {
        let open = close;
        let step = 0.01 * standard_normal(&mut rng);
        close = (open * step.exp()).max(0.01);

        let wick_up = open.max(close) * 0.005 * rng.gen::<f64>();
        let wick_down = open.min(close) * 0.005 * rng.gen::<f64>();
        let high = open.max(close) + wick_up;
        let low = (open.min(close) - wick_down).max(0.005);
        let volume = 1_000_000.0 * (1.0 + 0.1 * standard_normal(&mut rng)).max(0.1);

        bars.push(Bar::new(
            SYNTHETIC_START_TS + idx as i64 * SYNTHETIC_STEP_SECONDS,
            open,
            high,
            low,
            close,
            volume,
        ));
    }
    bars
}

/// Box-Muller draw from N(0, 1).
fn standard_normal(rng: &mut ChaCha8Rng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
