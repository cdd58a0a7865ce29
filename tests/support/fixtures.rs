use enose::ml::TrainDataset;
use enose::sensor::{GAS_CHANNEL_COUNT, gas_ratios};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Noisy synthetic gas readings; each class shifts a few channels so the classes overlap
/// but stay learnable.
pub fn gas_readings(
    n_classes: usize,
    per_class: usize,
    seed: u64,
) -> (Vec<[f32; GAS_CHANNEL_COUNT]>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut gases = Vec::with_capacity(n_classes * per_class);
    let mut labels = Vec::with_capacity(n_classes * per_class);
    for class in 0..n_classes {
        for _ in 0..per_class {
            let mut row = [0f32; GAS_CHANNEL_COUNT];
            for (channel, value) in row.iter_mut().enumerate() {
                let base = 20_000.0 + channel as f32 * 9_000.0;
                let shift = if (channel + class) % 3 == 0 { 1.0 + 0.25 * class as f32 } else { 1.0 };
                *value = (base * shift * rng.random_range(0.85..1.15)).round();
            }
            gases.push(row);
            labels.push(class);
        }
    }
    (gases, labels)
}

/// Ratio-feature dataset built from [`gas_readings`].
pub fn ratio_dataset(n_classes: usize, per_class: usize, seed: u64) -> TrainDataset {
    let (gases, y) = gas_readings(n_classes, per_class, seed);
    let x = gases
        .iter()
        .map(|row| gas_ratios(row).expect("positive reference").to_vec())
        .collect();
    TrainDataset { n_classes, x, y }
}
