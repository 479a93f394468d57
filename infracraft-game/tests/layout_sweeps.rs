#![allow(clippy::float_cmp)]

use std::hash::Hasher;

use infracraft_game::{
    LayoutComponent, PlayerLayout, PuzzleScenario, ScenarioCatalog, ValidationResult,
    compute_metrics, validate_layout,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use twox_hash::XxHash64;

const SWEEP_SEED: u64 = 0x00C0_FFEE;
const SWEEP_ROUNDS: usize = 64;

fn random_layout(rng: &mut ChaCha20Rng, scenario: &PuzzleScenario) -> PlayerLayout {
    let mut layout = PlayerLayout::new();
    let entries = rng.gen_range(0..6);
    for _ in 0..entries {
        let component_id = if rng.gen_bool(0.1) {
            "unlisted-component".to_string()
        } else {
            let idx = rng.gen_range(0..scenario.available_components.len());
            scenario.available_components[idx].id.clone()
        };
        let quantity = match rng.gen_range(0..4) {
            0 => None,
            1 => Some(-f64::from(rng.gen_range(1..4_u8))),
            _ => Some(f64::from(rng.gen_range(0..6_u8))),
        };
        layout.components.push(LayoutComponent {
            component_id,
            quantity,
        });
    }
    layout
}

fn digest(result: &ValidationResult) -> u64 {
    let bytes = serde_json::to_vec(result).unwrap();
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(&bytes);
    hasher.finish()
}

#[test]
fn validation_is_idempotent() {
    let mut rng = ChaCha20Rng::seed_from_u64(SWEEP_SEED);
    for scenario in ScenarioCatalog::default_catalog() {
        for _ in 0..SWEEP_ROUNDS {
            let layout = random_layout(&mut rng, scenario);
            let first = validate_layout(&layout, scenario);
            let second = validate_layout(&layout, scenario);
            assert_eq!(first, second);
            assert_eq!(digest(&first), digest(&second));
        }
    }
}

#[test]
fn throughput_is_additive_over_disjoint_layouts() {
    let mut rng = ChaCha20Rng::seed_from_u64(SWEEP_SEED ^ 0xA5A5);
    let empty = PlayerLayout::new();
    for scenario in ScenarioCatalog::default_catalog() {
        let baseline = compute_metrics(&empty, scenario).total_throughput;
        let (left_ids, right_ids) = scenario.available_components.split_at(1);
        for _ in 0..SWEEP_ROUNDS {
            let mut left = PlayerLayout::new();
            for component in left_ids {
                left = left.with(component.id.clone(), f64::from(rng.gen_range(0..5_u8)));
            }
            let mut right = PlayerLayout::new();
            for component in right_ids {
                right = right.with(component.id.clone(), f64::from(rng.gen_range(0..5_u8)));
            }
            let delta_left = compute_metrics(&left, scenario).total_throughput - baseline;
            let delta_right = compute_metrics(&right, scenario).total_throughput - baseline;

            let mut union = left.clone();
            union.components.extend(right.components.clone());
            let combined = compute_metrics(&union, scenario).total_throughput;
            assert_eq!(combined, baseline + delta_left + delta_right);
        }
    }
}

#[test]
fn unknown_entries_never_change_metrics() {
    let mut rng = ChaCha20Rng::seed_from_u64(SWEEP_SEED.rotate_left(7));
    for scenario in ScenarioCatalog::default_catalog() {
        for _ in 0..SWEEP_ROUNDS {
            let layout = random_layout(&mut rng, scenario);
            let known = PlayerLayout {
                components: layout
                    .components
                    .iter()
                    .filter(|entry| scenario.find_component(&entry.component_id).is_some())
                    .cloned()
                    .collect(),
            };
            assert_eq!(
                compute_metrics(&layout, scenario),
                compute_metrics(&known, scenario)
            );
            let result = validate_layout(&layout, scenario);
            let expected_unknown = usize::from(
                layout
                    .components
                    .iter()
                    .any(|entry| entry.component_id == "unlisted-component"),
            );
            assert_eq!(result.unknown_components.len(), expected_unknown);
        }
    }
}
