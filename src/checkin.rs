//! Daily check-in readiness score and protocol recommendation.

use crate::models::{
    CheckInInputs, CheckInResult, Recommendation, SleepQuality, Soreness, StressLevel,
};

const EXTENDED_THRESHOLD: u8 = 80;
const STANDARD_THRESHOLD: u8 = 65;
const GENTLE_THRESHOLD: u8 = 50;

/// Energy or motivation at or below this forces the restorative protocol.
const LOW_DRIVE: u8 = 3;

fn sleep_points(sleep: SleepQuality) -> u8 {
    match sleep {
        SleepQuality::Good => 25,
        SleepQuality::Fair => 15,
        SleepQuality::Poor => 5,
    }
}

fn stress_points(stress: StressLevel) -> u8 {
    match stress {
        StressLevel::Low => 20,
        StressLevel::Moderate => 12,
        StressLevel::High => 4,
    }
}

fn soreness_points(soreness: Soreness) -> u8 {
    match soreness {
        Soreness::None => 15,
        Soreness::Mild => 9,
        Soreness::Severe => 3,
    }
}

/// Out-of-range energy/motivation values are clamped to 1..=10.
pub fn readiness_score(inputs: &CheckInInputs) -> u8 {
    let energy = inputs.energy.clamp(1, 10);
    let motivation = inputs.motivation.clamp(1, 10);
    sleep_points(inputs.sleep)
        + stress_points(inputs.stress)
        + soreness_points(inputs.soreness)
        + energy * 2
        + motivation * 2
}

fn poor_recovery_signals(inputs: &CheckInInputs) -> usize {
    [
        inputs.sleep == SleepQuality::Poor,
        inputs.stress == StressLevel::High,
        inputs.soreness == Soreness::Severe,
    ]
    .into_iter()
    .filter(|flag| *flag)
    .count()
}

pub fn recommend(inputs: &CheckInInputs, score: u8) -> Recommendation {
    if inputs.energy.clamp(1, 10) <= LOW_DRIVE || inputs.motivation.clamp(1, 10) <= LOW_DRIVE {
        return Recommendation::Restorative;
    }
    if poor_recovery_signals(inputs) >= 2 {
        return Recommendation::Restorative;
    }

    match score {
        s if s >= EXTENDED_THRESHOLD => Recommendation::Extended,
        s if s >= STANDARD_THRESHOLD => Recommendation::Standard,
        s if s >= GENTLE_THRESHOLD => Recommendation::Gentle,
        _ => Recommendation::Restorative,
    }
}

pub fn evaluate(inputs: CheckInInputs) -> CheckInResult {
    let score = readiness_score(&inputs);
    let recommendation = recommend(&inputs, score);
    CheckInResult {
        inputs,
        score,
        recommendation,
        protocol: recommendation.protocol(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SleepQuality as Sleep;
    use crate::models::StressLevel as Stress;

    const SLEEP: [Sleep; 3] = [Sleep::Poor, Sleep::Fair, Sleep::Good];
    const STRESS: [Stress; 3] = [Stress::High, Stress::Moderate, Stress::Low];
    const SORENESS: [Soreness; 3] = [Soreness::Severe, Soreness::Mild, Soreness::None];

    fn inputs(
        sleep: Sleep,
        stress: Stress,
        soreness: Soreness,
        energy: u8,
        motivation: u8,
    ) -> CheckInInputs {
        CheckInInputs {
            sleep,
            stress,
            soreness,
            energy,
            motivation,
        }
    }

    #[test]
    fn total_over_every_input_combination() {
        for sleep in SLEEP {
            for stress in STRESS {
                for soreness in SORENESS {
                    for energy in 0..=12 {
                        for motivation in 0..=12 {
                            let result =
                                evaluate(inputs(sleep, stress, soreness, energy, motivation));
                            assert!(result.score <= 100);
                            assert_eq!(result.protocol, result.recommendation.protocol());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn best_inputs_score_one_hundred() {
        let result = evaluate(inputs(Sleep::Good, Stress::Low, Soreness::None, 10, 10));
        assert_eq!(result.score, 100);
        assert_eq!(result.recommendation, Recommendation::Extended);
    }

    #[test]
    fn poor_recovery_overrides_high_drive() {
        let result = evaluate(inputs(Sleep::Poor, Stress::High, Soreness::Severe, 8, 8));
        assert_eq!(result.recommendation, Recommendation::Restorative);
    }

    #[test]
    fn low_energy_or_motivation_overrides_everything() {
        let low_energy = evaluate(inputs(Sleep::Good, Stress::Low, Soreness::None, 2, 10));
        assert_eq!(low_energy.recommendation, Recommendation::Restorative);
        let low_motivation = evaluate(inputs(Sleep::Good, Stress::Low, Soreness::None, 10, 3));
        assert_eq!(low_motivation.recommendation, Recommendation::Restorative);
    }

    #[test]
    fn thresholds_select_tiers() {
        // 15 + 12 + 9 + 14 + 14 = 64
        let gentle = evaluate(inputs(Sleep::Fair, Stress::Moderate, Soreness::Mild, 7, 7));
        assert_eq!(gentle.score, 64);
        assert_eq!(gentle.recommendation, Recommendation::Gentle);

        // 25 + 12 + 9 + 12 + 12 = 70
        let standard = evaluate(inputs(Sleep::Good, Stress::Moderate, Soreness::Mild, 6, 6));
        assert_eq!(standard.score, 70);
        assert_eq!(standard.recommendation, Recommendation::Standard);

        // 15 + 12 + 9 + 8 + 8 = 52
        let gentle_low = evaluate(inputs(Sleep::Fair, Stress::Moderate, Soreness::Mild, 4, 4));
        assert_eq!(gentle_low.recommendation, Recommendation::Gentle);

        // 5 + 12 + 9 + 8 + 8 = 42
        let restorative = evaluate(inputs(Sleep::Poor, Stress::Moderate, Soreness::Mild, 4, 4));
        assert_eq!(restorative.recommendation, Recommendation::Restorative);
    }
}
