//! Pairwise-mean consumption model.
//!
//! Formula: mean over consecutive pairs of `level_drop / day_gap`, counting
//! only pairs where the level fell and time advanced. Refills and misreads
//! (rising pairs) are ignored rather than pulling the rate down.

use crate::estimation::model::{RateEstimate, RateModel, day_gap, prepare_observations};
use crate::estimation::PAIRWISE_MEAN;
use crate::state::Observation;

#[derive(Debug, Clone, Copy, Default)]
pub struct PairwiseMeanModel;

impl RateModel for PairwiseMeanModel {
    fn name(&self) -> &'static str {
        PAIRWISE_MEAN
    }

    fn estimate(&self, observations: &[Observation]) -> RateEstimate {
        let prepared = prepare_observations(observations);
        if prepared.len() < 2 {
            return RateEstimate::InsufficientData;
        }

        let rates: Vec<f64> = prepared
            .windows(2)
            .filter_map(|pair| {
                let level_drop = pair[0].level - pair[1].level;
                let gap = day_gap(&pair[0], &pair[1]);
                (gap > 0.0 && level_drop > 0.0).then(|| level_drop / gap)
            })
            .collect();

        if rates.is_empty() {
            return RateEstimate::InsufficientData;
        }

        let mean = rates.iter().sum::<f64>() / rates.len() as f64;
        RateEstimate::from_rate(mean, rates.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DAY_MS: i64 = 86_400_000;

    fn series(levels: &[(i64, f64)]) -> Vec<Observation> {
        levels
            .iter()
            .map(|&(day, level)| Observation::new(day * DAY_MS, level))
            .collect()
    }

    #[test]
    fn steady_decline_gives_constant_rate() {
        let observations = series(&[(0, 80.0), (1, 75.0), (2, 70.0)]);

        let estimate = PairwiseMeanModel.estimate(&observations);

        assert_eq!(
            estimate,
            RateEstimate::Measured {
                rate_per_day: 5.0,
                pairs: 2
            }
        );
    }

    #[test]
    fn rate_is_mean_of_pair_rates_not_end_to_end_slope() {
        // Pair rates: 10/1 = 10, 6/3 = 2 -> mean 6. End-to-end would be 4.
        let observations = series(&[(0, 80.0), (1, 70.0), (4, 64.0)]);

        let estimate = PairwiseMeanModel.estimate(&observations);

        assert_relative_eq!(estimate.rate_per_day(), 6.0);
    }

    #[test]
    fn unsorted_input_is_sorted_first() {
        let observations = series(&[(2, 70.0), (0, 80.0), (1, 75.0)]);

        assert_relative_eq!(PairwiseMeanModel.estimate(&observations).rate_per_day(), 5.0);
    }

    #[test]
    fn rising_pairs_are_ignored() {
        // 60 -> 90 is a refill; only 90 -> 86 and 86 -> 82 count.
        let observations = series(&[(0, 60.0), (1, 90.0), (2, 86.0), (3, 82.0)]);

        let estimate = PairwiseMeanModel.estimate(&observations);

        assert_eq!(
            estimate,
            RateEstimate::Measured {
                rate_per_day: 4.0,
                pairs: 2
            }
        );
    }

    #[test]
    fn only_rising_series_is_insufficient() {
        let observations = series(&[(0, 50.0), (1, 55.0)]);

        assert_eq!(
            PairwiseMeanModel.estimate(&observations),
            RateEstimate::InsufficientData
        );
    }

    #[test]
    fn equal_levels_are_insufficient() {
        let observations = series(&[(0, 60.0), (1, 60.0)]);

        let estimate = PairwiseMeanModel.estimate(&observations);

        assert!(estimate.is_insufficient());
        assert_eq!(estimate.rate_per_day(), 0.0);
    }

    #[test]
    fn fewer_than_two_valid_readings_is_insufficient() {
        assert!(PairwiseMeanModel.estimate(&[]).is_insufficient());
        assert!(PairwiseMeanModel
            .estimate(&series(&[(0, 80.0)]))
            .is_insufficient());
        assert!(PairwiseMeanModel
            .estimate(&series(&[(0, 80.0), (1, 120.0)]))
            .is_insufficient());
    }

    #[test]
    fn duplicate_timestamps_do_not_divide_by_zero() {
        let observations = series(&[(0, 80.0), (0, 70.0), (2, 70.0)]);

        let estimate = PairwiseMeanModel.estimate(&observations);

        assert_relative_eq!(estimate.rate_per_day(), 5.0);
    }

    #[test]
    fn strictly_decreasing_series_is_positive() {
        let observations = series(&[(0, 95.0), (2, 91.0), (3, 88.5), (7, 80.0), (8, 79.9)]);

        let expected = (2.0 + 2.5 + 8.5 / 4.0 + 0.1) / 4.0;
        let estimate = PairwiseMeanModel.estimate(&observations);

        assert!(estimate.rate_per_day() > 0.0);
        assert_relative_eq!(estimate.rate_per_day(), expected, epsilon = 1e-9);
    }

    #[test]
    fn extreme_timestamps_yield_finite_rate() {
        let observations = vec![
            Observation::new(i64::MIN, 80.0),
            Observation::new(i64::MAX, 70.0),
        ];

        let estimate = PairwiseMeanModel.estimate(&observations);

        assert!(estimate.rate_per_day().is_finite());
        assert!(estimate.rate_per_day() > 0.0);
        assert_eq!(crate::estimation::estimate_rate(&observations), estimate.rate_per_day());
    }
}
