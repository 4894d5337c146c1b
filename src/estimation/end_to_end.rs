//! End-to-end slope consumption model.
//!
//! Formula: `(first.level - last.level) / days(first, last)` over the sorted,
//! de-duplicated series. Intermediate readings only matter through the
//! endpoints, so a refill inside the window lowers the rate.

use crate::estimation::END_TO_END;
use crate::estimation::model::{RateEstimate, RateModel, day_gap, prepare_observations};
use crate::state::Observation;

#[derive(Debug, Clone, Copy, Default)]
pub struct EndToEndModel;

impl RateModel for EndToEndModel {
    fn name(&self) -> &'static str {
        END_TO_END
    }

    fn estimate(&self, observations: &[Observation]) -> RateEstimate {
        let prepared = prepare_observations(observations);
        let (Some(first), Some(last)) = (prepared.first(), prepared.last()) else {
            return RateEstimate::InsufficientData;
        };
        if prepared.len() < 2 {
            return RateEstimate::InsufficientData;
        }

        let gap = day_gap(first, last);
        if gap <= 0.0 {
            return RateEstimate::InsufficientData;
        }

        RateEstimate::from_rate((first.level - last.level) / gap, prepared.len() - 1)
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
    fn slope_uses_only_endpoints() {
        let observations = series(&[(0, 80.0), (1, 70.0), (4, 64.0)]);

        let estimate = EndToEndModel.estimate(&observations);

        assert_relative_eq!(estimate.rate_per_day(), 4.0);
        assert_eq!(
            estimate,
            RateEstimate::Measured {
                rate_per_day: 4.0,
                pairs: 2
            }
        );
    }

    #[test]
    fn net_rise_is_insufficient() {
        let observations = series(&[(0, 50.0), (1, 40.0), (2, 55.0)]);

        assert!(EndToEndModel.estimate(&observations).is_insufficient());
    }

    #[test]
    fn single_reading_is_insufficient() {
        assert!(EndToEndModel.estimate(&series(&[(0, 80.0)])).is_insufficient());
        assert!(EndToEndModel.estimate(&[]).is_insufficient());
    }
}
