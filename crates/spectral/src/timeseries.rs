//! Spatial reduction of an index layer into a dated series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::index::IndexLayer;

/// Spatial mean of one time slice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    /// Acquisition day (UTC)
    pub date: NaiveDate,
    /// Mean index, rounded to 4 decimal places
    pub value: f64,
}

/// Round half away from zero to 4 decimal places.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Mean of the finite values of `values`, accumulated in f64.
///
/// `None` when no value is finite.
pub fn mean_finite(values: &[f32]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0f64, 0usize), |(s, n), &v| (s + v as f64, n + 1));
    (count > 0).then(|| sum / count as f64)
}

/// One point per time slice that has at least one valid pixel, sorted by
/// acquisition time.
///
/// Slices with no valid pixels are dropped. Scenes acquired on the same day
/// each keep their own point.
pub fn reduce(layer: &IndexLayer) -> Vec<TimeSeriesPoint> {
    let mut points: Vec<_> = layer
        .slices()
        .filter_map(|(time, slice)| mean_finite(slice).map(|mean| (time, mean)))
        .collect();
    points.sort_by_key(|(time, _)| *time);
    points
        .into_iter()
        .map(|(time, mean)| TimeSeriesPoint {
            date: time.date_naive(),
            value: round4(mean),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_round4_half_away_from_zero() {
        assert_eq!(round4(0.12345), 0.1235);
        assert_eq!(round4(-0.12345), -0.1235);
        assert_eq!(round4(0.5), 0.5);
    }

    #[test]
    fn test_round4_idempotent() {
        for v in [0.61234567, -0.33339999, 0.99995, 0.0, 1e-5] {
            let once = round4(v);
            assert_eq!(round4(once), once);
        }
    }

    #[test]
    fn test_mean_skips_nan() {
        assert_eq!(mean_finite(&[0.2, f32::NAN, 0.4]).map(round4), Some(0.3));
        assert_eq!(mean_finite(&[f32::NAN, f32::NAN]), None);
        assert_eq!(mean_finite(&[]), None);
    }

    #[test]
    fn test_empty_slices_dropped() {
        let layer = IndexLayer::from_parts(
            vec![at(1, 10), at(2, 10)],
            2,
            1,
            vec![f32::NAN, f32::NAN, 0.5, 0.5],
        )
        .unwrap();
        let points = reduce(&layer);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 7, 2).unwrap());
        assert_eq!(points[0].value, 0.5);
    }

    #[test]
    fn test_sorted_and_same_day_kept() {
        let layer = IndexLayer::from_parts(
            vec![at(9, 10), at(3, 15), at(3, 10)],
            1,
            1,
            vec![0.9, 0.35, 0.3],
        )
        .unwrap();
        let points = reduce(&layer);
        let dates: Vec<_> = points.iter().map(|p| p.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-07-03", "2024-07-03", "2024-07-09"]);
        // Same-day points stay in acquisition order
        assert_eq!(points[0].value, 0.3);
        assert_eq!(points[1].value, 0.35);
    }
}
