//! Mood trend bucketing across many entries.
//!
//! Scores are grouped by calendar day and emotion and averaged. Days
//! without entries are omitted; an emotion that has no scores on a day
//! that does have entries is reported as `None`, never `0`.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::Serialize;

use crate::emotion::Emotion;
use crate::error::CoreError;
use crate::types::EntryDate;

/// Longest span a single trend query may cover.
pub const MAX_RANGE_DAYS: i64 = 366;

/// Default window for rolling queries.
pub const DEFAULT_TREND_DAYS: i64 = 30;

// ---------------------------------------------------------------------------
// Date ranges
// ---------------------------------------------------------------------------

/// Inclusive calendar-day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: EntryDate,
    pub end: EntryDate,
}

impl DateRange {
    /// Explicit `[start, end]` range.
    pub fn new(start: EntryDate, end: EntryDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::Validation(format!(
                "start date {start} is after end date {end}"
            )));
        }
        let span = (end - start).num_days() + 1;
        if span > MAX_RANGE_DAYS {
            return Err(CoreError::Validation(format!(
                "date range spans {span} days, maximum is {MAX_RANGE_DAYS}"
            )));
        }
        Ok(Self { start, end })
    }

    /// The `days` calendar days ending at (and including) `today`.
    pub fn last_days(today: EntryDate, days: i64) -> Result<Self, CoreError> {
        if !(1..=MAX_RANGE_DAYS).contains(&days) {
            return Err(CoreError::Validation(format!(
                "days must be between 1 and {MAX_RANGE_DAYS}, got {days}"
            )));
        }
        Self::new(today - Duration::days(days - 1), today)
    }

    pub fn contains(&self, date: EntryDate) -> bool {
        self.start <= date && date <= self.end
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// One persisted score, tagged with the day of its entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSample {
    pub date: EntryDate,
    pub emotion: Emotion,
    pub intensity: f64,
}

/// One day's averages for the requested emotions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: EntryDate,
    pub values: BTreeMap<Emotion, Option<f64>>,
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Bucket samples by day and emotion.
///
/// * `entry_dates` - the day of every entry in range (duplicates allowed).
///   Each distinct day produces exactly one point.
/// * `samples` - scores for those entries. Samples for emotions outside
///   `emotions`, or for days absent from `entry_dates`, are skipped.
/// * `emotions` - the emotions to report on every point.
pub fn bucket_by_day(
    entry_dates: &[EntryDate],
    samples: &[ScoreSample],
    emotions: &[Emotion],
) -> Vec<TrendPoint> {
    let mut days: BTreeMap<EntryDate, BTreeMap<Emotion, (f64, u32)>> = entry_dates
        .iter()
        .map(|date| (*date, BTreeMap::new()))
        .collect();

    for sample in samples {
        if !emotions.contains(&sample.emotion) {
            continue;
        }
        let Some(bucket) = days.get_mut(&sample.date) else {
            continue;
        };
        let acc = bucket.entry(sample.emotion).or_insert((0.0, 0));
        acc.0 += sample.intensity;
        acc.1 += 1;
    }

    days.into_iter()
        .map(|(date, bucket)| TrendPoint {
            date,
            values: emotions
                .iter()
                .map(|emotion| {
                    let mean = bucket
                        .get(emotion)
                        .map(|(sum, count)| round2(sum / f64::from(*count)));
                    (*emotion, mean)
                })
                .collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn day(d: u32) -> EntryDate {
        EntryDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn sample(d: u32, emotion: Emotion, intensity: f64) -> ScoreSample {
        ScoreSample {
            date: day(d),
            emotion,
            intensity,
        }
    }

    // -- Date ranges -------------------------------------------------------

    #[test]
    fn last_days_includes_today() {
        let range = DateRange::last_days(day(10), 3).unwrap();
        assert_eq!(range.start, day(8));
        assert_eq!(range.end, day(10));
        assert!(range.contains(day(8)));
        assert!(!range.contains(day(7)));
    }

    #[test]
    fn last_days_rejects_out_of_bounds() {
        assert_matches!(DateRange::last_days(day(10), 0), Err(CoreError::Validation(_)));
        assert_matches!(
            DateRange::last_days(day(10), MAX_RANGE_DAYS + 1),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert_matches!(DateRange::new(day(5), day(4)), Err(CoreError::Validation(_)));
    }

    #[test]
    fn single_day_range_is_allowed() {
        assert!(DateRange::new(day(5), day(5)).is_ok());
    }

    // -- Bucketing ---------------------------------------------------------

    #[test]
    fn averages_same_day_scores() {
        let dates = [day(1), day(1), day(1)];
        let samples = [
            sample(1, Emotion::Joy, 0.2),
            sample(1, Emotion::Joy, 0.4),
            sample(1, Emotion::Joy, 0.6),
        ];
        let points = bucket_by_day(&dates, &samples, &[Emotion::Joy]);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].values[&Emotion::Joy], Some(0.4));
    }

    #[test]
    fn days_without_entries_are_omitted() {
        let dates = [day(1), day(3)];
        let samples = [sample(1, Emotion::Joy, 0.5), sample(3, Emotion::Joy, 0.7)];
        let points = bucket_by_day(&dates, &samples, &[Emotion::Joy]);
        let days: Vec<EntryDate> = points.iter().map(|p| p.date).collect();
        assert_eq!(days, vec![day(1), day(3)]);
    }

    #[test]
    fn missing_emotion_is_none_not_zero() {
        let dates = [day(2)];
        let samples = [sample(2, Emotion::Joy, 0.0)];
        let points = bucket_by_day(&dates, &samples, &[Emotion::Joy, Emotion::Fear]);
        assert_eq!(points[0].values[&Emotion::Joy], Some(0.0));
        assert_eq!(points[0].values[&Emotion::Fear], None);
    }

    #[test]
    fn day_with_entries_but_no_requested_scores_is_all_none() {
        let dates = [day(4)];
        let samples = [sample(4, Emotion::Anger, 0.9)];
        let points = bucket_by_day(&dates, &samples, &[Emotion::Joy]);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].values[&Emotion::Joy], None);
        assert!(!points[0].values.contains_key(&Emotion::Anger));
    }

    #[test]
    fn output_is_sorted_ascending_by_day() {
        let dates = [day(9), day(2), day(5)];
        let points = bucket_by_day(&dates, &[], &[Emotion::Joy]);
        let days: Vec<EntryDate> = points.iter().map(|p| p.date).collect();
        assert_eq!(days, vec![day(2), day(5), day(9)]);
    }

    #[test]
    fn means_are_rounded_to_two_places() {
        let dates = [day(1)];
        let samples = [
            sample(1, Emotion::Sadness, 0.1),
            sample(1, Emotion::Sadness, 0.2),
            sample(1, Emotion::Sadness, 0.2),
        ];
        let points = bucket_by_day(&dates, &samples, &[Emotion::Sadness]);
        assert_eq!(points[0].values[&Emotion::Sadness], Some(0.17));
    }

    #[test]
    fn no_entries_yields_no_points() {
        assert!(bucket_by_day(&[], &[sample(1, Emotion::Joy, 0.5)], &[Emotion::Joy]).is_empty());
    }

    #[test]
    fn serializes_missing_values_as_null() {
        let points = bucket_by_day(&[day(1)], &[], &[Emotion::Joy]);
        let json = serde_json::to_value(&points[0]).unwrap();
        assert_eq!(json["date"], "2025-03-01");
        assert!(json["values"]["joy"].is_null());
    }
}
