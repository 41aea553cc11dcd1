//! Band splitting
//!
//! Cuts a call into consecutive Standard/Reduced segments. Boundaries are
//! anchored to the call start and move forward one day each time they are
//! crossed, so calls spanning several days alternate between the two
//! windows without re-classifying every segment.

use callbill_core::{
    models::{shift_instant, TariffBand, TariffSchedule},
    AppError, AppResult,
};
use chrono::{Duration, NaiveDateTime, SubsecRound};
use serde::Serialize;

/// Longest call accepted for splitting
pub const MAX_CALL_DAYS: i64 = 366;

/// A contiguous stretch of a call within one band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BandSegment {
    pub band: TariffBand,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Whole elapsed minutes, truncated
    pub minutes: i64,
}

impl BandSegment {
    fn new(band: TariffBand, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            band,
            start,
            end,
            minutes: (end - start).num_seconds() / 60,
        }
    }
}

/// Result of splitting a call across bands
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BandSplit {
    /// Band active at call start; decides the standing charge
    pub opening_band: TariffBand,

    /// Ordered, contiguous segments covering the call
    pub segments: Vec<BandSegment>,
}

impl BandSplit {
    pub fn total_minutes(&self) -> i64 {
        self.segments.iter().map(|s| s.minutes).sum()
    }

    /// Minutes billed in one band
    pub fn minutes_in(&self, band: TariffBand) -> i64 {
        self.segments
            .iter()
            .filter(|s| s.band == band)
            .map(|s| s.minutes)
            .sum()
    }
}

/// Splits calls against a tariff schedule
#[derive(Debug, Clone, Copy)]
pub struct BandSplitter<'a> {
    schedule: &'a TariffSchedule,
}

impl<'a> BandSplitter<'a> {
    pub fn new(schedule: &'a TariffSchedule) -> Self {
        Self { schedule }
    }

    /// Split the call `start..end` into band segments
    ///
    /// Instants are truncated to whole seconds. A zero-length call yields
    /// no segments.
    ///
    /// # Errors
    /// Returns `AppError::InvalidInput` when `end` precedes `start`, the
    /// call lasts longer than [`MAX_CALL_DAYS`], or a band boundary falls
    /// outside the representable date range.
    pub fn split(&self, start: NaiveDateTime, end: NaiveDateTime) -> AppResult<BandSplit> {
        let start = start.trunc_subsecs(0);
        let end = end.trunc_subsecs(0);

        if end < start {
            return Err(AppError::InvalidInput(format!(
                "Call end {} is before its start {}",
                end, start
            )));
        }

        if end - start > Duration::days(MAX_CALL_DAYS) {
            return Err(AppError::InvalidInput(format!(
                "Call from {} to {} exceeds {} days",
                start, end, MAX_CALL_DAYS
            )));
        }

        let opening_band = self.schedule.band_at(start);
        let bounds = self.schedule.boundaries(start)?;

        let mut standard_end = bounds.standard_end;
        let mut reduced_end = bounds.reduced_end;

        // Evening starts: the next Standard window ends tomorrow
        if start > standard_end {
            standard_end = shift_instant(standard_end, Duration::days(1))?;
        }

        let mut segments = Vec::new();
        let mut band = opening_band;
        let mut cursor = start;

        while cursor < end {
            let boundary = match band {
                TariffBand::Standard => &mut standard_end,
                TariffBand::Reduced => &mut reduced_end,
            };

            let segment_end = (*boundary).min(end);
            if segment_end > cursor {
                segments.push(BandSegment::new(band, cursor, segment_end));
            }

            cursor = segment_end;
            if cursor < end {
                *boundary = shift_instant(*boundary, Duration::days(1))?;
            }
            band = band.toggled();
        }

        Ok(BandSplit {
            opening_band,
            segments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    fn split(start: NaiveDateTime, end: NaiveDateTime) -> BandSplit {
        let schedule = TariffSchedule::default();
        BandSplitter::new(&schedule).split(start, end).unwrap()
    }

    fn shape(split: &BandSplit) -> Vec<(TariffBand, i64)> {
        split.segments.iter().map(|s| (s.band, s.minutes)).collect()
    }

    #[test]
    fn test_call_within_standard() {
        let result = split(at(2018, 10, 18, 12, 1, 45), at(2018, 10, 18, 12, 2, 45));
        assert_eq!(result.opening_band, TariffBand::Standard);
        assert_eq!(shape(&result), vec![(TariffBand::Standard, 1)]);
    }

    #[test]
    fn test_call_crossing_into_reduced() {
        let result = split(at(2018, 10, 25, 19, 56, 23), at(2018, 10, 25, 22, 0, 0));
        assert_eq!(
            shape(&result),
            vec![(TariffBand::Standard, 123), (TariffBand::Reduced, 0)]
        );
        assert_eq!(result.segments[0].end, at(2018, 10, 25, 21, 59, 23));
    }

    #[test]
    fn test_call_crossing_into_standard() {
        let result = split(at(2018, 10, 30, 5, 30, 4), at(2018, 10, 30, 6, 30, 26));
        assert_eq!(result.opening_band, TariffBand::Reduced);
        assert_eq!(
            shape(&result),
            vec![(TariffBand::Reduced, 29), (TariffBand::Standard, 31)]
        );
    }

    #[test]
    fn test_evening_call_stays_reduced() {
        let result = split(at(2017, 12, 12, 22, 47, 56), at(2017, 12, 12, 22, 50, 56));
        assert_eq!(result.opening_band, TariffBand::Reduced);
        assert_eq!(shape(&result), vec![(TariffBand::Reduced, 3)]);
    }

    #[test]
    fn test_call_over_midnight_into_morning() {
        let result = split(at(2018, 10, 30, 23, 10, 0), at(2018, 10, 31, 7, 0, 0));
        assert_eq!(
            shape(&result),
            vec![(TariffBand::Reduced, 409), (TariffBand::Standard, 61)]
        );
        assert_eq!(result.segments[1].start, at(2018, 10, 31, 5, 59, 0));
    }

    #[test]
    fn test_multi_day_call() {
        let result = split(at(2017, 12, 12, 21, 57, 13), at(2017, 12, 13, 22, 10, 56));
        assert_eq!(
            shape(&result),
            vec![
                (TariffBand::Standard, 2),
                (TariffBand::Reduced, 480),
                (TariffBand::Standard, 960),
                (TariffBand::Reduced, 11),
            ]
        );
        assert_eq!(result.total_minutes(), 1453);
        assert_eq!(result.minutes_in(TariffBand::Standard), 962);
    }

    #[test]
    fn test_zero_length_call() {
        let instant = at(2018, 11, 11, 19, 22, 16);
        let result = split(instant, instant);
        assert_eq!(result.opening_band, TariffBand::Standard);
        assert!(result.segments.is_empty());
        assert_eq!(result.total_minutes(), 0);
    }

    #[test]
    fn test_start_on_last_standard_minute() {
        // 21:59:30 is still Standard, but its window closes immediately
        let result = split(at(2018, 11, 11, 21, 59, 30), at(2018, 11, 11, 22, 5, 30));
        assert_eq!(result.opening_band, TariffBand::Standard);
        assert_eq!(shape(&result), vec![(TariffBand::Reduced, 6)]);
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let schedule = TariffSchedule::default();
        let result = BandSplitter::new(&schedule)
            .split(at(2018, 11, 11, 10, 0, 0), at(2018, 11, 11, 9, 59, 59));
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_call_length_is_capped() {
        let schedule = TariffSchedule::default();
        let splitter = BandSplitter::new(&schedule);
        let start = at(2018, 1, 1, 12, 0, 0);

        let longest = splitter.split(start, start + Duration::days(MAX_CALL_DAYS)).unwrap();
        assert!(longest.segments.len() <= 2 * MAX_CALL_DAYS as usize + 2);

        let too_long = splitter.split(start, start + Duration::days(MAX_CALL_DAYS) + Duration::seconds(1));
        assert!(matches!(too_long, Err(AppError::InvalidInput(_))));

        let whole_calendar = splitter.split(at(1, 1, 1, 0, 0, 0), at(9999, 12, 31, 23, 59, 59));
        assert!(matches!(whole_calendar, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_call_at_end_of_calendar_is_rejected() {
        let schedule = TariffSchedule::default();
        let start = NaiveDate::MAX.and_hms_opt(12, 0, 0).unwrap();

        let result = BandSplitter::new(&schedule).split(start, start + Duration::minutes(5));
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_subseconds_are_truncated() {
        let start = at(2018, 10, 18, 12, 1, 45) + Duration::milliseconds(900);
        let end = at(2018, 10, 18, 12, 2, 45) + Duration::milliseconds(100);
        let result = split(start, end);
        assert_eq!(result.segments[0].start, at(2018, 10, 18, 12, 1, 45));
        assert_eq!(result.total_minutes(), 1);
    }
}
