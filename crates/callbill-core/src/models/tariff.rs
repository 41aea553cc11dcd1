//! Tariff schedule model
//!
//! Two alternating time-of-day bands: Standard during the day and Reduced
//! overnight, the latter wrapping past midnight. Each band has a standing
//! charge (applied once per call, by the band active at call start) and a
//! per-minute charge.

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::TariffConfig;
use crate::{AppError, AppResult};

/// Clock format used for band boundaries in configuration
const CLOCK_FORMAT: &str = "%H:%M";

/// Time-of-day rate band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TariffBand {
    /// Day band
    Standard,
    /// Night band, spans midnight
    Reduced,
}

impl TariffBand {
    /// The band that follows this one
    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            Self::Standard => Self::Reduced,
            Self::Reduced => Self::Standard,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Reduced => "reduced",
        }
    }
}

/// Charges of a single band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandRate {
    /// Flat fee charged once per call
    pub standing_charge: Decimal,

    /// Charge per whole minute spent in the band
    pub minute_charge: Decimal,
}

impl BandRate {
    pub fn new(standing_charge: Decimal, minute_charge: Decimal) -> Self {
        Self {
            standing_charge,
            minute_charge,
        }
    }
}

/// Band boundary instants anchored to a reference instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandBoundaries {
    /// Start of the Standard band on the reference date
    pub standard_start: NaiveDateTime,

    /// End of the Standard band on the reference date
    pub standard_end: NaiveDateTime,

    /// End of the Reduced band; on the following date when the reference
    /// is at or after `standard_start`
    pub reduced_end: NaiveDateTime,
}

/// Immutable tariff schedule
///
/// Band membership is decided on the clock minute: an instant is Standard
/// when its `HH:MM` lies within `standard_start..=standard_end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TariffSchedule {
    standard_start: NaiveTime,
    standard_end: NaiveTime,
    standard: BandRate,
    reduced: BandRate,
}

impl TariffSchedule {
    /// Create a schedule, validating the band window and charges
    ///
    /// # Errors
    /// Returns `AppError::Config` when a boundary is not a whole minute,
    /// the Standard window is empty or starts at midnight, or a charge is
    /// negative.
    pub fn new(
        standard_start: NaiveTime,
        standard_end: NaiveTime,
        standard: BandRate,
        reduced: BandRate,
    ) -> AppResult<Self> {
        for time in [standard_start, standard_end] {
            if time.second() != 0 || time.nanosecond() != 0 {
                return Err(AppError::Config(format!(
                    "Tariff boundary {} must be a whole minute",
                    time
                )));
            }
        }

        if standard_start == NaiveTime::MIN {
            return Err(AppError::Config(
                "Standard band cannot start at midnight".to_string(),
            ));
        }

        if standard_start > standard_end {
            return Err(AppError::Config(format!(
                "Standard band start {} is after its end {}",
                standard_start, standard_end
            )));
        }

        for rate in [&standard, &reduced] {
            if rate.standing_charge < Decimal::ZERO || rate.minute_charge < Decimal::ZERO {
                return Err(AppError::Config(
                    "Tariff charges must not be negative".to_string(),
                ));
            }
        }

        Ok(Self {
            standard_start,
            standard_end,
            standard,
            reduced,
        })
    }

    /// Build a schedule from configuration
    pub fn from_config(config: &TariffConfig) -> AppResult<Self> {
        Self::new(
            parse_clock(&config.standard_start)?,
            parse_clock(&config.standard_end)?,
            BandRate::new(
                config.standard_standing_charge,
                config.standard_minute_charge,
            ),
            BandRate::new(config.reduced_standing_charge, config.reduced_minute_charge),
        )
    }

    /// Classify an instant by its clock minute
    pub fn band_at(&self, instant: NaiveDateTime) -> TariffBand {
        let minute = instant
            .time()
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(NaiveTime::MIN);

        if self.standard_start <= minute && minute <= self.standard_end {
            TariffBand::Standard
        } else {
            TariffBand::Reduced
        }
    }

    /// Charges of a band
    #[inline]
    pub fn rate(&self, band: TariffBand) -> &BandRate {
        match band {
            TariffBand::Standard => &self.standard,
            TariffBand::Reduced => &self.reduced,
        }
    }

    pub fn standard_start(&self) -> NaiveTime {
        self.standard_start
    }

    pub fn standard_end(&self) -> NaiveTime {
        self.standard_end
    }

    /// Last clock minute of the Reduced band (the minute before Standard)
    pub fn reduced_end(&self) -> NaiveTime {
        self.standard_start - Duration::minutes(1)
    }

    /// Boundary instants anchored to the reference instant's date
    ///
    /// Boundaries carry the reference's second-of-minute, so segments cut
    /// at them from a call start always span whole minutes.
    ///
    /// # Errors
    /// Returns `AppError::InvalidInput` when a boundary falls outside the
    /// representable date range.
    pub fn boundaries(&self, reference: NaiveDateTime) -> AppResult<BandBoundaries> {
        let date = reference.date();
        let offset = Duration::seconds(i64::from(reference.second()));
        let anchor = |time: NaiveTime| shift_instant(date.and_time(time), offset);

        let standard_start = anchor(self.standard_start)?;
        let standard_end = anchor(self.standard_end)?;
        let mut reduced_end = anchor(self.reduced_end())?;

        if reference >= standard_start {
            reduced_end = shift_instant(reduced_end, Duration::days(1))?;
        }

        Ok(BandBoundaries {
            standard_start,
            standard_end,
            reduced_end,
        })
    }
}

/// Move an instant, rejecting results outside the supported range
pub fn shift_instant(instant: NaiveDateTime, by: Duration) -> AppResult<NaiveDateTime> {
    instant.checked_add_signed(by).ok_or_else(|| {
        AppError::InvalidInput(format!("Instant {} is out of the supported range", instant))
    })
}

impl Default for TariffSchedule {
    fn default() -> Self {
        Self {
            standard_start: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or(NaiveTime::MIN),
            standard_end: NaiveTime::from_hms_opt(21, 59, 0).unwrap_or(NaiveTime::MIN),
            standard: BandRate::new(Decimal::new(36, 2), Decimal::new(9, 2)),
            reduced: BandRate::new(Decimal::new(36, 2), Decimal::ZERO),
        }
    }
}

fn parse_clock(value: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), CLOCK_FORMAT).map_err(|e| {
        AppError::Config(format!(
            "Invalid tariff clock time '{}' (expected HH:MM): {}",
            value, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_reference_tariff() {
        let schedule = TariffSchedule::default();
        assert_eq!(
            schedule.rate(TariffBand::Standard),
            &BandRate::new(dec!(0.36), dec!(0.09))
        );
        assert_eq!(
            schedule.rate(TariffBand::Reduced),
            &BandRate::new(dec!(0.36), dec!(0.00))
        );
        assert_eq!(
            schedule.reduced_end(),
            NaiveTime::from_hms_opt(5, 59, 0).unwrap()
        );
    }

    #[test]
    fn test_from_config_matches_default() {
        let schedule = TariffSchedule::from_config(&TariffConfig::default()).unwrap();
        assert_eq!(schedule, TariffSchedule::default());
    }

    #[test]
    fn test_band_at_edges() {
        let schedule = TariffSchedule::default();
        assert_eq!(schedule.band_at(at(2018, 10, 18, 5, 59, 59)), TariffBand::Reduced);
        assert_eq!(schedule.band_at(at(2018, 10, 18, 6, 0, 0)), TariffBand::Standard);
        assert_eq!(schedule.band_at(at(2018, 10, 18, 12, 1, 45)), TariffBand::Standard);
        assert_eq!(schedule.band_at(at(2018, 10, 18, 21, 59, 59)), TariffBand::Standard);
        assert_eq!(schedule.band_at(at(2018, 10, 18, 22, 0, 0)), TariffBand::Reduced);
        assert_eq!(schedule.band_at(at(2018, 10, 18, 0, 0, 0)), TariffBand::Reduced);
    }

    #[test]
    fn test_boundaries_during_standard() {
        let schedule = TariffSchedule::default();
        let bounds = schedule.boundaries(at(2018, 10, 25, 19, 56, 23)).unwrap();

        assert_eq!(bounds.standard_start, at(2018, 10, 25, 6, 0, 23));
        assert_eq!(bounds.standard_end, at(2018, 10, 25, 21, 59, 23));
        // Day calls look at the following night
        assert_eq!(bounds.reduced_end, at(2018, 10, 26, 5, 59, 23));
    }

    #[test]
    fn test_boundaries_early_morning() {
        let schedule = TariffSchedule::default();
        let bounds = schedule.boundaries(at(2018, 10, 30, 5, 30, 4)).unwrap();

        assert_eq!(bounds.reduced_end, at(2018, 10, 30, 5, 59, 4));
        assert_eq!(bounds.standard_end, at(2018, 10, 30, 21, 59, 4));
    }

    #[test]
    fn test_boundaries_late_evening() {
        let schedule = TariffSchedule::default();
        let bounds = schedule.boundaries(at(2018, 10, 30, 23, 10, 0)).unwrap();

        assert_eq!(bounds.reduced_end, at(2018, 10, 31, 5, 59, 0));
        assert_eq!(bounds.standard_end, at(2018, 10, 30, 21, 59, 0));
    }

    #[test]
    fn test_boundaries_at_end_of_calendar() {
        let schedule = TariffSchedule::default();
        let last_day = NaiveDate::MAX;

        // The following night's end lies past the last representable date
        let evening = last_day.and_hms_opt(12, 0, 0).unwrap();
        assert!(matches!(
            schedule.boundaries(evening),
            Err(AppError::InvalidInput(_))
        ));

        // Before 06:00 every boundary stays on the same date
        let early = last_day.and_hms_opt(3, 0, 0).unwrap();
        assert!(schedule.boundaries(early).is_ok());
    }

    #[test]
    fn test_invalid_schedules() {
        let rate = BandRate::new(dec!(0.36), dec!(0.09));
        let six = NaiveTime::from_hms_opt(6, 0, 0).unwrap();
        let ten_pm = NaiveTime::from_hms_opt(21, 59, 0).unwrap();

        assert!(TariffSchedule::new(ten_pm, six, rate, rate).is_err());
        assert!(TariffSchedule::new(NaiveTime::MIN, ten_pm, rate, rate).is_err());
        assert!(TariffSchedule::new(
            NaiveTime::from_hms_opt(6, 0, 30).unwrap(),
            ten_pm,
            rate,
            rate
        )
        .is_err());
        assert!(TariffSchedule::new(
            six,
            ten_pm,
            rate,
            BandRate::new(dec!(0.36), dec!(-0.01))
        )
        .is_err());
    }

    #[test]
    fn test_invalid_clock_config() {
        let config = TariffConfig {
            standard_start: "6h".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            TariffSchedule::from_config(&config),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_band_toggle() {
        assert_eq!(TariffBand::Standard.toggled(), TariffBand::Reduced);
        assert_eq!(TariffBand::Reduced.toggled(), TariffBand::Standard);
        assert_eq!(TariffBand::Reduced.as_str(), "reduced");
    }
}
