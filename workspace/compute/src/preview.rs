use chrono::{Days, NaiveDate};
use common::{PreviewInput, PreviewPoint, PreviewSeries};
use rand::Rng;
use tracing::{debug, instrument, trace};

/// Longest series the generator emits, whatever the requested range.
pub const MAX_POINTS: usize = 30;

/// Lower bound of the unscaled daily sales figure.
pub const BASELINE_SALES: f64 = 1000.0;

/// Width of the random band added on top of the baseline.
pub const SALES_SPREAD: f64 = 500.0;

/// Days after today used as the end date when the draft has none.
pub const DEFAULT_HORIZON_DAYS: u64 = 30;

/// Synthesizes the daily sales chart shown next to the scenario form.
///
/// The numbers are cosmetic: a uniform draw between the baseline and
/// baseline + spread, scaled by the scenario's multiplier. "Today" is fixed at
/// construction so callers and tests control which dates fill in for a
/// missing start or end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewGenerator {
    today: NaiveDate,
    max_points: usize,
}

impl PreviewGenerator {
    /// Creates a generator that resolves missing dates relative to `today`.
    pub fn new_with_today(today: NaiveDate) -> Self {
        Self {
            today,
            max_points: MAX_POINTS,
        }
    }

    /// Overrides the point cap. A cap of zero is raised to one.
    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points.max(1);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Start and end dates after filling in the defaults.
    pub fn effective_range(&self, input: &PreviewInput) -> (NaiveDate, NaiveDate) {
        let start = input.start.unwrap_or(self.today);
        let end = input.end.unwrap_or_else(|| {
            self.today
                .checked_add_days(Days::new(DEFAULT_HORIZON_DAYS))
                .unwrap_or(NaiveDate::MAX)
        });
        (start, end)
    }

    /// Number of points the series for `input` will contain.
    ///
    /// Counts the calendar days from start to end inclusive, never less than
    /// one (an inverted range still yields a single point) and never more
    /// than the cap.
    pub fn point_count(&self, input: &PreviewInput) -> usize {
        let (start, end) = self.effective_range(input);
        let span = (end - start).num_days().saturating_add(1).max(1);
        usize::try_from(span).unwrap_or(usize::MAX).min(self.max_points)
    }

    /// Generates a fresh series, drawing sales figures from `rng`.
    #[instrument(skip(self, rng), fields(today = %self.today))]
    pub fn generate<R>(&self, input: &PreviewInput, rng: &mut R) -> PreviewSeries
    where
        R: Rng + ?Sized,
    {
        trace!("Entering generate");
        let (start, _) = self.effective_range(input);
        let count = self.point_count(input);
        debug!("Generating {} preview points from {}", count, start);

        let points: Vec<PreviewPoint> = start
            .iter_days()
            .take(count)
            .map(|date| PreviewPoint::new(date, daily_sales(rng.random::<f64>(), input.sales_multiplier)))
            .collect();

        PreviewSeries::new(points)
    }

    /// Generates a series from the thread-local RNG. Two calls with the same
    /// input give different numbers.
    pub fn generate_random(&self, input: &PreviewInput) -> PreviewSeries {
        let mut rng = rand::rng();
        self.generate(input, &mut rng)
    }
}

/// Sales figure for a uniform draw `r` in `[0, 1)`.
fn daily_sales(r: f64, multiplier: f64) -> u64 {
    let value = ((BASELINE_SALES + r * SALES_SPREAD) * multiplier).round();
    // NaN and negative multipliers collapse to zero.
    if value > 0.0 { value as u64 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input(start: Option<NaiveDate>, end: Option<NaiveDate>, multiplier: f64) -> PreviewInput {
        PreviewInput {
            start,
            end,
            sales_multiplier: multiplier,
        }
    }

    fn generator() -> PreviewGenerator {
        PreviewGenerator::new_with_today(date(2024, 6, 15))
    }

    #[test]
    fn test_five_day_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let series = generator().generate(
            &input(Some(date(2024, 1, 1)), Some(date(2024, 1, 5)), 2.0),
            &mut rng,
        );

        assert_eq!(series.len(), 5);
        assert_eq!(series.first_date(), Some(date(2024, 1, 1)));
        assert_eq!(series.last_date(), Some(date(2024, 1, 5)));
        for point in series.iter() {
            assert!((2000..=3000).contains(&point.sales), "out of band: {}", point.sales);
        }
    }

    #[test]
    fn test_consecutive_dates() {
        let mut rng = StdRng::seed_from_u64(1);
        let series = generator().generate(
            &input(Some(date(2024, 2, 25)), Some(date(2024, 3, 5)), 1.0),
            &mut rng,
        );

        // 2024 is a leap year: Feb 25..=Mar 5 covers 10 days.
        assert_eq!(series.len(), 10);
        for (i, point) in series.iter().enumerate() {
            assert_eq!(point.date, date(2024, 2, 25) + Days::new(i as u64));
        }
        for pair in series.points().windows(2) {
            assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
        }
    }

    #[test]
    fn test_long_range_capped() {
        let mut rng = StdRng::seed_from_u64(3);
        let series = generator().generate(
            &input(Some(date(2024, 1, 1)), Some(date(2024, 12, 31)), 1.0),
            &mut rng,
        );
        assert_eq!(series.len(), MAX_POINTS);
        assert_eq!(series.first_date(), Some(date(2024, 1, 1)));
        assert_eq!(series.last_date(), Some(date(2024, 1, 30)));
    }

    #[test]
    fn test_single_day_and_inverted_ranges() {
        let generator = generator();
        let same_day = input(Some(date(2024, 1, 1)), Some(date(2024, 1, 1)), 1.0);
        assert_eq!(generator.point_count(&same_day), 1);

        let inverted = input(Some(date(2024, 1, 10)), Some(date(2024, 1, 1)), 1.0);
        let mut rng = StdRng::seed_from_u64(9);
        let series = generator.generate(&inverted, &mut rng);
        assert_eq!(series.len(), 1);
        assert_eq!(series.first_date(), Some(date(2024, 1, 10)));
    }

    #[test]
    fn test_missing_dates_fall_back_to_today() {
        let generator = generator();
        let (start, end) = generator.effective_range(&input(None, None, 1.0));
        assert_eq!(start, date(2024, 6, 15));
        assert_eq!(end, date(2024, 7, 15));
        assert_eq!(generator.point_count(&input(None, None, 1.0)), MAX_POINTS);

        let (start, end) = generator.effective_range(&input(None, Some(date(2024, 6, 17)), 1.0));
        assert_eq!(start, date(2024, 6, 15));
        assert_eq!(end, date(2024, 6, 17));
        assert_eq!(generator.point_count(&input(None, Some(date(2024, 6, 17)), 1.0)), 3);
    }

    #[test]
    fn test_span_lengths() {
        let generator = generator();
        let start = date(2024, 1, 1);
        for days in 1..=40u64 {
            let end = start + Days::new(days - 1);
            let expected = (days as usize).min(MAX_POINTS);
            assert_eq!(
                generator.point_count(&input(Some(start), Some(end), 1.0)),
                expected,
                "span of {} days",
                days
            );
        }
    }

    #[test]
    fn test_sales_band_scales_with_multiplier() {
        let generator = generator();
        let mut rng = StdRng::seed_from_u64(11);
        for multiplier in [0.5, 1.0, 1.7, 3.0] {
            let series = generator.generate(
                &input(Some(date(2024, 1, 1)), Some(date(2024, 1, 30)), multiplier),
                &mut rng,
            );
            let low = (BASELINE_SALES * multiplier).floor() as u64;
            let high = ((BASELINE_SALES + SALES_SPREAD) * multiplier).ceil() as u64;
            for point in series.iter() {
                assert!(point.sales >= low && point.sales <= high);
            }
        }
    }

    #[test]
    fn test_daily_sales_rounding() {
        assert_eq!(daily_sales(0.0, 1.0), 1000);
        assert_eq!(daily_sales(0.5, 1.0), 1250);
        assert_eq!(daily_sales(0.999, 2.0), 2999);
        assert_eq!(daily_sales(0.001, 1.5), 1501);
        assert_eq!(daily_sales(0.3, -1.0), 0);
        assert_eq!(daily_sales(0.3, f64::NAN), 0);
    }

    #[test]
    fn test_seeded_generation_is_repeatable() {
        let generator = generator();
        let request = input(Some(date(2024, 1, 1)), Some(date(2024, 1, 7)), 1.2);
        let first = generator.generate(&request, &mut StdRng::seed_from_u64(42));
        let second = generator.generate(&request, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_cap() {
        let generator = generator().with_max_points(0);
        assert_eq!(generator.point_count(&input(None, None, 1.0)), 1);

        let generator = PreviewGenerator::new_with_today(date(2024, 1, 1)).with_max_points(7);
        let series = generator.generate_random(&input(None, None, 1.0));
        assert_eq!(series.len(), 7);
    }
}
