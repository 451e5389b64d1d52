pub mod preview;

use chrono::{NaiveDate, Utc};

pub use preview::PreviewGenerator;

/// Returns a default pre-configured preview generator that will be used most of the time.
///
/// This function uses the provided date as "today" or the current date if none is provided.
pub fn default_generator(today: Option<NaiveDate>) -> PreviewGenerator {
    let today = today.unwrap_or_else(|| Utc::now().date_naive());
    PreviewGenerator::new_with_today(today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::PreviewInput;

    #[test]
    fn test_default_generator_uses_given_today() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 22).unwrap();
        let generator = default_generator(Some(today));
        assert_eq!(generator.today(), today);

        let series = generator.generate_random(&PreviewInput {
            start: None,
            end: None,
            sales_multiplier: 1.0,
        });
        assert_eq!(series.first_date(), Some(today));
        assert_eq!(series.len(), preview::MAX_POINTS);
    }
}
