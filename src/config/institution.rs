use crate::{
    config::string_env_var_or,
    error::{InvalidTimezoneSnafu, TalabaResult},
};
use chrono::NaiveDate;
use jiff::{Zoned, civil::Date, tz::TimeZone};
use rust_decimal::Decimal;
use snafu::ResultExt;

pub const DEFAULT_ID_PREFIX: &str = "STU";

#[derive(Debug, Clone)]
pub struct InstitutionConfig {
    pub timezone: TimeZone,
    pub id_prefix: String,
    pub default_tuition_total: Decimal,
    pub default_registration_fee_total: Decimal,
}

impl InstitutionConfig {
    pub fn from_env() -> TalabaResult<Self> {
        let tz_name = string_env_var_or("TALABA_TIMEZONE", "UTC")?;
        let timezone = if tz_name.eq_ignore_ascii_case("UTC") {
            TimeZone::UTC
        } else {
            TimeZone::get(&tz_name).context(InvalidTimezoneSnafu {
                name: tz_name.clone(),
            })?
        };
        let id_prefix = string_env_var_or("TALABA_ID_PREFIX", DEFAULT_ID_PREFIX)?;

        Ok(Self {
            timezone,
            id_prefix,
            ..Self::default()
        })
    }

    /// The institution's current civil date.
    pub fn today(&self) -> Option<NaiveDate> {
        civil_to_naive(Zoned::now().with_time_zone(self.timezone.clone()).date())
    }
}

impl Default for InstitutionConfig {
    fn default() -> Self {
        Self {
            timezone: TimeZone::UTC,
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            default_tuition_total: Decimal::new(2800_00, 2),
            default_registration_fee_total: Decimal::new(300_00, 2),
        }
    }
}

pub fn civil_to_naive(date: Date) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
        i32::from(date.year()),
        u32::try_from(date.month()).ok()?,
        u32::try_from(date.day()).ok()?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    #[test]
    fn civil_dates_convert_exactly() {
        assert_eq!(
            civil_to_naive(date(2024, 2, 29)),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            civil_to_naive(date(1999, 12, 31)),
            NaiveDate::from_ymd_opt(1999, 12, 31)
        );
    }

    #[test]
    fn defaults_match_programme_fees() {
        let config = InstitutionConfig::default();
        assert_eq!(config.default_tuition_total.to_string(), "2800.00");
        assert_eq!(config.default_registration_fee_total.to_string(), "300.00");
        assert_eq!(config.id_prefix, "STU");
        assert!(config.today().is_some());
    }
}
