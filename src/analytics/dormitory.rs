use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

/// Calendar-month boundaries crossed between two dates. Day of month plays no
/// part: Jan 31 to Feb 1 is one month, Jan 1 to Jan 31 is zero. Negative when
/// `checkout` falls in an earlier month than `check_in`.
pub fn whole_months_between(check_in: NaiveDate, checkout: NaiveDate) -> i64 {
    let years = i64::from(checkout.year()) - i64::from(check_in.year());
    let months = i64::from(checkout.month()) - i64::from(check_in.month());
    years * 12 + months
}

/// Rent owed for a planned stay, billed in whole months.
///
/// Without a rate, a check-in date and a planned checkout date there is
/// nothing to bill, so the result is zero.
pub fn prorated_charge(
    monthly_rate: Option<Decimal>,
    check_in: Option<NaiveDate>,
    planned_checkout: Option<NaiveDate>,
) -> Decimal {
    let (Some(rate), Some(check_in), Some(checkout)) = (monthly_rate, check_in, planned_checkout)
    else {
        return Decimal::ZERO;
    };

    //NB: can be off by almost a month's rent at either end of the stay
    rate * Decimal::from(whole_months_between(check_in, checkout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::student::test_support::{date, money};

    #[test]
    fn day_of_month_is_ignored() {
        let owed = prorated_charge(
            Some(money(40_00)),
            Some(date(2024, 1, 15)),
            Some(date(2024, 3, 10)),
        );
        assert_eq!(owed, money(80_00));
    }

    #[test]
    fn same_calendar_month_is_free() {
        assert_eq!(whole_months_between(date(2024, 1, 5), date(2024, 1, 28)), 0);
        let owed = prorated_charge(
            Some(money(40_00)),
            Some(date(2024, 1, 5)),
            Some(date(2024, 1, 28)),
        );
        assert_eq!(owed, Decimal::ZERO);
    }

    #[test]
    fn one_night_over_a_month_end_is_a_month() {
        assert_eq!(whole_months_between(date(2024, 1, 31), date(2024, 2, 1)), 1);
    }

    #[test]
    fn years_roll_over() {
        assert_eq!(whole_months_between(date(2023, 11, 20), date(2024, 2, 3)), 3);
        assert_eq!(whole_months_between(date(2022, 9, 1), date(2024, 6, 30)), 21);
    }

    #[test]
    fn checkout_before_check_in_goes_negative() {
        assert_eq!(whole_months_between(date(2024, 5, 1), date(2024, 3, 1)), -2);
        let owed = prorated_charge(
            Some(money(80_00)),
            Some(date(2024, 5, 1)),
            Some(date(2024, 3, 1)),
        );
        assert_eq!(owed, money(-160_00));
    }

    #[test]
    fn anything_missing_means_nothing_owed() {
        let rate = Some(money(40_00));
        let from = Some(date(2024, 1, 1));
        let to = Some(date(2024, 6, 1));

        assert_eq!(prorated_charge(None, from, to), Decimal::ZERO);
        assert_eq!(prorated_charge(rate, None, to), Decimal::ZERO);
        assert_eq!(prorated_charge(rate, from, None), Decimal::ZERO);
    }

    #[test]
    fn zero_rate_is_a_real_rate() {
        let owed = prorated_charge(
            Some(Decimal::ZERO),
            Some(date(2024, 1, 1)),
            Some(date(2024, 6, 1)),
        );
        assert_eq!(owed, Decimal::ZERO);
    }
}
