use chrono::NaiveDate;

/// Registrations ending within this many days (or already ended) need attention.
pub const EXPIRY_WARNING_DAYS: i64 = 10;

///negative once `end_date` has passed; used for both registrations and visas
pub fn days_left(end_date: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    end_date.map(|end| (end - today).num_days())
}

pub fn is_expiring_soon(registration_end_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    days_left(registration_end_date, today).is_some_and(|days| days <= EXPIRY_WARNING_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::student::test_support::date;
    use chrono::Days;

    #[test]
    fn boundary_is_inclusive() {
        let today = date(2024, 12, 25);

        assert!(is_expiring_soon(today.checked_add_days(Days::new(10)), today));
        assert!(!is_expiring_soon(today.checked_add_days(Days::new(11)), today));
    }

    #[test]
    fn already_expired_counts() {
        let today = date(2024, 3, 1);
        let yesterday = date(2024, 2, 29);

        assert_eq!(days_left(Some(yesterday), today), Some(-1));
        assert!(is_expiring_soon(Some(yesterday), today));
        assert!(is_expiring_soon(Some(today), today));
    }

    #[test]
    fn no_end_date_never_expires() {
        let today = date(2024, 3, 1);
        assert_eq!(days_left(None, today), None);
        assert!(!is_expiring_soon(None, today));
    }
}
