use crate::{
    analytics::{dormitory::prorated_charge, registration},
    data::student::Student,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// What is still owed on each of a student's three ledgers.
///
/// A negative balance is an overpayment. It counts as paid, but does not
/// offset debt on the other ledgers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentBalances {
    #[serde(with = "rust_decimal::serde::float")]
    pub tuition_remaining: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub registration_remaining: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub dormitory_remaining: Decimal,
    pub fully_paid: bool,
}

impl StudentBalances {
    pub fn of(student: &Student) -> Self {
        let tuition_remaining = student.tuition_total - student.tuition_paid;
        let registration_remaining = student.registration_fee_total - student.registration_fee_paid;
        let dormitory_remaining = dormitory_remaining(student);

        Self {
            tuition_remaining,
            registration_remaining,
            dormitory_remaining,
            fully_paid: [tuition_remaining, registration_remaining, dormitory_remaining]
                .iter()
                .all(|remaining| *remaining <= Decimal::ZERO),
        }
    }

    ///sum of the debts, ignoring overpayments
    pub fn total_outstanding(&self) -> Decimal {
        [
            self.tuition_remaining,
            self.registration_remaining,
            self.dormitory_remaining,
        ]
        .into_iter()
        .map(owed)
        .sum()
    }
}

///clamps an overpayment to nothing owed
pub fn owed(remaining: Decimal) -> Decimal {
    remaining.max(Decimal::ZERO)
}

/// Rent still owed for the planned stay. Students outside the dormitory owe
/// nothing, whatever stale dormitory data their record still carries.
pub fn dormitory_remaining(student: &Student) -> Decimal {
    if !student.dormitory_status.is_resident() {
        return Decimal::ZERO;
    }

    let charged = prorated_charge(
        student.dormitory_monthly_rate,
        student.dormitory_check_in_date,
        student.dormitory_planned_checkout_date,
    );
    charged - student.dormitory_paid_amount.unwrap_or_default()
}

/// Balances plus where the student stands on registration and visa, as of `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentStanding {
    #[serde(flatten)]
    pub balances: StudentBalances,
    pub registration_days_left: Option<i64>,
    pub registration_expiring: bool,
    pub visa_days_left: Option<i64>,
}

pub fn compute_standing(student: &Student, today: NaiveDate) -> StudentStanding {
    StudentStanding {
        balances: StudentBalances::of(student),
        registration_days_left: registration::days_left(student.registration_end_date, today),
        registration_expiring: registration::is_expiring_soon(student.registration_end_date, today),
        visa_days_left: registration::days_left(student.visa_end_date, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::student::{
        DormitoryStatus,
        test_support::{date, money, student},
    };

    #[test]
    fn remaining_plus_paid_is_total() {
        let amounts = [0, 1, 33, 1999_99, 2800_00, 3100_01];
        for paid in amounts {
            let mut s = student("STU-001");
            s.tuition_paid = money(paid);
            s.tuition_total = money(2800_00);

            let balances = StudentBalances::of(&s);
            assert_eq!(balances.tuition_remaining + s.tuition_paid, s.tuition_total);
        }
    }

    #[test]
    fn resident_owes_prorated_rent_minus_payments() {
        let mut s = student("STU-001");
        s.dormitory_status = DormitoryStatus::Normal;
        s.dormitory_monthly_rate = Some(money(40_00));
        s.dormitory_check_in_date = Some(date(2024, 1, 15));
        s.dormitory_planned_checkout_date = Some(date(2024, 3, 10));
        s.dormitory_paid_amount = Some(money(30_00));

        let balances = StudentBalances::of(&s);
        assert_eq!(balances.dormitory_remaining, money(50_00));
        assert!(!balances.fully_paid);
        assert_eq!(balances.total_outstanding(), money(50_00));
    }

    #[test]
    fn missing_paid_amount_is_zero() {
        let mut s = student("STU-001");
        s.dormitory_status = DormitoryStatus::Vip;
        s.dormitory_monthly_rate = Some(money(80_00));
        s.dormitory_check_in_date = Some(date(2024, 1, 1));
        s.dormitory_planned_checkout_date = Some(date(2024, 2, 1));

        assert_eq!(dormitory_remaining(&s), money(80_00));
    }

    #[test]
    fn non_resident_ignores_stale_dormitory_data() {
        let mut s = student("STU-001");
        s.dormitory_status = DormitoryStatus::None;
        s.dormitory_monthly_rate = Some(money(80_00));
        s.dormitory_check_in_date = Some(date(2023, 1, 1));
        s.dormitory_planned_checkout_date = Some(date(2024, 1, 1));
        s.dormitory_paid_amount = Some(money(5_00));

        assert_eq!(dormitory_remaining(&s), Decimal::ZERO);
        assert!(StudentBalances::of(&s).fully_paid);
    }

    #[test]
    fn payments_without_a_billable_stay_are_credit() {
        let mut s = student("STU-001");
        s.dormitory_status = DormitoryStatus::Normal;
        s.dormitory_monthly_rate = Some(money(40_00));
        s.dormitory_paid_amount = Some(money(40_00));

        assert_eq!(dormitory_remaining(&s), money(-40_00));
    }

    #[test]
    fn overpayment_counts_as_paid_but_needs_every_ledger() {
        let mut s = student("STU-001");
        s.tuition_paid = money(3000_00);

        let balances = StudentBalances::of(&s);
        assert_eq!(balances.tuition_remaining, money(-200_00));
        assert!(balances.fully_paid);
        assert_eq!(balances.total_outstanding(), Decimal::ZERO);

        s.registration_fee_paid = money(150_00);
        let balances = StudentBalances::of(&s);
        assert!(!balances.fully_paid);
        assert_eq!(balances.total_outstanding(), money(150_00));
    }

    #[test]
    fn standing_reports_days_left() {
        let mut s = student("STU-001");
        s.registration_end_date = Some(date(2024, 3, 9));
        s.visa_end_date = Some(date(2024, 2, 20));

        let standing = compute_standing(&s, date(2024, 3, 1));
        assert_eq!(standing.registration_days_left, Some(8));
        assert!(standing.registration_expiring);
        assert_eq!(standing.visa_days_left, Some(-10));

        let json = serde_json::to_value(standing).expect("serialises");
        assert_eq!(json["tuitionRemaining"], 0.0);
        assert_eq!(json["fullyPaid"], true);
        assert_eq!(json["registrationDaysLeft"], 8);
        assert_eq!(json["visaDaysLeft"], -10);
    }

    #[test]
    fn standing_without_a_visa_end_date_has_no_visa_countdown() {
        let standing = compute_standing(&student("STU-001"), date(2024, 3, 1));
        assert_eq!(standing.visa_days_left, None);

        let json = serde_json::to_value(standing).expect("serialises");
        assert!(json["visaDaysLeft"].is_null());
    }
}
