//! The two lists behind the dashboard's alert panel.

use crate::{
    analytics::{
        balance::{StudentBalances, owed},
        registration,
    },
    data::student::Student,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

pub const DEFAULT_TOP_DEBTORS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringRegistration {
    pub id: String,
    pub full_name: String,
    pub group: String,
    pub citizenship: String,
    pub days_left: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Debtor {
    pub id: String,
    pub full_name: String,
    pub group: String,
    pub citizenship: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub tuition: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub registration_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub dormitory: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_outstanding: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alerts {
    pub expiring_registration: Vec<ExpiringRegistration>,
    pub top_debtors: Vec<Debtor>,
}

pub fn expiring_registrations(students: &[Student], today: NaiveDate) -> Vec<ExpiringRegistration> {
    let mut expiring: Vec<_> = students
        .iter()
        .filter_map(|student| {
            let days_left = registration::days_left(student.registration_end_date, today)?;
            (days_left <= registration::EXPIRY_WARNING_DAYS).then(|| ExpiringRegistration {
                id: student.id.clone(),
                full_name: student.full_name.clone(),
                group: student.group.clone(),
                citizenship: student.citizenship.clone(),
                days_left,
            })
        })
        .collect();

    expiring.sort_by(|a, b| a.days_left.cmp(&b.days_left).then_with(|| a.id.cmp(&b.id)));
    expiring
}

/// The `limit` students owing the most, counting only debts (an overpaid
/// ledger contributes nothing rather than cancelling another ledger out).
pub fn top_debtors(students: &[Student], limit: usize) -> Vec<Debtor> {
    let mut debtors: Vec<_> = students
        .iter()
        .filter_map(|student| {
            let balances = StudentBalances::of(student);
            let total_outstanding = balances.total_outstanding();
            (total_outstanding > Decimal::ZERO).then(|| Debtor {
                id: student.id.clone(),
                full_name: student.full_name.clone(),
                group: student.group.clone(),
                citizenship: student.citizenship.clone(),
                tuition: owed(balances.tuition_remaining),
                registration_fee: owed(balances.registration_remaining),
                dormitory: owed(balances.dormitory_remaining),
                total_outstanding,
            })
        })
        .collect();

    debtors.sort_by(|a, b| {
        b.total_outstanding
            .cmp(&a.total_outstanding)
            .then_with(|| a.id.cmp(&b.id))
    });
    debtors.truncate(limit);
    debtors
}

pub fn compute_alerts(students: &[Student], today: NaiveDate, limit: usize) -> Alerts {
    Alerts {
        expiring_registration: expiring_registrations(students, today),
        top_debtors: top_debtors(students, limit),
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
    fn expiring_sorted_by_urgency_then_id() {
        let today = date(2024, 3, 1);

        let mut a = student("STU-003");
        a.registration_end_date = Some(date(2024, 3, 8));
        let mut b = student("STU-001");
        b.registration_end_date = Some(date(2024, 3, 8));
        let mut c = student("STU-002");
        c.registration_end_date = Some(date(2024, 2, 20));
        let mut d = student("STU-004");
        d.registration_end_date = Some(date(2024, 3, 12));
        let e = student("STU-005");

        let expiring = expiring_registrations(&[a, b, c, d, e], today);
        let summary: Vec<_> = expiring
            .iter()
            .map(|x| (x.id.as_str(), x.days_left))
            .collect();
        assert_eq!(summary, [("STU-002", -10), ("STU-001", 7), ("STU-003", 7)]);
    }

    #[test]
    fn debtors_ranked_by_positive_debt() {
        let mut big = student("STU-001");
        big.tuition_paid = money(0);

        let mut overpaid_but_owing_rent = student("STU-002");
        overpaid_but_owing_rent.tuition_paid = money(3800_00);
        overpaid_but_owing_rent.dormitory_status = DormitoryStatus::Normal;
        overpaid_but_owing_rent.dormitory_monthly_rate = Some(money(100_00));
        overpaid_but_owing_rent.dormitory_check_in_date = Some(date(2024, 1, 1));
        overpaid_but_owing_rent.dormitory_planned_checkout_date = Some(date(2024, 4, 1));

        let mut small = student("STU-003");
        small.registration_fee_paid = money(250_00);

        let mut tied = student("STU-000");
        tied.registration_fee_paid = money(250_00);

        let paid = student("STU-004");

        let debtors = top_debtors(&[small, big, overpaid_but_owing_rent, paid, tied], 5);
        let ranking: Vec<_> = debtors
            .iter()
            .map(|d| (d.id.as_str(), d.total_outstanding))
            .collect();
        assert_eq!(
            ranking,
            [
                ("STU-001", money(2800_00)),
                ("STU-002", money(300_00)),
                ("STU-000", money(50_00)),
                ("STU-003", money(50_00)),
            ]
        );
        assert_eq!(debtors[1].tuition, Decimal::ZERO);
        assert_eq!(debtors[1].dormitory, money(300_00));
    }

    #[test]
    fn debtors_are_limited() {
        let students: Vec<_> = (1..=8)
            .map(|n| {
                let mut s = student(&format!("STU-00{n}"));
                s.tuition_paid = money(n * 100_00);
                s
            })
            .collect();

        let debtors = top_debtors(&students, DEFAULT_TOP_DEBTORS);
        assert_eq!(debtors.len(), 5);
        assert_eq!(debtors[0].id, "STU-001");
        assert_eq!(debtors[4].id, "STU-005");
        assert!(top_debtors(&students, 0).is_empty());
    }

    #[test]
    fn wire_names() {
        let mut s = student("STU-001");
        s.tuition_paid = money(2700_50);
        s.registration_end_date = Some(date(2024, 3, 3));

        let json = serde_json::to_value(compute_alerts(&[s], date(2024, 3, 1), 5))
            .expect("serialises");
        assert_eq!(json["expiringRegistration"][0]["daysLeft"], 2);
        assert_eq!(json["expiringRegistration"][0]["fullName"], "Student STU-001");
        assert_eq!(json["topDebtors"][0]["totalOutstanding"], 99.5);
        assert_eq!(json["topDebtors"][0]["registrationFee"], 0.0);
    }
}
