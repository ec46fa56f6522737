use crate::{
    analytics::{balance::StudentBalances, registration::is_expiring_soon},
    data::student::Student,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::ops::Add;

/// Dashboard counters over every student.
///
/// Each student contributes independently, so partial results over any split
/// of the fleet can be combined with `+` in any order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetStats {
    pub total_students: u64,
    pub fully_paid: u64,
    pub expiring_registration: u64,
    pub dormitory_residents: u64,
}

impl FleetStats {
    pub fn of(student: &Student, today: NaiveDate) -> Self {
        Self {
            total_students: 1,
            fully_paid: u64::from(StudentBalances::of(student).fully_paid),
            expiring_registration: u64::from(is_expiring_soon(
                student.registration_end_date,
                today,
            )),
            dormitory_residents: u64::from(student.dormitory_status.is_resident()),
        }
    }
}

impl Add for FleetStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            total_students: self.total_students + rhs.total_students,
            fully_paid: self.fully_paid + rhs.fully_paid,
            expiring_registration: self.expiring_registration + rhs.expiring_registration,
            dormitory_residents: self.dormitory_residents + rhs.dormitory_residents,
        }
    }
}

pub fn compute_fleet_stats<'a>(
    students: impl IntoIterator<Item = &'a Student>,
    today: NaiveDate,
) -> FleetStats {
    students
        .into_iter()
        .map(|student| FleetStats::of(student, today))
        .fold(FleetStats::default(), Add::add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::student::{
        DormitoryStatus,
        test_support::{date, money, student},
    };

    fn fleet() -> Vec<Student> {
        let mut owing_resident = student("STU-001");
        owing_resident.tuition_paid = money(1000_00);
        owing_resident.dormitory_status = DormitoryStatus::Vip;
        owing_resident.registration_end_date = Some(date(2024, 3, 5));

        let paid_up = student("STU-002");

        let mut stale_dormitory = student("STU-003");
        stale_dormitory.dormitory_monthly_rate = Some(money(50_00));
        stale_dormitory.dormitory_check_in_date = Some(date(2023, 9, 1));
        stale_dormitory.registration_end_date = Some(date(2024, 6, 1));

        let mut half_filled_resident = student("STU-004");
        half_filled_resident.dormitory_status = DormitoryStatus::Normal;
        half_filled_resident.dormitory_monthly_rate = Some(money(50_00));
        half_filled_resident.registration_end_date = Some(date(2024, 2, 1));

        vec![owing_resident, paid_up, stale_dormitory, half_filled_resident]
    }

    #[test]
    fn counts_every_category() {
        let stats = compute_fleet_stats(&fleet(), date(2024, 3, 1));
        assert_eq!(
            stats,
            FleetStats {
                total_students: 4,
                fully_paid: 3,
                expiring_registration: 2,
                dormitory_residents: 2,
            }
        );
    }

    #[test]
    fn empty_fleet_is_all_zero() {
        assert_eq!(
            compute_fleet_stats(std::iter::empty(), date(2024, 3, 1)),
            FleetStats::default()
        );
    }

    #[test]
    fn order_does_not_matter() {
        let today = date(2024, 3, 1);
        let mut students = fleet();
        let expected = compute_fleet_stats(&students, today);

        students.reverse();
        assert_eq!(compute_fleet_stats(&students, today), expected);
        students.rotate_left(1);
        assert_eq!(compute_fleet_stats(&students, today), expected);
        students.swap(0, 2);
        assert_eq!(compute_fleet_stats(&students, today), expected);
    }

    #[test]
    fn shards_merge_to_the_whole() {
        let today = date(2024, 3, 1);
        let students = fleet();
        let (left, right) = students.split_at(1);

        assert_eq!(
            compute_fleet_stats(left, today) + compute_fleet_stats(right, today),
            compute_fleet_stats(&students, today)
        );
    }

    #[test]
    fn wire_names() {
        let json = serde_json::to_value(compute_fleet_stats(&fleet(), date(2024, 3, 1)))
            .expect("serialises");
        assert_eq!(
            json,
            serde_json::json!({
                "totalStudents": 4,
                "fullyPaid": 3,
                "expiringRegistration": 2,
                "dormitoryResidents": 2,
            })
        );
    }
}
