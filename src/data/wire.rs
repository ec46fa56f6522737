//! Mapping between the flat [`Student`] row and the nested JSON shape the
//! dashboard client speaks (`academic`, `visa`, `tuition`, `registrationFee`,
//! `dormitory` groups with camelCase keys).

use crate::{
    config::institution::InstitutionConfig,
    data::student::{DormitoryStatus, Language, RegistrationAddressType, Student, StudentProblems},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentView {
    pub id: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub passport_number: String,
    pub jshir: Option<String>,
    pub citizenship: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub academic: AcademicView,
    pub visa: VisaView,
    pub tuition: LedgerView,
    pub registration_fee: LedgerView,
    pub dormitory: DormitoryView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicView {
    pub group: String,
    pub course_year: i32,
    pub major: String,
    pub language: Language,
}

///absent dates and details go out as `""`, which is what the client expects
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisaView {
    pub visa_type: String,
    pub visa_start_date: String,
    pub visa_end_date: String,
    pub registration_start_date: String,
    pub registration_end_date: String,
    pub registration_address_type: RegistrationAddressType,
    pub registration_address_details: String,
}

#[derive(Debug, Serialize)]
pub struct LedgerView {
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub paid: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DormitoryView {
    pub status: DormitoryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_checkout_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_checkout_date: Option<NaiveDate>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub monthly_rate: Option<Decimal>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub paid_amount: Option<Decimal>,
}

fn date_or_empty(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

impl From<&Student> for StudentView {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id.clone(),
            full_name: student.full_name.clone(),
            date_of_birth: student.date_of_birth,
            passport_number: student.passport_number.clone(),
            jshir: student.jshir.clone(),
            citizenship: student.citizenship.clone(),
            phone: student.phone.clone(),
            email: student.email.clone(),
            emergency_contact_name: student.emergency_contact_name.clone(),
            emergency_contact_phone: student.emergency_contact_phone.clone(),
            academic: AcademicView {
                group: student.group.clone(),
                course_year: student.course_year,
                major: student.major.clone(),
                language: student.language,
            },
            visa: VisaView {
                visa_type: student.visa_type.clone(),
                visa_start_date: date_or_empty(student.visa_start_date),
                visa_end_date: date_or_empty(student.visa_end_date),
                registration_start_date: date_or_empty(student.registration_start_date),
                registration_end_date: date_or_empty(student.registration_end_date),
                registration_address_type: student.registration_address_type,
                registration_address_details: student
                    .registration_address_details
                    .clone()
                    .unwrap_or_default(),
            },
            tuition: LedgerView {
                total: student.tuition_total,
                paid: student.tuition_paid,
            },
            registration_fee: LedgerView {
                total: student.registration_fee_total,
                paid: student.registration_fee_paid,
            },
            dormitory: DormitoryView {
                status: student.dormitory_status,
                check_in_date: student.dormitory_check_in_date,
                planned_checkout_date: student.dormitory_planned_checkout_date,
                actual_checkout_date: student.dormitory_actual_checkout_date,
                monthly_rate: student.dormitory_monthly_rate,
                paid_amount: student.dormitory_paid_amount,
            },
        }
    }
}

///`null`, a missing key and `""` all mean "no date"
fn blank_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(serde::de::Error::custom)
}

fn cents(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

/// Body of a create or update request. Every field is optional so the same
/// shape serves both; see [`StudentInput::into_new_student`] and
/// [`StudentInput::apply_to`] for how missing pieces are treated.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentInput {
    pub id: Option<String>,
    pub full_name: Option<String>,
    #[serde(deserialize_with = "blank_date")]
    pub date_of_birth: Option<NaiveDate>,
    pub passport_number: Option<String>,
    pub jshir: Option<String>,
    pub citizenship: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub academic: Option<AcademicInput>,
    pub visa: Option<VisaInput>,
    pub tuition: Option<LedgerInput>,
    pub registration_fee: Option<LedgerInput>,
    pub dormitory: Option<DormitoryInput>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AcademicInput {
    pub group: Option<String>,
    pub course_year: Option<i32>,
    pub major: Option<String>,
    pub language: Option<Language>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisaInput {
    pub visa_type: Option<String>,
    #[serde(deserialize_with = "blank_date")]
    pub visa_start_date: Option<NaiveDate>,
    #[serde(deserialize_with = "blank_date")]
    pub visa_end_date: Option<NaiveDate>,
    #[serde(deserialize_with = "blank_date")]
    pub registration_start_date: Option<NaiveDate>,
    #[serde(deserialize_with = "blank_date")]
    pub registration_end_date: Option<NaiveDate>,
    pub registration_address_type: Option<RegistrationAddressType>,
    pub registration_address_details: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LedgerInput {
    #[serde(with = "rust_decimal::serde::float_option")]
    pub total: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub paid: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DormitoryInput {
    pub status: Option<DormitoryStatus>,
    #[serde(deserialize_with = "blank_date")]
    pub check_in_date: Option<NaiveDate>,
    #[serde(deserialize_with = "blank_date")]
    pub planned_checkout_date: Option<NaiveDate>,
    #[serde(deserialize_with = "blank_date")]
    pub actual_checkout_date: Option<NaiveDate>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub monthly_rate: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub paid_amount: Option<Decimal>,
}

impl VisaInput {
    fn is_empty(&self) -> bool {
        self.visa_type.is_none()
            && self.visa_start_date.is_none()
            && self.visa_end_date.is_none()
            && self.registration_start_date.is_none()
            && self.registration_end_date.is_none()
            && self.registration_address_type.is_none()
            && self.registration_address_details.is_none()
    }
}

impl DormitoryInput {
    fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.check_in_date.is_none()
            && self.planned_checkout_date.is_none()
            && self.actual_checkout_date.is_none()
            && self.monthly_rate.is_none()
            && self.paid_amount.is_none()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl StudentInput {
    /// Builds a brand-new record, filling every missing group with the
    /// programme defaults. `id` has already been resolved by the caller.
    pub fn into_new_student(
        self,
        id: String,
        defaults: &InstitutionConfig,
        now: DateTime<Utc>,
    ) -> Result<Student, StudentProblems> {
        let academic = self.academic.unwrap_or_default();
        let visa = self.visa.unwrap_or_default();
        let tuition = self.tuition.unwrap_or_default();
        let registration_fee = self.registration_fee.unwrap_or_default();
        let dormitory = self.dormitory.unwrap_or_default();

        let student = Student {
            id,
            full_name: self.full_name.unwrap_or_default(),
            date_of_birth: self.date_of_birth.unwrap_or_default(),
            passport_number: self.passport_number.unwrap_or_default(),
            jshir: non_blank(self.jshir),
            citizenship: self.citizenship.unwrap_or_default(),
            phone: non_blank(self.phone),
            email: non_blank(self.email),
            emergency_contact_name: non_blank(self.emergency_contact_name),
            emergency_contact_phone: non_blank(self.emergency_contact_phone),

            group: academic.group.unwrap_or_default(),
            course_year: academic.course_year.unwrap_or(1),
            major: academic.major.unwrap_or_default(),
            language: academic.language.unwrap_or(Language::English),

            visa_type: non_blank(visa.visa_type).unwrap_or_else(|| "Student Visa".to_string()),
            visa_start_date: visa.visa_start_date,
            visa_end_date: visa.visa_end_date,
            registration_start_date: visa.registration_start_date,
            registration_end_date: visa.registration_end_date,
            registration_address_type: visa
                .registration_address_type
                .unwrap_or(RegistrationAddressType::Dormitory),
            registration_address_details: non_blank(visa.registration_address_details),

            tuition_total: cents(tuition.total.unwrap_or(defaults.default_tuition_total)),
            tuition_paid: cents(tuition.paid.unwrap_or_default()),
            registration_fee_total: cents(
                registration_fee
                    .total
                    .unwrap_or(defaults.default_registration_fee_total),
            ),
            registration_fee_paid: cents(registration_fee.paid.unwrap_or_default()),

            dormitory_status: dormitory.status.unwrap_or(DormitoryStatus::None),
            dormitory_check_in_date: dormitory.check_in_date,
            dormitory_planned_checkout_date: dormitory.planned_checkout_date,
            dormitory_actual_checkout_date: dormitory.actual_checkout_date,
            dormitory_monthly_rate: dormitory.monthly_rate.map(cents),
            dormitory_paid_amount: dormitory.paid_amount.map(cents),

            created_at: now,
            updated_at: now,
        };

        let mut problems = student.problems();
        if self.date_of_birth.is_none() {
            problems |= StudentProblems::MISSING_DATE_OF_BIRTH;
        }
        if problems.is_empty() {
            Ok(student)
        } else {
            Err(problems)
        }
    }

    /// Applies a partial update. Only groups present in the request are
    /// touched, and a group with nothing in it counts as absent. Inside a present `visa` or `dormitory` group the dates and
    /// amounts are replaced as a set, so leaving one out clears it, while the
    /// type/status fields keep their old value when left out.
    ///
    /// The id is immutable and is ignored here.
    pub fn apply_to(self, student: &mut Student) {
        fn keep_or<T>(slot: &mut T, new: Option<T>) {
            if let Some(new) = new {
                *slot = new;
            }
        }

        keep_or(&mut student.full_name, self.full_name);
        keep_or(&mut student.date_of_birth, self.date_of_birth);
        keep_or(&mut student.passport_number, self.passport_number);
        keep_or(&mut student.citizenship, self.citizenship);
        if let Some(jshir) = self.jshir {
            student.jshir = non_blank(Some(jshir));
        }
        if let Some(phone) = self.phone {
            student.phone = non_blank(Some(phone));
        }
        if let Some(email) = self.email {
            student.email = non_blank(Some(email));
        }
        if let Some(name) = self.emergency_contact_name {
            student.emergency_contact_name = non_blank(Some(name));
        }
        if let Some(phone) = self.emergency_contact_phone {
            student.emergency_contact_phone = non_blank(Some(phone));
        }

        if let Some(academic) = self.academic {
            keep_or(&mut student.group, academic.group);
            keep_or(&mut student.course_year, academic.course_year);
            keep_or(&mut student.major, academic.major);
            keep_or(&mut student.language, academic.language);
        }

        if let Some(visa) = self.visa.filter(|visa| !visa.is_empty()) {
            keep_or(&mut student.visa_type, non_blank(visa.visa_type));
            student.visa_start_date = visa.visa_start_date;
            student.visa_end_date = visa.visa_end_date;
            student.registration_start_date = visa.registration_start_date;
            student.registration_end_date = visa.registration_end_date;
            keep_or(
                &mut student.registration_address_type,
                visa.registration_address_type,
            );
            if let Some(details) = visa.registration_address_details {
                student.registration_address_details = non_blank(Some(details));
            }
        }

        if let Some(tuition) = self.tuition {
            keep_or(&mut student.tuition_total, tuition.total.map(cents));
            keep_or(&mut student.tuition_paid, tuition.paid.map(cents));
        }

        if let Some(fee) = self.registration_fee {
            keep_or(&mut student.registration_fee_total, fee.total.map(cents));
            keep_or(&mut student.registration_fee_paid, fee.paid.map(cents));
        }

        if let Some(dormitory) = self.dormitory.filter(|dormitory| !dormitory.is_empty()) {
            keep_or(&mut student.dormitory_status, dormitory.status);
            student.dormitory_check_in_date = dormitory.check_in_date;
            student.dormitory_planned_checkout_date = dormitory.planned_checkout_date;
            student.dormitory_actual_checkout_date = dormitory.actual_checkout_date;
            student.dormitory_monthly_rate = dormitory.monthly_rate.map(cents);
            student.dormitory_paid_amount = dormitory.paid_amount.map(cents);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::student::test_support::{date, money, student};
    use serde_json::json;

    fn input(value: serde_json::Value) -> StudentInput {
        serde_json::from_value(value).expect("valid input json")
    }

    #[test]
    fn view_nests_groups_and_blanks_missing_visa_fields() {
        let mut s = student("STU-001");
        s.registration_end_date = Some(date(2025, 1, 9));
        s.tuition_paid = money(2000_00);

        let json = serde_json::to_value(StudentView::from(&s)).expect("serialises");

        assert_eq!(json["fullName"], "Student STU-001");
        assert_eq!(json["academic"]["courseYear"], 1);
        assert_eq!(json["academic"]["language"], "English");
        assert_eq!(json["visa"]["visaStartDate"], "");
        assert_eq!(json["visa"]["registrationEndDate"], "2025-01-09");
        assert_eq!(json["visa"]["registrationAddressDetails"], "");
        assert_eq!(json["tuition"]["total"], 2800.0);
        assert_eq!(json["tuition"]["paid"], 2000.0);
        assert_eq!(json["registrationFee"]["paid"], 300.0);
        assert_eq!(json["dormitory"], json!({ "status": "None" }));
    }

    #[test]
    fn view_keeps_a_zero_dormitory_rate() {
        let mut s = student("STU-001");
        s.dormitory_status = DormitoryStatus::Vip;
        s.dormitory_monthly_rate = Some(Decimal::ZERO);

        let json = serde_json::to_value(StudentView::from(&s)).expect("serialises");
        assert_eq!(json["dormitory"]["status"], "VIP");
        assert_eq!(json["dormitory"]["monthlyRate"], 0.0);
        assert!(json["dormitory"].get("paidAmount").is_none());
    }

    #[test]
    fn new_student_gets_programme_defaults() {
        let built = input(json!({
            "fullName": "Wang Li",
            "dateOfBirth": "2001-11-02",
            "passportNumber": "CN9876543",
            "citizenship": "China",
            "visa": { "registrationEndDate": "", "visaEndDate": "2026-01-01" }
        }))
        .into_new_student(
            "STU-002".to_string(),
            &InstitutionConfig::default(),
            DateTime::<Utc>::UNIX_EPOCH,
        )
        .expect("valid student");

        assert_eq!(built.id, "STU-002");
        assert_eq!(built.course_year, 1);
        assert_eq!(built.language, Language::English);
        assert_eq!(built.visa_type, "Student Visa");
        assert_eq!(built.registration_end_date, None);
        assert_eq!(built.visa_end_date, Some(date(2026, 1, 1)));
        assert_eq!(built.tuition_total, money(2800_00));
        assert_eq!(built.tuition_paid, Decimal::ZERO);
        assert_eq!(built.registration_fee_total, money(300_00));
        assert_eq!(built.dormitory_status, DormitoryStatus::None);
        assert_eq!(
            built.registration_address_type,
            RegistrationAddressType::Dormitory
        );
    }

    #[test]
    fn new_student_without_birth_date_is_rejected() {
        let problems = input(json!({
            "fullName": "Nobody",
            "passportNumber": "AB1234567",
            "citizenship": "Uzbekistan"
        }))
        .into_new_student(
            "STU-003".to_string(),
            &InstitutionConfig::default(),
            DateTime::<Utc>::UNIX_EPOCH,
        )
        .expect_err("no birth date");

        assert_eq!(problems, StudentProblems::MISSING_DATE_OF_BIRTH);
    }

    #[test]
    fn missing_birth_date_is_reported_with_everything_else() {
        let problems = input(json!({ "fullName": "  ", "academic": { "courseYear": 0 } }))
            .into_new_student(
                "STU-004".to_string(),
                &InstitutionConfig::default(),
                DateTime::<Utc>::UNIX_EPOCH,
            )
            .expect_err("nothing usable");

        assert!(problems.contains(StudentProblems::MISSING_DATE_OF_BIRTH));
        assert!(problems.contains(StudentProblems::EMPTY_FULL_NAME));
        assert!(problems.contains(StudentProblems::EMPTY_PASSPORT));
        assert!(problems.contains(StudentProblems::EMPTY_CITIZENSHIP));
        assert!(problems.contains(StudentProblems::BAD_COURSE_YEAR));
    }

    #[test]
    fn money_is_rounded_to_cents() {
        let built = input(json!({
            "fullName": "John Smith",
            "dateOfBirth": "2003-07-21",
            "passportNumber": "US7654321",
            "citizenship": "USA",
            "tuition": { "total": 2800, "paid": 1234.567 }
        }))
        .into_new_student(
            "STU-003".to_string(),
            &InstitutionConfig::default(),
            DateTime::<Utc>::UNIX_EPOCH,
        )
        .expect("valid student");

        assert_eq!(built.tuition_total, money(2800_00));
        assert_eq!(built.tuition_paid, money(1234_57));
    }

    #[test]
    fn update_leaves_absent_groups_alone() {
        let mut s = student("STU-001");
        s.dormitory_status = DormitoryStatus::Normal;
        s.dormitory_monthly_rate = Some(money(40_00));
        s.registration_end_date = Some(date(2025, 5, 1));
        let before = s.clone();

        input(json!({ "tuition": { "paid": 100 } })).apply_to(&mut s);

        assert_eq!(s.tuition_paid, money(100_00));
        assert_eq!(s.tuition_total, before.tuition_total);
        assert_eq!(s.dormitory_monthly_rate, before.dormitory_monthly_rate);
        assert_eq!(s.registration_end_date, before.registration_end_date);
        assert_eq!(s.full_name, before.full_name);
    }

    #[test]
    fn update_ignores_empty_groups() {
        let mut s = student("STU-001");
        s.dormitory_status = DormitoryStatus::Normal;
        s.dormitory_check_in_date = Some(date(2024, 1, 15));
        s.dormitory_monthly_rate = Some(money(40_00));
        s.registration_end_date = Some(date(2025, 5, 1));
        s.visa_end_date = Some(date(2025, 9, 1));
        let before = s.clone();

        input(json!({ "visa": {}, "dormitory": {} })).apply_to(&mut s);

        assert_eq!(s.dormitory_status, before.dormitory_status);
        assert_eq!(s.dormitory_check_in_date, before.dormitory_check_in_date);
        assert_eq!(s.dormitory_monthly_rate, before.dormitory_monthly_rate);
        assert_eq!(s.registration_end_date, before.registration_end_date);
        assert_eq!(s.visa_end_date, before.visa_end_date);
    }

    #[test]
    fn update_replaces_dates_within_a_present_group() {
        let mut s = student("STU-001");
        s.dormitory_status = DormitoryStatus::Normal;
        s.dormitory_check_in_date = Some(date(2024, 1, 15));
        s.dormitory_monthly_rate = Some(money(40_00));

        input(json!({ "dormitory": { "plannedCheckoutDate": "2024-06-01" } })).apply_to(&mut s);

        assert_eq!(s.dormitory_status, DormitoryStatus::Normal);
        assert_eq!(s.dormitory_check_in_date, None);
        assert_eq!(s.dormitory_planned_checkout_date, Some(date(2024, 6, 1)));
        assert_eq!(s.dormitory_monthly_rate, None);
    }

    #[test]
    fn update_never_changes_the_id() {
        let mut s = student("STU-001");
        input(json!({ "id": "STU-999", "academic": { "courseYear": 3 } })).apply_to(&mut s);

        assert_eq!(s.id, "STU-001");
        assert_eq!(s.course_year, 3);
        assert_eq!(s.group, "CS-21-1");
    }

    #[test]
    fn malformed_dates_are_rejected() {
        let result = serde_json::from_value::<StudentInput>(json!({ "dateOfBirth": "15/03/2002" }));
        assert!(result.is_err());
    }
}
