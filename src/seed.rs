//! `talaba seed-demo`: a login and a few students to click around with.

use crate::{
    data::{
        DataType,
        student::{DormitoryStatus, Language, RegistrationAddressType, Student},
        user::{AddUserForm, User},
    },
    error::{CommitTransactionSnafu, TalabaResult},
    state::TalabaState,
};
use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use snafu::ResultExt;

const DEMO_USERNAME: &str = "admin";
const DEMO_PASSWORD: &str = "admin";

fn days_before(today: NaiveDate, days: u64) -> Option<NaiveDate> {
    today.checked_sub_days(Days::new(days))
}

fn days_after(today: NaiveDate, days: u64) -> Option<NaiveDate> {
    today.checked_add_days(Days::new(days))
}

fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Three students whose dates sit around `today`: one with a registration
/// about to lapse and some debt, one in a worse state, one fully settled.
pub fn demo_students(today: NaiveDate, now: DateTime<Utc>) -> Vec<Student> {
    let base = |id: &str, full_name: &str, date_of_birth: NaiveDate| Student {
        id: id.to_string(),
        full_name: full_name.to_string(),
        date_of_birth,
        passport_number: String::new(),
        jshir: None,
        citizenship: String::new(),
        phone: None,
        email: None,
        emergency_contact_name: None,
        emergency_contact_phone: None,
        group: String::new(),
        course_year: 1,
        major: String::new(),
        language: Language::English,
        visa_type: "Student Visa".to_string(),
        visa_start_date: None,
        visa_end_date: None,
        registration_start_date: None,
        registration_end_date: None,
        registration_address_type: RegistrationAddressType::Dormitory,
        registration_address_details: None,
        tuition_total: money(2800_00),
        tuition_paid: Decimal::ZERO,
        registration_fee_total: money(300_00),
        registration_fee_paid: Decimal::ZERO,
        dormitory_status: DormitoryStatus::None,
        dormitory_check_in_date: None,
        dormitory_planned_checkout_date: None,
        dormitory_actual_checkout_date: None,
        dormitory_monthly_rate: None,
        dormitory_paid_amount: None,
        created_at: now,
        updated_at: now,
    };

    let jamshid = Student {
        passport_number: "AA1234567".to_string(),
        jshir: Some("12345678901234".to_string()),
        citizenship: "Uzbekistan".to_string(),
        phone: Some("+99890 123 45 67".to_string()),
        email: Some("jamshid.aliyev@example.com".to_string()),
        emergency_contact_name: Some("Aliyev Odil".to_string()),
        emergency_contact_phone: Some("+99890 765 43 21".to_string()),
        group: "CS-21-1".to_string(),
        course_year: 3,
        major: "Computer Science".to_string(),
        visa_start_date: days_before(today, 180),
        visa_end_date: days_after(today, 20),
        registration_start_date: days_before(today, 90),
        registration_end_date: days_after(today, 8),
        registration_address_details: Some("Dormitory 2, Room 314".to_string()),
        tuition_paid: money(2000_00),
        registration_fee_paid: money(300_00),
        dormitory_status: DormitoryStatus::Normal,
        dormitory_check_in_date: days_before(today, 270),
        dormitory_planned_checkout_date: days_after(today, 90),
        dormitory_monthly_rate: Some(money(40_00)),
        dormitory_paid_amount: Some(money(260_00)),
        ..base(
            "STU-001",
            "Aliyev Jamshid",
            NaiveDate::from_ymd_opt(2002, 3, 15).unwrap_or(today),
        )
    };

    let li = Student {
        passport_number: "CN9876543".to_string(),
        jshir: Some("56789012345678".to_string()),
        citizenship: "China".to_string(),
        phone: Some("+86 136 1234 5678".to_string()),
        email: Some("li.wang@example.com".to_string()),
        emergency_contact_name: Some("Wang Mei".to_string()),
        emergency_contact_phone: Some("+86 136 8765 4321".to_string()),
        group: "IB-20-2".to_string(),
        course_year: 4,
        major: "International Business".to_string(),
        language: Language::Russian,
        visa_start_date: days_before(today, 365),
        visa_end_date: days_after(today, 5),
        registration_start_date: days_before(today, 150),
        registration_end_date: days_after(today, 2),
        registration_address_type: RegistrationAddressType::Other,
        registration_address_details: Some("Tashkent, Mirzo Ulugbek district".to_string()),
        tuition_paid: money(1500_00),
        registration_fee_paid: money(150_00),
        dormitory_status: DormitoryStatus::Vip,
        dormitory_check_in_date: days_before(today, 330),
        dormitory_planned_checkout_date: days_after(today, 30),
        dormitory_monthly_rate: Some(money(80_00)),
        dormitory_paid_amount: Some(money(640_00)),
        ..base(
            "STU-002",
            "Wang Li",
            NaiveDate::from_ymd_opt(2001, 11, 2).unwrap_or(today),
        )
    };

    let john = Student {
        passport_number: "US7654321".to_string(),
        jshir: Some("78901234567890".to_string()),
        citizenship: "USA".to_string(),
        phone: Some("+1 555 210 9876".to_string()),
        email: Some("john.smith@example.com".to_string()),
        emergency_contact_name: Some("Anna Smith".to_string()),
        emergency_contact_phone: Some("+1 555 333 7777".to_string()),
        group: "MED-22-1".to_string(),
        course_year: 2,
        major: "General Medicine".to_string(),
        visa_start_date: days_before(today, 120),
        visa_end_date: days_after(today, 60),
        registration_start_date: days_before(today, 60),
        registration_end_date: days_after(today, 40),
        registration_address_details: Some("Dormitory 1, Room 210".to_string()),
        tuition_paid: money(2800_00),
        registration_fee_paid: money(300_00),
        ..base(
            "STU-003",
            "John Smith",
            NaiveDate::from_ymd_opt(2003, 7, 21).unwrap_or(today),
        )
    };

    vec![jamshid, li, john]
}

pub async fn seed_demo(state: &TalabaState) -> TalabaResult<()> {
    let mut transaction = state.get_transaction().await?;

    if User::get_by_username(DEMO_USERNAME, &mut transaction)
        .await?
        .is_some()
    {
        warn!(username = DEMO_USERNAME, "Demo user already exists");
    } else {
        User::insert_into_database(
            AddUserForm {
                username: DEMO_USERNAME.to_string(),
                password: SecretString::from(DEMO_PASSWORD.to_string()),
            },
            &mut transaction,
        )
        .await?;
        info!(
            username = DEMO_USERNAME,
            password = DEMO_PASSWORD,
            "Created demo user"
        );
    }

    if Student::any_exist(&mut transaction).await? {
        warn!("Students already exist, not adding demo students");
    } else {
        let students = demo_students(state.today()?, Utc::now());
        let n = students.len();
        for student in students {
            Student::insert_into_database(student, &mut transaction).await?;
        }
        info!(n, "Created demo students");
    }

    transaction.commit().await.context(CommitTransactionSnafu)
}
