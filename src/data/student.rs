use crate::{
    data::DataType,
    error::{
        GetDatabaseConnectionSnafu, InvalidStudentSnafu, MakeQuerySnafu, MissingStudentSnafu,
        TalabaError, TalabaResult,
    },
};
use bitflags::bitflags;
use chrono::{DateTime, NaiveDate, Utc};
use email_address::EmailAddress;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt, ensure};
use sqlx::{PgConnection, Pool, Postgres};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "language_of_study")]
pub enum Language {
    Russian,
    English,
    Uzbek,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "registration_address_type")]
pub enum RegistrationAddressType {
    Dormitory,
    Other,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "dormitory_status")]
pub enum DormitoryStatus {
    None,
    Normal,
    #[serde(rename = "VIP")]
    #[sqlx(rename = "VIP")]
    Vip,
}

impl DormitoryStatus {
    pub const fn is_resident(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// One international student, in storage shape.
///
/// Money is fixed-point with two fractional digits. The dormitory fields are
/// only meaningful while `dormitory_status` is not [`DormitoryStatus::None`].
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Student {
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

    pub group: String,
    pub course_year: i32,
    pub major: String,
    pub language: Language,

    pub visa_type: String,
    pub visa_start_date: Option<NaiveDate>,
    pub visa_end_date: Option<NaiveDate>,
    pub registration_start_date: Option<NaiveDate>,
    pub registration_end_date: Option<NaiveDate>,
    pub registration_address_type: RegistrationAddressType,
    pub registration_address_details: Option<String>,

    pub tuition_total: Decimal,
    pub tuition_paid: Decimal,

    pub registration_fee_total: Decimal,
    pub registration_fee_paid: Decimal,

    pub dormitory_status: DormitoryStatus,
    pub dormitory_check_in_date: Option<NaiveDate>,
    pub dormitory_planned_checkout_date: Option<NaiveDate>,
    pub dormitory_actual_checkout_date: Option<NaiveDate>,
    pub dormitory_monthly_rate: Option<Decimal>,
    pub dormitory_paid_amount: Option<Decimal>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

bitflags! {
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct StudentProblems: u8 {
        const EMPTY_FULL_NAME =       0b0000_0001;
        const EMPTY_PASSPORT =        0b0000_0010;
        const EMPTY_CITIZENSHIP =     0b0000_0100;
        const MISSING_DATE_OF_BIRTH = 0b0000_1000;
        const BAD_COURSE_YEAR =       0b0001_0000;
        const BAD_EMAIL =             0b0010_0000;
        const NEGATIVE_AMOUNT =       0b0100_0000;
    }
}

impl StudentProblems {
    pub fn as_nice_list(&self) -> impl Iterator<Item = &'static str> {
        self.iter().filter_map(|x| match x {
            Self::EMPTY_FULL_NAME => Some("Provided full name was empty"),
            Self::EMPTY_PASSPORT => Some("Provided passport number was empty"),
            Self::EMPTY_CITIZENSHIP => Some("Provided citizenship was empty"),
            Self::MISSING_DATE_OF_BIRTH => Some("Date of birth is required"),
            Self::BAD_COURSE_YEAR => Some("Course year must be at least 1"),
            Self::BAD_EMAIL => Some("Provided email address was invalid"),
            Self::NEGATIVE_AMOUNT => Some("Money amounts cannot be negative"),
            _ => None,
        })
    }
}

impl Student {
    pub fn problems(&self) -> StudentProblems {
        let mut problems = StudentProblems::empty();

        if self.full_name.trim().is_empty() {
            problems |= StudentProblems::EMPTY_FULL_NAME;
        }
        if self.passport_number.trim().is_empty() {
            problems |= StudentProblems::EMPTY_PASSPORT;
        }
        if self.citizenship.trim().is_empty() {
            problems |= StudentProblems::EMPTY_CITIZENSHIP;
        }
        if self.course_year < 1 {
            problems |= StudentProblems::BAD_COURSE_YEAR;
        }
        if self
            .email
            .as_deref()
            .is_some_and(|email| !EmailAddress::is_valid(email))
        {
            problems |= StudentProblems::BAD_EMAIL;
        }

        let amounts = [
            Some(self.tuition_total),
            Some(self.tuition_paid),
            Some(self.registration_fee_total),
            Some(self.registration_fee_paid),
            self.dormitory_monthly_rate,
            self.dormitory_paid_amount,
        ];
        if amounts.into_iter().flatten().any(|x| x < Decimal::ZERO) {
            problems |= StudentProblems::NEGATIVE_AMOUNT;
        }

        problems
    }

    pub fn validate(&self) -> TalabaResult<()> {
        let problems = self.problems();
        ensure!(problems.is_empty(), InvalidStudentSnafu { problems });
        Ok(())
    }

    ///lexicographically greatest id, which the id generator treats as the latest
    pub async fn max_id(conn: &mut PgConnection) -> TalabaResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            r#"SELECT id FROM public.students ORDER BY id COLLATE "C" DESC LIMIT 1"#,
        )
        .fetch_optional(conn)
        .await
        .context(MakeQuerySnafu)
    }

    pub async fn any_exist(conn: &mut PgConnection) -> TalabaResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT exists(SELECT 1 FROM public.students)")
            .fetch_one(conn)
            .await
            .context(MakeQuerySnafu)
    }

    /// Writes every column of an already-merged record back, bumping `updated_at`.
    pub async fn update_in_database(
        &self,
        conn: &mut PgConnection,
    ) -> TalabaResult<DateTime<Utc>> {
        let updated_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"UPDATE public.students SET
                full_name = $2, date_of_birth = $3, passport_number = $4, jshir = $5,
                citizenship = $6, phone = $7, email = $8, emergency_contact_name = $9,
                emergency_contact_phone = $10, "group" = $11, course_year = $12, major = $13,
                language = $14, visa_type = $15, visa_start_date = $16, visa_end_date = $17,
                registration_start_date = $18, registration_end_date = $19,
                registration_address_type = $20, registration_address_details = $21,
                tuition_total = $22, tuition_paid = $23, registration_fee_total = $24,
                registration_fee_paid = $25, dormitory_status = $26,
                dormitory_check_in_date = $27, dormitory_planned_checkout_date = $28,
                dormitory_actual_checkout_date = $29, dormitory_monthly_rate = $30,
                dormitory_paid_amount = $31, updated_at = now()
            WHERE id = $1
            RETURNING updated_at"#,
        )
        .bind(&self.id)
        .bind(&self.full_name)
        .bind(self.date_of_birth)
        .bind(&self.passport_number)
        .bind(&self.jshir)
        .bind(&self.citizenship)
        .bind(&self.phone)
        .bind(&self.email)
        .bind(&self.emergency_contact_name)
        .bind(&self.emergency_contact_phone)
        .bind(&self.group)
        .bind(self.course_year)
        .bind(&self.major)
        .bind(self.language)
        .bind(&self.visa_type)
        .bind(self.visa_start_date)
        .bind(self.visa_end_date)
        .bind(self.registration_start_date)
        .bind(self.registration_end_date)
        .bind(self.registration_address_type)
        .bind(&self.registration_address_details)
        .bind(self.tuition_total)
        .bind(self.tuition_paid)
        .bind(self.registration_fee_total)
        .bind(self.registration_fee_paid)
        .bind(self.dormitory_status)
        .bind(self.dormitory_check_in_date)
        .bind(self.dormitory_planned_checkout_date)
        .bind(self.dormitory_actual_checkout_date)
        .bind(self.dormitory_monthly_rate)
        .bind(self.dormitory_paid_amount)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| TalabaError::from_student_insert(e, &self.id, &self.passport_number))?;

        updated_at.context(MissingStudentSnafu {
            id: self.id.clone(),
        })
    }
}

impl DataType for Student {
    type Id = String;
    type FormForAdding = Self;

    async fn get_from_db_by_id(id: Self::Id, conn: &mut PgConnection) -> TalabaResult<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM public.students WHERE id = $1")
            .bind(id)
            .fetch_optional(conn)
            .await
            .context(MakeQuerySnafu)
    }

    async fn get_all(pool: &Pool<Postgres>) -> TalabaResult<Vec<Self>> {
        let mut conn = pool.acquire().await.context(GetDatabaseConnectionSnafu)?;

        sqlx::query_as::<_, Self>("SELECT * FROM public.students ORDER BY created_at DESC, id")
            .fetch_all(&mut *conn)
            .await
            .context(MakeQuerySnafu)
    }

    async fn insert_into_database(
        to_be_added: Self::FormForAdding,
        conn: &mut PgConnection,
    ) -> TalabaResult<Self::Id> {
        let student = to_be_added;

        sqlx::query_scalar::<_, String>(
            r#"INSERT INTO public.students (
                id, full_name, date_of_birth, passport_number, jshir, citizenship, phone, email,
                emergency_contact_name, emergency_contact_phone, "group", course_year, major,
                language, visa_type, visa_start_date, visa_end_date, registration_start_date,
                registration_end_date, registration_address_type, registration_address_details,
                tuition_total, tuition_paid, registration_fee_total, registration_fee_paid,
                dormitory_status, dormitory_check_in_date, dormitory_planned_checkout_date,
                dormitory_actual_checkout_date, dormitory_monthly_rate, dormitory_paid_amount
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
                $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31
            ) RETURNING id"#,
        )
        .bind(&student.id)
        .bind(&student.full_name)
        .bind(student.date_of_birth)
        .bind(&student.passport_number)
        .bind(&student.jshir)
        .bind(&student.citizenship)
        .bind(&student.phone)
        .bind(&student.email)
        .bind(&student.emergency_contact_name)
        .bind(&student.emergency_contact_phone)
        .bind(&student.group)
        .bind(student.course_year)
        .bind(&student.major)
        .bind(student.language)
        .bind(&student.visa_type)
        .bind(student.visa_start_date)
        .bind(student.visa_end_date)
        .bind(student.registration_start_date)
        .bind(student.registration_end_date)
        .bind(student.registration_address_type)
        .bind(&student.registration_address_details)
        .bind(student.tuition_total)
        .bind(student.tuition_paid)
        .bind(student.registration_fee_total)
        .bind(student.registration_fee_paid)
        .bind(student.dormitory_status)
        .bind(student.dormitory_check_in_date)
        .bind(student.dormitory_planned_checkout_date)
        .bind(student.dormitory_actual_checkout_date)
        .bind(student.dormitory_monthly_rate)
        .bind(student.dormitory_paid_amount)
        .fetch_one(conn)
        .await
        .map_err(|e| TalabaError::from_student_insert(e, &student.id, &student.passport_number))
    }

    async fn remove_from_database(id: Self::Id, conn: &mut PgConnection) -> TalabaResult<()> {
        let affected = sqlx::query("DELETE FROM public.students WHERE id = $1")
            .bind(&id)
            .execute(conn)
            .await
            .context(MakeQuerySnafu)?
            .rows_affected();

        ensure!(affected > 0, MissingStudentSnafu { id });
        Ok(())
    }
}
