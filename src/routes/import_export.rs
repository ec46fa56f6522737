use crate::{
    analytics::balance::StudentBalances,
    auth::AuthenticatedUser,
    data::{
        DataType,
        student::{DormitoryStatus, Language, RegistrationAddressType, Student},
        student_id::{next_student_id, requested_id},
        wire::{AcademicInput, DormitoryInput, LedgerInput, StudentInput, VisaInput},
    },
    error::{
        CommitTransactionSnafu, CsvFlushSnafu, CsvSnafu, MultipartSnafu, RollbackTransactionSnafu,
        TalabaResult,
    },
    state::TalabaState,
};
use axum::{
    Json,
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

/// One student as a flat CSV row, using the storage column names.
///
/// On export the balance columns are filled in. On import they are ignored,
/// and anything left blank falls back to the same defaults as creating a
/// student through the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct StudentCsvRow {
    pub id: Option<String>,
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub passport_number: String,
    pub jshir: Option<String>,
    pub citizenship: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub group: Option<String>,
    pub course_year: Option<i32>,
    pub major: Option<String>,
    pub language: Option<Language>,
    pub visa_type: Option<String>,
    pub visa_start_date: Option<NaiveDate>,
    pub visa_end_date: Option<NaiveDate>,
    pub registration_start_date: Option<NaiveDate>,
    pub registration_end_date: Option<NaiveDate>,
    pub registration_address_type: Option<RegistrationAddressType>,
    pub registration_address_details: Option<String>,
    pub tuition_total: Option<Decimal>,
    pub tuition_paid: Option<Decimal>,
    pub registration_fee_total: Option<Decimal>,
    pub registration_fee_paid: Option<Decimal>,
    pub dormitory_status: Option<DormitoryStatus>,
    pub dormitory_check_in_date: Option<NaiveDate>,
    pub dormitory_planned_checkout_date: Option<NaiveDate>,
    pub dormitory_actual_checkout_date: Option<NaiveDate>,
    pub dormitory_monthly_rate: Option<Decimal>,
    pub dormitory_paid_amount: Option<Decimal>,
    #[serde(default)]
    pub tuition_remaining: Option<Decimal>,
    #[serde(default)]
    pub registration_remaining: Option<Decimal>,
    #[serde(default)]
    pub dormitory_remaining: Option<Decimal>,
    #[serde(default)]
    pub fully_paid: Option<bool>,
}

impl From<&Student> for StudentCsvRow {
    fn from(student: &Student) -> Self {
        let balances = StudentBalances::of(student);

        Self {
            id: Some(student.id.clone()),
            full_name: student.full_name.clone(),
            date_of_birth: Some(student.date_of_birth),
            passport_number: student.passport_number.clone(),
            jshir: student.jshir.clone(),
            citizenship: student.citizenship.clone(),
            phone: student.phone.clone(),
            email: student.email.clone(),
            emergency_contact_name: student.emergency_contact_name.clone(),
            emergency_contact_phone: student.emergency_contact_phone.clone(),
            group: Some(student.group.clone()),
            course_year: Some(student.course_year),
            major: Some(student.major.clone()),
            language: Some(student.language),
            visa_type: Some(student.visa_type.clone()),
            visa_start_date: student.visa_start_date,
            visa_end_date: student.visa_end_date,
            registration_start_date: student.registration_start_date,
            registration_end_date: student.registration_end_date,
            registration_address_type: Some(student.registration_address_type),
            registration_address_details: student.registration_address_details.clone(),
            tuition_total: Some(student.tuition_total),
            tuition_paid: Some(student.tuition_paid),
            registration_fee_total: Some(student.registration_fee_total),
            registration_fee_paid: Some(student.registration_fee_paid),
            dormitory_status: Some(student.dormitory_status),
            dormitory_check_in_date: student.dormitory_check_in_date,
            dormitory_planned_checkout_date: student.dormitory_planned_checkout_date,
            dormitory_actual_checkout_date: student.dormitory_actual_checkout_date,
            dormitory_monthly_rate: student.dormitory_monthly_rate,
            dormitory_paid_amount: student.dormitory_paid_amount,
            tuition_remaining: Some(balances.tuition_remaining),
            registration_remaining: Some(balances.registration_remaining),
            dormitory_remaining: Some(balances.dormitory_remaining),
            fully_paid: Some(balances.fully_paid),
        }
    }
}

impl From<StudentCsvRow> for StudentInput {
    fn from(row: StudentCsvRow) -> Self {
        Self {
            id: row.id,
            full_name: Some(row.full_name),
            date_of_birth: row.date_of_birth,
            passport_number: Some(row.passport_number),
            jshir: row.jshir,
            citizenship: Some(row.citizenship),
            phone: row.phone,
            email: row.email,
            emergency_contact_name: row.emergency_contact_name,
            emergency_contact_phone: row.emergency_contact_phone,
            academic: Some(AcademicInput {
                group: row.group,
                course_year: row.course_year,
                major: row.major,
                language: row.language,
            }),
            visa: Some(VisaInput {
                visa_type: row.visa_type,
                visa_start_date: row.visa_start_date,
                visa_end_date: row.visa_end_date,
                registration_start_date: row.registration_start_date,
                registration_end_date: row.registration_end_date,
                registration_address_type: row.registration_address_type,
                registration_address_details: row.registration_address_details,
            }),
            tuition: Some(LedgerInput {
                total: row.tuition_total,
                paid: row.tuition_paid,
            }),
            registration_fee: Some(LedgerInput {
                total: row.registration_fee_total,
                paid: row.registration_fee_paid,
            }),
            dormitory: Some(DormitoryInput {
                status: row.dormitory_status,
                check_in_date: row.dormitory_check_in_date,
                planned_checkout_date: row.dormitory_planned_checkout_date,
                actual_checkout_date: row.dormitory_actual_checkout_date,
                monthly_rate: row.dormitory_monthly_rate,
                paid_amount: row.dormitory_paid_amount,
            }),
        }
    }
}

pub fn render_students_csv(students: &[Student]) -> TalabaResult<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for student in students {
        wtr.serialize(StudentCsvRow::from(student))
            .context(CsvSnafu)?;
    }

    wtr.into_inner()
        .map_err(csv::IntoInnerError::into_error)
        .context(CsvFlushSnafu)
}

pub async fn get_export_students(
    State(state): State<TalabaState>,
    _: AuthenticatedUser,
) -> TalabaResult<impl IntoResponse> {
    let students = Student::get_all(&state).await?;
    let body = render_students_csv(&students)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"students.csv\"",
            ),
        ],
        body,
    ))
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ImportRowError {
    pub file: Option<String>,
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub errors: Vec<ImportRowError>,
}

/// A row that parsed, with where it came from.
pub struct DraftRow {
    pub file: Option<String>,
    pub row: usize,
    pub contents: StudentCsvRow,
}

///`row` counts data rows from 1, not including the header
pub fn parse_students_csv(
    file: Option<&str>,
    bytes: &[u8],
    drafts: &mut Vec<DraftRow>,
    errors: &mut Vec<ImportRowError>,
) {
    let mut rdr = csv::Reader::from_reader(bytes);

    for (i, record) in rdr.deserialize::<StudentCsvRow>().enumerate() {
        let row = i + 1;
        match record {
            Ok(contents) => drafts.push(DraftRow {
                file: file.map(ToString::to_string),
                row,
                contents,
            }),
            Err(source) => errors.push(ImportRowError {
                file: file.map(ToString::to_string),
                row,
                message: source.to_string(),
            }),
        }
    }
}

/// Imports every row of every uploaded CSV, or none of them: if any row fails
/// to parse or validate, the problems are reported and nothing is written.
pub async fn put_import_students(
    State(state): State<TalabaState>,
    AuthenticatedUser { user, .. }: AuthenticatedUser,
    mut multipart: Multipart,
) -> TalabaResult<Json<ImportReport>> {
    let mut drafts = vec![];
    let mut errors = vec![];

    loop {
        let Some(field) = multipart.next_field().await.context(MultipartSnafu)? else {
            break;
        };

        let file = field.file_name().map(ToString::to_string);
        let bytes = field.bytes().await.context(MultipartSnafu)?;
        parse_students_csv(file.as_deref(), bytes.as_ref(), &mut drafts, &mut errors);
    }

    let institution = state.config().institution_config();
    let now = Utc::now();
    let mut transaction = state.get_transaction().await?;
    let mut latest_id = Student::max_id(&mut transaction).await?;
    let mut students = Vec::with_capacity(drafts.len());

    for DraftRow {
        file,
        row,
        contents,
    } in drafts
    {
        let id = match requested_id(contents.id.as_deref()) {
            Some(id) => id.to_string(),
            None => next_student_id(&institution.id_prefix, latest_id.as_deref()),
        };
        if latest_id.as_deref().is_none_or(|latest| id.as_str() > latest) {
            latest_id = Some(id.clone());
        }

        match StudentInput::from(contents).into_new_student(id, &institution, now) {
            Ok(student) => students.push(student),
            Err(problems) => errors.push(ImportRowError {
                file,
                row,
                message: problems.as_nice_list().collect::<Vec<_>>().join(", "),
            }),
        }
    }

    if !errors.is_empty() {
        transaction
            .rollback()
            .await
            .context(RollbackTransactionSnafu)?;
        warn!(n = errors.len(), "Rejected student import");

        return Ok(Json(ImportReport {
            imported: 0,
            errors,
        }));
    }

    let imported = students.len();
    for student in students {
        Student::insert_into_database(student, &mut transaction).await?;
    }
    transaction.commit().await.context(CommitTransactionSnafu)?;

    info!(imported, by = %user.username, "Imported students");

    Ok(Json(ImportReport {
        imported,
        errors: vec![],
    }))
}
