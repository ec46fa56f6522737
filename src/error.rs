use crate::{auth::PasswordChangeProblems, data::student::StudentProblems};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use snafu::Snafu;
use std::num::ParseIntError;
use uuid::Uuid;

pub type TalabaResult<T> = Result<T, TalabaError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TalabaError {
    #[snafu(display("Error opening database"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Error getting db connection"))]
    GetDatabaseConnection { source: sqlx::Error },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Error commiting SQL transaction"))]
    CommitTransaction { source: sqlx::Error },
    #[snafu(display("Error rolling back SQL transaction"))]
    RollbackTransaction { source: sqlx::Error },
    #[snafu(display("Error migrating DB schema"))]
    MigrateError { source: sqlx::migrate::MigrateError },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse integer from env var `{}`", name))]
    ParseEnvInt {
        source: ParseIntError,
        name: &'static str,
    },
    #[snafu(display("Unable to find timezone {:?}", name))]
    InvalidTimezone { source: jiff::Error, name: String },
    #[snafu(display("Unable to convert the current date into a calendar date"))]
    InvalidToday,
    #[snafu(display("A student with ID {:?} already exists", id))]
    DuplicateStudentId { id: String },
    #[snafu(display("A student with passport number {:?} already exists", passport_number))]
    DuplicatePassport { passport_number: String },
    #[snafu(display("Unable to find student with ID: {}", id))]
    MissingStudent { id: String },
    #[snafu(display("Unable to find user with UUID: {}", id))]
    MissingUser { id: Uuid },
    #[snafu(display("Username and password must both be provided"))]
    MissingCredentials,
    #[snafu(display("Incorrect username or password"))]
    InvalidCredentials,
    #[snafu(display("Missing or malformed bearer token"))]
    Unauthenticated,
    #[snafu(display("Token is unknown or has expired"))]
    ExpiredToken,
    #[snafu(display("Invalid student: {}", problems.as_nice_list().collect::<Vec<_>>().join(", ")))]
    InvalidStudent { problems: StudentProblems },
    #[snafu(display("Unable to change password: {}", problems.as_nice_list().collect::<Vec<_>>().join(", ")))]
    InvalidPasswordChange { problems: PasswordChangeProblems },
    #[snafu(display("An administrator account already exists"))]
    AlreadyOnboarded,
    #[snafu(display("Error with hashing/password verification"))]
    Bcrypt { source: bcrypt::BcryptError },
    #[snafu(display("Error with multipart form input"))]
    Multipart {
        source: axum::extract::multipart::MultipartError,
    },
    #[snafu(display("Error with CSVs"))]
    Csv { source: csv::Error },
    #[snafu(display("Error flushing CSV output"))]
    CsvFlush { source: std::io::Error },
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for TalabaError {
    #[allow(clippy::match_same_arms)]
    fn into_response(self) -> Response {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found
        const NA: StatusCode = StatusCode::UNAUTHORIZED; //not authenticated
        const BI: StatusCode = StatusCode::BAD_REQUEST; //bad input
        const CF: StatusCode = StatusCode::CONFLICT; //conflict

        let status_code = match &self {
            Self::OpenDatabase { .. } | Self::GetDatabaseConnection { .. } => ISE,
            Self::MigrateError { .. } => ISE,
            Self::MakeQuery { source } => match source {
                sqlx::Error::RowNotFound => NF,
                _ => ISE,
            },
            Self::CommitTransaction { .. } | Self::RollbackTransaction { .. } => ISE,
            Self::BadEnvVar { .. } | Self::ParseEnvInt { .. } => ISE,
            Self::InvalidTimezone { .. } | Self::InvalidToday => ISE,
            Self::DuplicateStudentId { .. } | Self::DuplicatePassport { .. } => CF,
            Self::MissingStudent { .. } | Self::MissingUser { .. } => NF,
            Self::MissingCredentials => BI,
            Self::InvalidCredentials | Self::Unauthenticated | Self::ExpiredToken => NA,
            Self::InvalidStudent { .. } | Self::InvalidPasswordChange { .. } => BI,
            Self::AlreadyOnboarded => CF,
            Self::Bcrypt { .. } => ISE,
            Self::Multipart { source } => source.status(),
            Self::Csv { .. } => BI,
            Self::CsvFlush { .. } => ISE,
        };

        if status_code.is_server_error() {
            error!(?self, "Error!");
        } else {
            warn!(?self, "Request rejected");
        }

        (
            status_code,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl TalabaError {
    /// Turns a unique-constraint violation on `students` into the matching domain error.
    pub fn from_student_insert(source: sqlx::Error, id: &str, passport_number: &str) -> Self {
        if let sqlx::Error::Database(db_error) = &source {
            if db_error.is_unique_violation() {
                match db_error.constraint() {
                    Some("students_pkey") => {
                        return Self::DuplicateStudentId { id: id.to_string() };
                    }
                    Some("students_passport_number_key") => {
                        return Self::DuplicatePassport {
                            passport_number: passport_number.to_string(),
                        };
                    }
                    _ => {}
                }
            }
        }

        Self::MakeQuery { source }
    }
}
