use crate::{
    analytics::search::filter_students,
    auth::AuthenticatedUser,
    data::{
        DataType,
        student::Student,
        student_id::{next_student_id, requested_id},
        wire::{StudentInput, StudentView},
    },
    error::{CommitTransactionSnafu, MissingStudentSnafu, TalabaError, TalabaResult},
    state::TalabaState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use snafu::{OptionExt, ResultExt};

#[derive(Deserialize)]
pub struct SearchQuery {
    search: Option<String>,
}

pub async fn get_students(
    State(state): State<TalabaState>,
    _: AuthenticatedUser,
    Query(SearchQuery { search }): Query<SearchQuery>,
) -> TalabaResult<Json<Vec<StudentView>>> {
    let students = Student::get_all(&state).await?;

    Ok(Json(
        filter_students(students, search.as_deref())
            .iter()
            .map(StudentView::from)
            .collect(),
    ))
}

pub async fn get_student(
    State(state): State<TalabaState>,
    _: AuthenticatedUser,
    Path(id): Path<String>,
) -> TalabaResult<Json<StudentView>> {
    let student = Student::get_from_db_by_id(id.clone(), &mut *state.get_connection().await?)
        .await?
        .context(MissingStudentSnafu { id })?;

    Ok(Json(StudentView::from(&student)))
}

pub async fn post_new_student(
    State(state): State<TalabaState>,
    AuthenticatedUser { user, .. }: AuthenticatedUser,
    Json(input): Json<StudentInput>,
) -> TalabaResult<(StatusCode, Json<StudentView>)> {
    let institution = state.config().institution_config();
    let mut transaction = state.get_transaction().await?;

    let id = match requested_id(input.id.as_deref()) {
        Some(id) => id.to_string(),
        None => next_student_id(
            &institution.id_prefix,
            Student::max_id(&mut transaction).await?.as_deref(),
        ),
    };

    let student = input
        .into_new_student(id, &institution, Utc::now())
        .map_err(|problems| TalabaError::InvalidStudent { problems })?;
    Student::insert_into_database(student.clone(), &mut transaction).await?;
    transaction.commit().await.context(CommitTransactionSnafu)?;

    info!(id = %student.id, by = %user.username, "Created student");

    Ok((StatusCode::CREATED, Json(StudentView::from(&student))))
}

/// Serves both `PUT` and `PATCH`: only what the body carries is changed.
pub async fn update_student(
    State(state): State<TalabaState>,
    AuthenticatedUser { user, .. }: AuthenticatedUser,
    Path(id): Path<String>,
    Json(input): Json<StudentInput>,
) -> TalabaResult<Json<StudentView>> {
    let mut transaction = state.get_transaction().await?;

    let mut student = Student::get_from_db_by_id(id.clone(), &mut transaction)
        .await?
        .context(MissingStudentSnafu { id })?;
    input.apply_to(&mut student);
    student.validate()?;

    student.updated_at = student.update_in_database(&mut transaction).await?;
    transaction.commit().await.context(CommitTransactionSnafu)?;

    info!(id = %student.id, by = %user.username, "Updated student");

    Ok(Json(StudentView::from(&student)))
}

pub async fn delete_student(
    State(state): State<TalabaState>,
    AuthenticatedUser { user, .. }: AuthenticatedUser,
    Path(id): Path<String>,
) -> TalabaResult<StatusCode> {
    Student::remove_from_database(id.clone(), &mut *state.get_connection().await?).await?;
    info!(%id, by = %user.username, "Deleted student");

    Ok(StatusCode::NO_CONTENT)
}
