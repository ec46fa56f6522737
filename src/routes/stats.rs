use crate::{
    analytics::{
        alerts::{Alerts, DEFAULT_TOP_DEBTORS, compute_alerts},
        balance::{StudentStanding, compute_standing},
        fleet::{FleetStats, compute_fleet_stats},
    },
    auth::AuthenticatedUser,
    data::{DataType, student::Student},
    error::{MakeQuerySnafu, MissingStudentSnafu, TalabaResult},
    state::TalabaState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};

pub async fn get_stats(
    State(state): State<TalabaState>,
    _: AuthenticatedUser,
) -> TalabaResult<Json<FleetStats>> {
    let today = state.today()?;
    let students = Student::get_all(&state).await?;

    Ok(Json(compute_fleet_stats(&students, today)))
}

pub async fn get_balance(
    State(state): State<TalabaState>,
    _: AuthenticatedUser,
    Path(id): Path<String>,
) -> TalabaResult<Json<StudentStanding>> {
    let today = state.today()?;
    let student = Student::get_from_db_by_id(id.clone(), &mut *state.get_connection().await?)
        .await?
        .context(MissingStudentSnafu { id })?;

    Ok(Json(compute_standing(&student, today)))
}

#[derive(Deserialize)]
pub struct AlertsQuery {
    limit: Option<usize>,
}

pub async fn get_alerts(
    State(state): State<TalabaState>,
    _: AuthenticatedUser,
    Query(AlertsQuery { limit }): Query<AlertsQuery>,
) -> TalabaResult<Json<Alerts>> {
    let today = state.today()?;
    let students = Student::get_all(&state).await?;

    Ok(Json(compute_alerts(
        &students,
        today,
        limit.unwrap_or(DEFAULT_TOP_DEBTORS),
    )))
}

#[derive(Serialize)]
pub struct Health {
    status: &'static str,
}

pub async fn get_health(State(state): State<TalabaState>) -> TalabaResult<Json<Health>> {
    sqlx::query("SELECT 1")
        .execute(&*state)
        .await
        .context(MakeQuerySnafu)?;

    Ok(Json(Health { status: "ok" }))
}
