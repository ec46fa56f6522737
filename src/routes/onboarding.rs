use crate::{
    data::user::{AddUserForm, PublicUser, User},
    error::{AlreadyOnboardedSnafu, CommitTransactionSnafu, MissingCredentialsSnafu, TalabaResult},
    state::TalabaState,
};
use axum::{Json, extract::State, http::StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use snafu::{ResultExt, ensure};

#[derive(Deserialize)]
pub struct NewAdminForm {
    username: Option<String>,
    password: Option<SecretString>,
}

/// Creates the very first operator account. Once anyone exists this is closed.
pub async fn post_add_new_admin(
    State(state): State<TalabaState>,
    Json(NewAdminForm { username, password }): Json<NewAdminForm>,
) -> TalabaResult<(StatusCode, Json<PublicUser>)> {
    let username = username.map(|u| u.trim().to_string()).unwrap_or_default();
    let password = password.filter(|p| !p.expose_secret().trim().is_empty());
    let (false, Some(password)) = (username.is_empty(), password) else {
        return MissingCredentialsSnafu.fail();
    };

    let mut transaction = state.get_transaction().await?;
    //double check that no users exist
    ensure!(
        !User::any_exist(&mut transaction).await?,
        AlreadyOnboardedSnafu
    );

    let id = User::insert_into_database(
        AddUserForm {
            username: username.clone(),
            password,
        },
        &mut transaction,
    )
    .await?;
    transaction.commit().await.context(CommitTransactionSnafu)?;

    info!(%username, "Created first admin account");

    Ok((StatusCode::CREATED, Json(PublicUser { id, username })))
}
