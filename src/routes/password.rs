use crate::{
    auth::{AuthenticatedUser, PasswordChangeProblems, token_store::TokenStore, verify_password},
    data::user::User,
    error::{CommitTransactionSnafu, InvalidPasswordChangeSnafu, TalabaResult},
    state::TalabaState,
};
use axum::{Json, extract::State};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordForm {
    current_password: Option<SecretString>,
    new_password: Option<SecretString>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    message: &'static str,
}

pub async fn post_change_password(
    State(state): State<TalabaState>,
    AuthenticatedUser { user, token }: AuthenticatedUser,
    Json(ChangePasswordForm {
        current_password,
        new_password,
    }): Json<ChangePasswordForm>,
) -> TalabaResult<Json<MessageResponse>> {
    let mut problems = PasswordChangeProblems::empty();

    let current_is_right = match current_password {
        Some(current_password) => {
            verify_password(current_password, user.bcrypt_hashed_password.clone()).await?
        }
        None => false,
    };
    if !current_is_right {
        problems |= PasswordChangeProblems::WRONG_CURRENT;
    }

    let new_password = new_password.filter(|p| !p.expose_secret().trim().is_empty());
    match &new_password {
        None => problems |= PasswordChangeProblems::EMPTY,
        Some(new_password) => {
            if verify_password(new_password.clone(), user.bcrypt_hashed_password.clone()).await? {
                problems |= PasswordChangeProblems::SAME_AS_BEFORE;
            }
        }
    }

    let new_password = match (problems.is_empty(), new_password) {
        (true, Some(new_password)) => new_password,
        _ => return InvalidPasswordChangeSnafu { problems }.fail(),
    };

    let mut transaction = state.get_transaction().await?;
    User::set_password(user.id, new_password, &mut transaction).await?;
    TokenStore::revoke_others(user.id, &token, &mut transaction).await?;
    transaction.commit().await.context(CommitTransactionSnafu)?;

    info!(username = %user.username, "Changed password");

    Ok(Json(MessageResponse {
        message: "Password changed successfully",
    }))
}
