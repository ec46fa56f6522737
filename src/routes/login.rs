use crate::{
    auth::{
        AuthenticatedUser,
        backend::{TalabaAuthBackend, TalabaAuthCredentials},
        token_store::{TokenPair, TokenStore},
    },
    data::user::PublicUser,
    error::{
        CommitTransactionSnafu, ExpiredTokenSnafu, InvalidCredentialsSnafu,
        MissingCredentialsSnafu, TalabaResult, UnauthenticatedSnafu,
    },
    state::TalabaState,
};
use axum::{Json, extract::State, http::StatusCode};
use axum_login::AuthnBackend;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};

#[derive(Deserialize)]
pub struct LoginForm {
    username: Option<String>,
    password: Option<SecretString>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    tokens: TokenPair,
    user: PublicUser,
}

pub async fn post_login(
    State(state): State<TalabaState>,
    Json(LoginForm { username, password }): Json<LoginForm>,
) -> TalabaResult<Json<LoginResponse>> {
    let username = username.unwrap_or_default();
    let password = password.filter(|p| !p.expose_secret().is_empty());
    let (false, Some(password)) = (username.trim().is_empty(), password) else {
        return MissingCredentialsSnafu.fail();
    };

    let backend = TalabaAuthBackend::new(state.clone());
    let user = backend
        .authenticate(TalabaAuthCredentials::UsernamePassword { username, password })
        .await?
        .context(InvalidCredentialsSnafu)?;

    let tokens = TokenStore::issue_pair(
        user.id,
        &state.config().auth_config(),
        &mut *state.get_connection().await?,
    )
    .await?;

    info!(username = %user.username, "Logged in");

    Ok(Json(LoginResponse {
        tokens,
        user: PublicUser::from(&user),
    }))
}

#[derive(Deserialize)]
pub struct RefreshForm {
    refresh: Option<String>,
}

pub async fn post_refresh(
    State(state): State<TalabaState>,
    Json(RefreshForm { refresh }): Json<RefreshForm>,
) -> TalabaResult<Json<TokenPair>> {
    let refresh = refresh
        .filter(|refresh| !refresh.trim().is_empty())
        .context(UnauthenticatedSnafu)?;

    let mut transaction = state.get_transaction().await?;
    let user_id = TokenStore::take_refresh(&refresh, &mut transaction)
        .await?
        .context(ExpiredTokenSnafu)?;
    let tokens =
        TokenStore::issue_pair(user_id, &state.config().auth_config(), &mut transaction).await?;
    transaction.commit().await.context(CommitTransactionSnafu)?;

    Ok(Json(tokens))
}

pub async fn post_logout(
    State(state): State<TalabaState>,
    AuthenticatedUser { user, .. }: AuthenticatedUser,
) -> TalabaResult<StatusCode> {
    let revoked = TokenStore::revoke_all(user.id, &mut *state.get_connection().await?).await?;
    info!(username = %user.username, revoked, "Logged out");

    Ok(StatusCode::NO_CONTENT)
}
