use crate::{
    data::user::User,
    error::{BcryptSnafu, ExpiredTokenSnafu, TalabaError, TalabaResult, UnauthenticatedSnafu},
    state::TalabaState,
};
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use bitflags::bitflags;
use secrecy::{ExposeSecret, SecretString};
use snafu::{OptionExt, ResultExt};

pub mod backend;
pub mod token_store;

use token_store::{TokenKind, TokenStore};

bitflags! {
    #[derive(Copy, Clone, Debug, Eq, PartialEq)]
    pub struct PasswordChangeProblems: u8 {
        const SAME_AS_BEFORE =   0b0000_0001;
        const EMPTY =            0b0000_0010;
        const WRONG_CURRENT =    0b0000_0100;
    }
}

impl PasswordChangeProblems {
    pub fn as_nice_list(&self) -> impl Iterator<Item = &'static str> {
        self.iter().filter_map(|e| match e {
            Self::SAME_AS_BEFORE => Some("New password was the same as the current one"),
            Self::EMPTY => Some("New password was empty"),
            Self::WRONG_CURRENT => Some("Current password was incorrect"),
            _ => None,
        })
    }
}

pub async fn verify_password(password: SecretString, hash: SecretString) -> TalabaResult<bool> {
    tokio::task::spawn_blocking(move || {
        bcrypt::verify(password.expose_secret(), hash.expose_secret())
    })
    .await
    .expect("unable to join tokio task")
    .context(BcryptSnafu)
}

///pulls the token out of an `Authorization: Bearer <token>` header
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty()).then_some(token)
}

/// The operator behind a valid access token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub token: String,
}

impl FromRequestParts<TalabaState> for AuthenticatedUser {
    type Rejection = TalabaError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &TalabaState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).context(UnauthenticatedSnafu)?.to_string();

        let mut conn = state.get_connection().await?;
        let user_id = TokenStore::owner_of(&token, TokenKind::Access, &mut conn)
            .await?
            .context(ExpiredTokenSnafu)?;
        let user = User::get_by_id(user_id, &mut conn)
            .await?
            .context(ExpiredTokenSnafu)?;

        Ok(Self { user, token })
    }
}
