use crate::{
    auth::verify_password,
    data::user::User,
    error::TalabaError,
    state::TalabaState,
};
use async_trait::async_trait;
use axum_login::{AuthnBackend, UserId};
use secrecy::SecretString;

#[derive(Clone)]
pub struct TalabaAuthBackend {
    state: TalabaState,
}

impl TalabaAuthBackend {
    pub const fn new(state: TalabaState) -> Self {
        Self { state }
    }
}

pub enum TalabaAuthCredentials {
    UsernamePassword {
        username: String,
        password: SecretString,
    },
}

#[async_trait]
impl AuthnBackend for TalabaAuthBackend {
    type User = User;
    type Credentials = TalabaAuthCredentials;
    type Error = TalabaError;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        let mut conn = self.state.get_connection().await?;

        match creds {
            TalabaAuthCredentials::UsernamePassword { username, password } => {
                let Some(user) = User::get_by_username(&username, &mut conn).await? else {
                    return Ok(None);
                };

                let password_verification_result =
                    verify_password(password, user.bcrypt_hashed_password.clone()).await?;

                Ok(password_verification_result.then_some(user))
            }
        }
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        User::get_by_id(*user_id, &mut *self.state.get_connection().await?).await
    }
}
