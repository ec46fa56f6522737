use crate::error::{BcryptSnafu, MakeQuerySnafu, MissingUserSnafu, TalabaResult};
use axum_login::AuthUser;
use bcrypt::DEFAULT_COST;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use snafu::{ResultExt, ensure};
use sqlx::PgConnection;
use uuid::Uuid;

/// An operator account allowed to use the API.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub bcrypt_hashed_password: SecretString,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    bcrypt_hashed_password: String,
}

impl From<UserRow> for User {
    fn from(
        UserRow {
            id,
            username,
            bcrypt_hashed_password,
        }: UserRow,
    ) -> Self {
        Self {
            id,
            username,
            bcrypt_hashed_password: SecretString::from(bcrypt_hashed_password),
        }
    }
}

///what gets shown to API clients about a user
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

pub struct AddUserForm {
    pub username: String,
    pub password: SecretString,
}

pub async fn hash_password(password: SecretString) -> TalabaResult<String> {
    tokio::task::spawn_blocking(move || {
        bcrypt::hash(password.expose_secret().as_bytes(), DEFAULT_COST)
    })
    .await
    .expect("unable to join tokio task")
    .context(BcryptSnafu)
}

impl User {
    pub async fn get_by_username(
        username: &str,
        conn: &mut PgConnection,
    ) -> TalabaResult<Option<Self>> {
        Ok(sqlx::query_as::<_, UserRow>(
            "SELECT id, username, bcrypt_hashed_password FROM public.users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(conn)
        .await
        .context(MakeQuerySnafu)?
        .map(Self::from))
    }

    pub async fn any_exist(conn: &mut PgConnection) -> TalabaResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT exists(SELECT 1 FROM public.users)")
            .fetch_one(conn)
            .await
            .context(MakeQuerySnafu)
    }

    pub async fn set_password(
        id: Uuid,
        password: SecretString,
        conn: &mut PgConnection,
    ) -> TalabaResult<()> {
        let hashed = hash_password(password).await?;

        let affected =
            sqlx::query("UPDATE public.users SET bcrypt_hashed_password = $2 WHERE id = $1")
                .bind(id)
                .bind(hashed)
                .execute(conn)
                .await
                .context(MakeQuerySnafu)?
                .rows_affected();

        ensure!(affected > 0, MissingUserSnafu { id });
        Ok(())
    }

    pub async fn get_by_id(id: Uuid, conn: &mut PgConnection) -> TalabaResult<Option<Self>> {
        Ok(sqlx::query_as::<_, UserRow>(
            "SELECT id, username, bcrypt_hashed_password FROM public.users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await
        .context(MakeQuerySnafu)?
        .map(Self::from))
    }

    pub async fn insert_into_database(
        AddUserForm { username, password }: AddUserForm,
        conn: &mut PgConnection,
    ) -> TalabaResult<Uuid> {
        let hashed = hash_password(password).await?;

        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO public.users (username, bcrypt_hashed_password) VALUES ($1, $2) RETURNING id",
        )
        .bind(username)
        .bind(hashed)
        .fetch_one(conn)
        .await
        .context(MakeQuerySnafu)
    }
}

impl AuthUser for User {
    type Id = Uuid;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn session_auth_hash(&self) -> &[u8] {
        self.bcrypt_hashed_password.expose_secret().as_bytes()
    }
}
