//! Opaque bearer tokens, kept in `auth_tokens` until they expire or are revoked.

use crate::{
    config::auth::AuthConfig,
    error::{MakeQuerySnafu, TalabaResult},
    state::TalabaState,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use snafu::ResultExt;
use sqlx::PgConnection;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    const fn is_refresh(self) -> bool {
        matches!(self, Self::Refresh)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TokenStore {
    state: TalabaState,
}

impl TokenStore {
    pub const fn new(state: TalabaState) -> Self {
        Self { state }
    }

    async fn save_token(
        token: &str,
        user_id: Uuid,
        kind: TokenKind,
        expires_at: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> TalabaResult<()> {
        sqlx::query(
            "INSERT INTO public.auth_tokens (token, user_id, is_refresh, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(token)
        .bind(user_id)
        .bind(kind.is_refresh())
        .bind(expires_at)
        .execute(conn)
        .await
        .context(MakeQuerySnafu)?;
        Ok(())
    }

    pub async fn issue_pair(
        user_id: Uuid,
        auth_config: &AuthConfig,
        conn: &mut PgConnection,
    ) -> TalabaResult<TokenPair> {
        let now = Utc::now();
        let pair = TokenPair {
            access: auth_config.generate_token(),
            refresh: auth_config.generate_token(),
        };

        Self::save_token(
            &pair.access,
            user_id,
            TokenKind::Access,
            auth_config.access_expiry(now),
            &mut *conn,
        )
        .await?;
        Self::save_token(
            &pair.refresh,
            user_id,
            TokenKind::Refresh,
            auth_config.refresh_expiry(now),
            &mut *conn,
        )
        .await?;

        Ok(pair)
    }

    /// Who a live token belongs to. Expired tokens are deleted on sight.
    pub async fn owner_of(
        token: &str,
        kind: TokenKind,
        conn: &mut PgConnection,
    ) -> TalabaResult<Option<Uuid>> {
        let Some(row) = sqlx::query_as::<_, TokenRow>(
            "SELECT user_id, expires_at FROM public.auth_tokens WHERE token = $1 AND is_refresh = $2",
        )
        .bind(token)
        .bind(kind.is_refresh())
        .fetch_optional(&mut *conn)
        .await
        .context(MakeQuerySnafu)?
        else {
            return Ok(None);
        };

        if row.expires_at <= Utc::now() {
            Self::revoke(token, conn).await?;
            return Ok(None);
        }

        Ok(Some(row.user_id))
    }

    /// Consumes a refresh token, so each one can only be used once.
    pub async fn take_refresh(token: &str, conn: &mut PgConnection) -> TalabaResult<Option<Uuid>> {
        let row = sqlx::query_as::<_, TokenRow>(
            "DELETE FROM public.auth_tokens WHERE token = $1 AND is_refresh RETURNING user_id, expires_at",
        )
        .bind(token)
        .fetch_optional(conn)
        .await
        .context(MakeQuerySnafu)?;

        Ok(row
            .filter(|row| row.expires_at > Utc::now())
            .map(|row| row.user_id))
    }

    pub async fn revoke(token: &str, conn: &mut PgConnection) -> TalabaResult<()> {
        sqlx::query("DELETE FROM public.auth_tokens WHERE token = $1")
            .bind(token)
            .execute(conn)
            .await
            .context(MakeQuerySnafu)?;
        Ok(())
    }

    pub async fn revoke_all(user_id: Uuid, conn: &mut PgConnection) -> TalabaResult<u64> {
        Ok(sqlx::query("DELETE FROM public.auth_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(conn)
            .await
            .context(MakeQuerySnafu)?
            .rows_affected())
    }

    ///revokes every token of the user apart from `keep`
    pub async fn revoke_others(
        user_id: Uuid,
        keep: &str,
        conn: &mut PgConnection,
    ) -> TalabaResult<u64> {
        Ok(
            sqlx::query("DELETE FROM public.auth_tokens WHERE user_id = $1 AND token <> $2")
                .bind(user_id)
                .bind(keep)
                .execute(conn)
                .await
                .context(MakeQuerySnafu)?
                .rows_affected(),
        )
    }

    pub async fn delete_expired(&self) -> TalabaResult<u64> {
        let mut conn = self.state.get_connection().await?;

        Ok(
            sqlx::query("DELETE FROM public.auth_tokens WHERE expires_at <= now()")
                .execute(&mut *conn)
                .await
                .context(MakeQuerySnafu)?
                .rows_affected(),
        )
    }

    /// Purges expired tokens every `period`, forever.
    pub async fn continuously_delete_expired(self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match self.delete_expired().await {
                Ok(0) => {}
                Ok(deleted) => debug!(deleted, "Purged expired tokens"),
                Err(e) => error!(?e, "Error purging expired tokens"),
            }
        }
    }
}
