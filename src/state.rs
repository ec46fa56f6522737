use crate::{
    config::RuntimeConfiguration,
    error::{GetDatabaseConnectionSnafu, InvalidTodaySnafu, MigrateSnafu, OpenDatabaseSnafu, TalabaResult},
};
use chrono::NaiveDate;
use snafu::{OptionExt, ResultExt};
use sqlx::{Pool, Postgres, Transaction, pool::PoolConnection, postgres::PgPoolOptions};
use std::ops::Deref;

#[derive(Clone, Debug)]
pub struct TalabaState {
    pool: Pool<Postgres>,
    config: RuntimeConfiguration,
}

impl TalabaState {
    pub async fn new(options: PgPoolOptions, config: RuntimeConfiguration) -> TalabaResult<Self> {
        let pool = options
            .connect(&config.db_config().get_db_path())
            .await
            .context(OpenDatabaseSnafu)?;

        sqlx::migrate!().run(&pool).await.context(MigrateSnafu)?;

        Ok(Self { pool, config })
    }

    ///no connection is made until the pool is first used, and no migrations run
    #[cfg(test)]
    pub fn lazy(config: RuntimeConfiguration) -> TalabaResult<Self> {
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.db_config().get_db_path())
            .context(OpenDatabaseSnafu)?;

        Ok(Self { pool, config })
    }

    pub const fn config(&self) -> &RuntimeConfiguration {
        &self.config
    }

    /// The current date where the institution is.
    pub fn today(&self) -> TalabaResult<NaiveDate> {
        self.config
            .institution_config()
            .today()
            .context(InvalidTodaySnafu)
    }

    pub async fn get_connection(&self) -> TalabaResult<PoolConnection<Postgres>> {
        self.pool
            .acquire()
            .await
            .context(GetDatabaseConnectionSnafu)
    }

    pub async fn get_transaction(&self) -> TalabaResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.context(GetDatabaseConnectionSnafu)
    }
}

impl Deref for TalabaState {
    type Target = Pool<Postgres>;

    fn deref(&self) -> &Self::Target {
        &self.pool
    }
}
