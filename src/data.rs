use crate::error::TalabaResult;
use sqlx::{PgConnection, Pool, Postgres};

pub mod student;
pub mod student_id;
pub mod user;
pub mod wire;

pub trait DataType: Sized {
    type Id;
    type FormForAdding;

    async fn get_from_db_by_id(id: Self::Id, conn: &mut PgConnection)
    -> TalabaResult<Option<Self>>;
    async fn get_all(pool: &Pool<Postgres>) -> TalabaResult<Vec<Self>>;
    async fn insert_into_database(
        to_be_added: Self::FormForAdding,
        conn: &mut PgConnection,
    ) -> TalabaResult<Self::Id>;
    async fn remove_from_database(id: Self::Id, conn: &mut PgConnection) -> TalabaResult<()>;
}
