use super::error::Error;
use entity::sessions::{Column, Entity};
use log::*;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};

/// Counts the session rows stored under `id`.
pub async fn count_by_id(db: &DatabaseConnection, id: &str) -> Result<u64, Error> {
    let count = Entity::find()
        .filter(Column::Id.eq(id))
        .count(db)
        .await?;

    trace!("Found {count} session row(s) for the supplied id");

    Ok(count)
}
