use super::error::Error;
use entity::push_notification_registration_endpoints::{Column, Entity, Model};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

/// Loads every registered push endpoint, ordered by id so dispatches walk the
/// registrations in a stable order.
pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<Model>, Error> {
    Ok(Entity::find().order_by_asc(Column::Id).all(db).await?)
}
