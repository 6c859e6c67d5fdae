use crate::EndpointId;
use sea_orm::entity::prelude::*;

/// A browser push subscription registered through the website.
///
/// `key` is the subscription's P-256 public key (`p256dh`) and `auth_secret` its
/// authentication secret, both base64url encoded as handed out by the browser.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "push_notification_registration_endpoints")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: EndpointId,
    #[sea_orm(column_type = "Text")]
    pub url: String,
    #[sea_orm(column_type = "Text")]
    pub key: String,
    #[sea_orm(column_type = "Text")]
    pub auth_secret: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
