use sea_orm::entity::prelude::*;

/// One-time EIP-4361 challenge for wallet login. Address is stored
/// lower-cased; the nonce is globally unique; consumption is an atomic
/// conditional update on `verified`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "siwe_challenges")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub address: String,
    #[sea_orm(unique)]
    pub nonce: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub verified: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
