use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    /// Login identifier.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password: String,

    pub is_admin: bool,

    #[sea_orm(has_many)]
    pub companies: HasMany<super::company::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
