use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "company")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    #[sea_orm(unique)]
    pub email: Option<String>,

    #[sea_orm(unique)]
    pub website: Option<String>,

    /// Either an absolute http(s) URL or a path relative to the public
    /// storage root (`companies/<generated>`). See [`crate::store::company::Logo`].
    pub logo: Option<String>,

    /// Set once at creation from the acting user.
    pub created_by: i32,
    #[sea_orm(belongs_to, from = "created_by", to = "id")]
    pub creator: HasOne<super::user::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
