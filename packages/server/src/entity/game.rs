use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "game")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(indexed)]
    pub user_id: Option<i32>,
    pub description: Option<String>,
    pub max_users: Option<i32>,

    // Asset store paths, not URLs.
    pub picture: Option<String>,
    pub map: Option<String>,
    pub rules: Option<String>,

    #[sea_orm(column_type = "JsonBinary")]
    pub chips: Json, // array of resolved descriptors
    #[sea_orm(column_type = "JsonBinary")]
    pub cube: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub decks: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub objects_json: Json,

    pub date_created: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
