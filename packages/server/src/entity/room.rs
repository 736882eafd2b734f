use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A write-once snapshot of a game, addressed by its share code.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "room")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub room_id: String,
    pub game_id: i32, // source game; not a foreign key, games may be deleted later
    pub user_id: Option<i32>,

    pub name: String,
    pub description: Option<String>,
    pub max_users: Option<i32>,
    pub picture: Option<String>,
    pub map: Option<String>,
    pub rules: Option<String>,

    #[sea_orm(column_type = "JsonBinary")]
    pub chips: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub cube: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub decks: Json,
    #[sea_orm(column_type = "JsonBinary")]
    pub objects_json: Json,

    pub date_created: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
