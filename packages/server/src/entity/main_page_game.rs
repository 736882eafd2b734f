use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A showcase entry on the landing page, curated by staff.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "main_page_game")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(default_value = 0)]
    pub order: i32,
    pub name: String,
    pub author: String,
    pub author_link: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub picture: Option<String>, // asset store path
}

impl ActiveModelBehavior for ActiveModel {}
