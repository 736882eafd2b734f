use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feature")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    #[sea_orm(indexed)]
    pub tariff_id: i32,
    #[sea_orm(belongs_to, from = "tariff_id", to = "id", on_delete = "Cascade")]
    pub tariff: HasOne<super::tariff::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
