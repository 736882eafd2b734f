use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A subscription plan offered on the pricing page.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tariff")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    pub price: i32,

    #[sea_orm(has_many)]
    pub features: HasMany<super::feature::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
