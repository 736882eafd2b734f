use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ROLE: &str = "user";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(unique)]
    pub email: String, // normalized, see utils::email
    pub password: String,
    pub phone: Option<String>,

    #[sea_orm(default_value = false)]
    pub is_verified: bool,
    pub verification_code: Option<String>,
    pub verification_code_created: Option<DateTimeUtc>,

    pub role: String,
    #[sea_orm(default_value = true)]
    pub active: bool,

    pub date_joined: DateTimeUtc,

    pub subscription_id: Option<i32>,
    #[sea_orm(belongs_to, from = "subscription_id", to = "id", on_delete = "SetNull")]
    pub subscription: HasOne<super::tariff::Entity>,
    pub end_date: Option<DateTimeUtc>,
    #[sea_orm(default_value = false)]
    pub free_trial: bool,
}

impl ActiveModelBehavior for ActiveModel {}
