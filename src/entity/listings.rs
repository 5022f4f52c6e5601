use sea_orm::entity::prelude::*;

// `search_document` is a generated tsvector column; it is only read through raw SQL.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "listings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub address: Option<String>,
    pub keywords: Option<String>,
    pub images: Option<String>,
    pub description: Option<String>,
    pub category: String,
    pub price: i64,
    pub contact_email: String,
    pub contact_number: String,
    pub owner_id: Uuid,
    pub approved: bool,
    pub available: bool,
    pub subscription: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::OwnerId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
