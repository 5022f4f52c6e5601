pub mod accounts;
pub mod audit_logs;
pub mod cart_items;
pub mod carts;
pub mod listings;

pub use accounts::Entity as Accounts;
pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use listings::Entity as Listings;
