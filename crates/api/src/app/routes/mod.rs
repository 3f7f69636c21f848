pub mod auth;
pub mod expenses;
pub mod inventory;
pub mod orders;
pub mod system;
