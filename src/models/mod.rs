pub mod backup;
pub mod department;
pub mod expense;
pub mod item;
pub mod organization;
pub mod team;
pub mod user;
