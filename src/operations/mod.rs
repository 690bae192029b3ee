pub mod auth;
pub mod backup;
pub mod browse;
pub mod budget;
pub mod expense;
pub mod export;
pub mod import;
pub mod invoice;
pub mod organization;
pub mod remove;
