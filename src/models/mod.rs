//! Database models and DTOs for all domain entities.

pub mod center;
pub mod course;
pub mod enquiry;
pub mod money;
pub mod order;
pub mod pagination;
pub mod principal;
pub mod role;
pub mod stock;
pub mod ticket;
pub mod user;
