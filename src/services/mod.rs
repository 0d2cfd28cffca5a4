//! Business logic services.

pub mod admin;
pub mod center;
pub mod course;
pub mod dashboard;
pub mod enquiry;
pub mod identity;
pub mod lifecycle;
pub mod order;
pub mod session;
pub mod student;
pub mod ticket;
