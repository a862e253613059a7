//! Repository module - data access layer.

mod antiflood_repository;

pub use antiflood_repository::AntifloodRepository;
