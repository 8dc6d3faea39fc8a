/// Database models
///
/// Each module maps one table: a `FromRow` struct with static async CRUD
/// methods over the pool, and `Create*` / `Update*` input structs for
/// mutations. Entities are soft-deleted via a flag, never removed from
/// storage.

pub mod appointment;
pub mod attendance;
pub mod audit;
pub mod doctor;
pub mod inventory;
pub mod invoice;
pub mod medical_record;
pub mod notification;
pub mod service;
pub mod user;
