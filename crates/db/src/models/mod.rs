//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts
//! - Update DTOs (all `Option` fields) where patches are allowed

pub mod alert;
pub mod custody;
pub mod detection;
pub mod face;
pub mod job;
pub mod motion;
pub mod status;
pub mod video;
