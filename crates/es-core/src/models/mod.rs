pub mod entity;
pub mod linked_repository;
pub mod plan;
pub mod profile;
pub mod provider;
pub mod scan_job;
pub mod scan_log_entry;
pub mod scan_log_level;
pub mod scan_status;
pub mod scan_type;
pub mod serde_helpers;
pub mod target_type;
pub mod usage;
