pub mod access_token;
pub mod change;
pub mod error;
pub mod models;
pub mod query;

pub use access_token::AccessToken;
pub use change::change_event::ChangeEvent;
pub use change::change_kind::ChangeKind;
pub use change::change_record::ChangeRecord;
pub use change::change_sink::ChangeSink;
pub use error::error_kind::ErrorKind;
pub use error::{CoreError, Result as CoreResult};
pub use models::entity::{Entity, EntityKind};
pub use models::linked_repository::{LinkedRepository, NewLinkedRepository};
pub use models::plan::Plan;
pub use models::profile::{NewProfile, Profile, ProfileUpdate};
pub use models::provider::Provider;
pub use models::scan_job::{NewScan, ScanJob, SeverityCounts};
pub use models::scan_log_entry::ScanLogEntry;
pub use models::scan_log_level::ScanLogLevel;
pub use models::scan_status::ScanStatus;
pub use models::scan_type::ScanType;
pub use models::target_type::TargetType;
pub use models::usage::Usage;
pub use query::filter::{Filter, FilterOp};
pub use query::order::Order;
pub use query::query::Query;
pub use query::value_cmp::{compare_values, value_text};

pub use error_location::ErrorLocation;

#[cfg(test)]
mod tests;
