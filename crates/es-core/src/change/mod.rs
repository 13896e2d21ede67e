pub mod change_event;
pub mod change_kind;
pub mod change_record;
pub mod change_sink;
