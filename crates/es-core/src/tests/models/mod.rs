mod profile;
mod scan_job;
mod scan_status;
mod value_enums;
