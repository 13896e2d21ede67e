pub mod entity_store;
pub mod memory_store;
pub mod rest_store;
