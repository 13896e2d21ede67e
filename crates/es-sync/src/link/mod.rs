pub mod code_exchange;
pub mod correlation_store;
pub mod link_flow;
pub mod link_state;
