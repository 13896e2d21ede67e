mod fixtures;

mod correlation_store;
mod subscriber;
