mod change;
mod models;
mod query;
