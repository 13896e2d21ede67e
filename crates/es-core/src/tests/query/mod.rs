mod filter;
mod query_pairs;
