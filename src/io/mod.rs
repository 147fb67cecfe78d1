/// CSV and JSON export of planning results.
pub mod export;
