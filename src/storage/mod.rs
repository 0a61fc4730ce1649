pub mod db;
pub mod records;
pub mod store;
