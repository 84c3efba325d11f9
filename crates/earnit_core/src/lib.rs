pub mod alert;
pub mod config;
pub mod driver;
pub mod error;
pub mod model;
pub mod notify;
pub mod session;
pub mod storage;
