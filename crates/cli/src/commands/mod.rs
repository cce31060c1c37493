pub mod build;
pub mod check;
pub mod config_cmd;
pub mod describe;
pub mod instruments;
