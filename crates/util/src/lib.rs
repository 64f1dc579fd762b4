pub mod config;
pub mod path_processing;

pub use config::*;
pub use path_processing::*;
