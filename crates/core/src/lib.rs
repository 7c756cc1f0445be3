pub mod address;
pub mod config;
pub mod document;
pub mod error;
pub mod message;
pub mod request;
pub mod size;

pub use address::{is_valid_address, validate_address};
pub use config::Config;
pub use document::*;
pub use error::*;
pub use message::*;
pub use request::*;
pub use size::format_size;
