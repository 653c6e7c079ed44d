pub mod config;
pub mod error;
pub mod ids;
pub mod palette;
pub mod realtime;

pub use error::*;
pub use ids::*;
pub use palette::*;
