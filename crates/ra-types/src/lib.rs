pub mod errors;
pub mod params;
pub mod record;

pub use errors::*;
pub use params::*;
pub use record::*;
