pub mod config;
pub mod demand;
pub mod discount;
pub mod host;
pub mod market;
pub mod overrides;
pub mod quote;
pub mod surge;

pub use config::*;
pub use demand::*;
pub use discount::*;
pub use host::*;
pub use market::*;
pub use overrides::*;
pub use quote::*;
pub use surge::*;
