pub mod admin;
pub mod registry;
pub mod pricing;
pub mod quotes;
pub mod demand;
pub mod surge;
pub mod time_region;
pub mod market;

pub use admin::*;
pub use registry::*;
pub use pricing::*;
pub use quotes::*;
pub use demand::*;
pub use surge::*;
pub use time_region::*;
pub use market::*;
