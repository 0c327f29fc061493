pub mod account;
pub mod math;
pub mod time;

pub use account::*;
pub use math::*;
pub use time::*;
