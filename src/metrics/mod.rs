pub mod collector;
pub mod registry;
pub mod users;
pub mod util;
