pub mod dynamodb;
pub mod memory;
pub mod repository;

pub use dynamodb::*;
pub use memory::*;
pub use repository::*;
