pub mod enums;
pub mod item;
pub mod patient;
pub mod plan;

pub use item::*;
pub use patient::*;
pub use plan::*;
