//! API 处理器

pub mod cache;
pub mod health;
pub mod lookup;

pub use cache::*;
pub use health::*;
pub use lookup::*;
