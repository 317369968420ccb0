//! Reference entity cache and name resolution

pub mod cache;
pub mod resolver;

pub use cache::EntityCache;
pub use resolver::EntityResolver;
