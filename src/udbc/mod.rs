pub mod value;

pub mod connection;
pub mod deserializer;
pub mod driver;
pub mod param;
pub mod row;
pub mod serializer;

pub const DEFAULT_DB_NAME: &str = "default";
