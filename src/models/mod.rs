pub mod db_config;
pub mod db_type;
