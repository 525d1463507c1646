pub mod attempt;
pub mod statement;
pub mod store;
