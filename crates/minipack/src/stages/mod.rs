pub mod chunk;
pub mod generate;
pub mod scan;
