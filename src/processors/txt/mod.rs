//! Whitespace separated text files: the first line names the columns and every following line
//! holds one record. Fields are separated by one or more whitespace characters.

mod processor;
pub mod reader;

pub use processor::TxtDataProcessor;
