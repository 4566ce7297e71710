pub mod error;
pub mod generator;
pub mod llm;
pub mod parser;
pub mod pdf;
pub mod transcript;
pub mod youtube;
