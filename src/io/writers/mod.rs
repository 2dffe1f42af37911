pub mod csv;
pub mod json;
pub mod markdown;
pub mod sarif;
pub mod terminal;

pub use csv::CsvWriter;
pub use json::JsonWriter;
pub use markdown::MarkdownWriter;
pub use sarif::SarifWriter;
pub use terminal::TerminalWriter;
