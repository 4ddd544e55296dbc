pub mod csv;

pub use self::csv::CsvSentimentRepository;
