pub mod quote_provider;
pub mod yahoo;

// Re-export commonly used types
pub use quote_provider::QuoteProvider;
pub use yahoo::YahooFinanceClient;
