/// Fixed data provider
/// The airport catalog is loaded once at startup and never changes afterwards.
pub mod catalog;
pub mod types;
