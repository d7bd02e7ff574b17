//! The built-in metadata plugins.

pub mod imdb;
pub mod moviemeter;
pub mod tvrage;

pub use imdb::ImdbPlugin;
pub use moviemeter::MovieMeterPlugin;
pub use tvrage::TvRagePlugin;
