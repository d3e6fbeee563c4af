pub mod http_seed_source;

pub use http_seed_source::HttpSeedSource;
