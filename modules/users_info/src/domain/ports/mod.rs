pub mod seed;

pub use seed::{ExternalCompany, ExternalUser, SeedSource, SeedSourceError};
