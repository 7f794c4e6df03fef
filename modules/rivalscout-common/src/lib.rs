pub mod config;
pub mod domain;
pub mod error;
pub mod geo;
pub mod types;

pub use config::Config;
pub use domain::{normalize_domain, normalize_website_url};
pub use error::RivalScoutError;
pub use geo::{country_to_iso2, is_african, is_east_african, is_west_african, region_name};
pub use types::*;
