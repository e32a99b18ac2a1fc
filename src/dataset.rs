pub mod error;
pub mod loader;
pub mod models;

pub use error::DatasetError;
pub use loader::{
    distinct_cities, filter_by_date_range, load_observations, read_observations, save_annotated,
};
pub use models::*;
