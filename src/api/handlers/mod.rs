mod locations;
mod weather;

pub(crate) use locations::{
    create_location, delete_location, get_location, list_locations, update_location,
};
pub(crate) use weather::weather;

pub use locations::{CreateLocationRequest, UpdateLocationRequest};
pub use weather::CACHE_STATUS_HEADER;
