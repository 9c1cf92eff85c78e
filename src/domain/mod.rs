mod coordinates;
mod location;
mod request_log;

pub use coordinates::{CoordinateKey, Coordinates};
pub use location::{
    Location, LocationFields, LocationId, LocationName, LocationPatch, Lookup, MAX_NAME_LENGTH,
    NameParseError,
};
pub use request_log::RequestLog;
