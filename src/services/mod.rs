// Service exports
pub mod geocode;
pub mod roster;

pub use geocode::{GeoCache, GeocodeClient, GeocodeError};
pub use roster::{load_mentees, load_mentors, RosterError};
