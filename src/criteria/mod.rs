// Score provider exports
pub mod academia;
pub mod age;
pub mod distance;
pub mod gender;
pub mod languages;
pub mod proximity;

/// Criterion names as they appear in weight tables, score maps, and
/// importance-modifier requests.
pub const GENDER: &str = "gender";
pub const ACADEMIA: &str = "academia";
pub const LANGUAGES: &str = "languages";
pub const AGE_DIFFERENCE: &str = "age_difference";
pub const GEOGRAPHIC_PROXIMITY: &str = "geographic_proximity";

pub use distance::haversine_km;
