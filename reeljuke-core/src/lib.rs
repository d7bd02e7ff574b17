pub mod media_type;
pub mod movie;
pub mod person;

pub use media_type::{MediaType, MediaTypeParseError};
pub use movie::{ID_DISABLED, ID_SKIP, Movie, MovieFile};
pub use person::{FilmographyEntry, Person};
