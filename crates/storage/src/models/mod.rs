mod points;
mod profile;
mod race;
mod result;

pub use points::Points;
pub use profile::{ParticipantProfile, TeamProfile};
pub use race::Race;
pub use result::{RaceResult, ResultKind, ResultSelection, TeamResult};

pub type RaceId = i64;
pub type ParticipantId = i64;
pub type TeamId = i64;
pub type ResultId = i64;
