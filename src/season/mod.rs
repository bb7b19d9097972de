//! Season engine.
//!
//! A season is the ordered track list of every release with one of a set of
//! classifications inside a day window `[start, stop)`. Year bounds in
//! queries are inclusive on both ends. Auto-slots (numbered seasons) collect
//! the top two rankings and get windows sized to about the ideal length.

mod content;
mod engine;
mod partition;
mod query;

pub use content::{distinct_track_count, eligible_releases, ordered_track_ids};
pub use engine::{
    autoseason_name, score_as_of, PublishedSeason, SeasonEngine, SeasonSettings,
    DEFAULT_IDEAL_AUTOSEASON_LENGTH, DEFAULT_PLAYLIST_BATCH_SIZE,
};
pub use partition::Partitioner;
pub use query::{parse_request, tokenize, QueryToken, SeasonRequest};
