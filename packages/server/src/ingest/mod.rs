//! Turning multipart game submissions into stored assets and game rows.

mod resolver;
mod upsert;

pub use resolver::{
    MetadataCategory, MetadataResolver, MissingFilePolicy, ResolveError, UploadedFile,
};
pub use upsert::{GameSubmission, UpsertOutcome, find_game, upsert_game};
