pub mod builder;
pub mod codec;
pub mod store;

pub use builder::{BuildOptions, BuildOutcome, Diagnostic, PlaylistBuilder};
pub use codec::{LoadedPlaylist, SaveDocument, DEFAULT_SAVE_FILE};
pub use store::PlaylistStore;
