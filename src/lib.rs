// CuePipe Library - playlist core for a play-one-file-at-a-time media queue
// The command-line player in main.rs is a thin shell over these modules

pub mod actions;   // move/delete the file we just watched
pub mod cli;       // argument parsing and the command prompt
pub mod config;    // settings and preferences
pub mod error;     // playlist error type
pub mod media;     // items, classification, catalog
pub mod player;    // external player process
pub mod playlist;  // builder, cursor store, save file codec

// Export the stuff other modules actually use
pub use error::{PlaylistError, Result};
pub use media::{Classifier, Item, ItemCatalog, MediaKind};
pub use playlist::{BuildOptions, PlaylistBuilder, PlaylistStore};
