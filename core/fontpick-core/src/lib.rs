//! fontpick-core: the matchmaker between a style request and a font file
//!
//! Ask for "something serif, bold, a little italic, twelve points" and this
//! crate walks every font it knows, weighs each one against the request and
//! hands back the path of the closest fit. When nothing fits it still answers,
//! falling back to a sensible default rather than leaving you empty-handed.
//!
//! ## Three Steps of a Lookup
//!
//! **Catalog**: meeting every font once
//! - Walks configured roots, system font folders and fontconfig
//! - Reads TrueType/OpenType names and attributes, and AFM headers
//! - Keeps the result in a versioned JSON snapshot for the next start
//!
//! **Scoring**: comparing a request with each face
//! - Family counts ten times more than style, variant, weight, stretch and size
//! - Generic names like `serif` or `monospace` resolve through alias lists
//!
//! **Repair**: coping with a changing disk
//! - A vanished file triggers one catalog rebuild and a second attempt
//! - Memoized answers forget themselves when alias lists change
//!
//! ## A Sample Conversation
//!
//! ```rust,no_run
//! use fontpick_core::config::ManagerConfig;
//! use fontpick_core::manager::FontManager;
//! use fontpick_core::matcher::FindOptions;
//!
//! let manager = FontManager::new(ManagerConfig::from_env());
//! let path = manager.find_font_pattern("serif-12:bold:italic", &FindOptions::default())?;
//! println!("{}", path.display());
//!
//! for note in manager.take_diagnostics() {
//!     eprintln!("warning: {note}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Made with care at FontLab https://www.fontlab.com/

pub mod afm;
pub mod catalog;
pub mod config;
pub mod diagnostics;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod generic;
pub mod manager;
pub mod matcher;
pub mod output;
pub mod pattern;
pub mod properties;
pub mod score;
pub mod snapshot;

pub use catalog::{FontCatalog, FontEntry, FontKind};
pub use error::FontError;
pub use manager::FontManager;
pub use matcher::FindOptions;
pub use properties::FontProperties;
