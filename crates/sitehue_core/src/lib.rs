//! Color model for sitehue.
//!
//! Leaf logic of the extraction pipeline: token normalization, near-duplicate
//! filtering, CSS palette derivation, result types and the shared theme store.
//! Nothing in this crate performs I/O.

pub mod color;
pub mod css;
pub mod error;
pub mod palette;
pub mod similarity;
pub mod theme;

pub use color::{contrast_text, is_dark, normalize, Rgb};
pub use error::{ColorError, Result};
pub use palette::{Palette, PaletteKey, WebsiteColorData, WebsiteData};
pub use similarity::{filter_similar, SIMILARITY_THRESHOLD};
pub use theme::{SubscriptionId, ThemeStore};
