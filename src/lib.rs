// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! KAS Rich-Text library
//!
//! This crate provides Unicode-aware text shaping, line-breaking, bidi
//! reordering and alignment, plus (optional) Markdown parsing and
//! in-place text editing.
//!
//! The high-level entry point is [`Text`]; see also [`format`] for
//! supported text representations and [`fonts`] for font selection.

#![cfg_attr(doc_cfg, feature(doc_cfg))]

mod conv;

pub(crate) mod unicode;

pub(crate) mod bidi;

pub mod cache;

mod data;
pub use data::*;

mod env;
pub use env::*;

pub mod fonts;
pub mod format;

mod display;
pub use display::*;

mod text;
pub use text::Text;

pub mod caret;

mod editor;
pub use editor::{ClickCount, EditAction, EditResult, Editor, Paragraph, Selection};

pub(crate) mod shaper;
pub use shaper::{Glyph, GlyphId};

pub mod util;

/// Status of text preparation
///
/// Each variant implies that all prior stages of preparation are complete.
/// See [`display::TextDisplay`] for the preparation pipeline this tracks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    /// No preparation has been done (or the text/font/direction changed)
    New,
    /// Level runs must be re-shaped due to a change in font size only
    ResizeLevelRuns,
    /// Level runs are ready; lines have not been wrapped
    LevelRuns,
    /// Lines have been wrapped and horizontally aligned
    Wrapped,
    /// Fully prepared: wrapped, vertically aligned and ready for display
    Ready,
}
