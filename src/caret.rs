// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Caret navigation and selection geometry
//!
//! Grapheme-aware, bidi-aware caret navigation over a [`TextDisplay`], plus
//! hit testing and selection-rectangle geometry. All offsets in this module
//! are UTF-8 byte offsets into the source text, matching [`TextDisplay`] and
//! [`EditableText`](crate::format::EditableText); codepoint-offset conversion
//! happens one layer up, in [`crate::editor`].

use crate::display::{MarkerPos, TextDisplay};
use crate::fonts;
use crate::unicode;
use crate::Vec2;

/// A caret's attachment side relative to a codepoint
///
/// Disambiguates end-of-wrapped-line, bidi direction-change boundaries, and
/// start/end of line, all of which may otherwise map to the same byte offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Affinity {
    /// No specific affinity (e.g. a freshly-constructed position)
    #[default]
    None,
    /// Attached to the trailing edge of the preceding grapheme
    Trailing,
    /// Attached to the leading edge of the following grapheme
    Leading,
    /// Start of a (possibly wrapped) line
    Sol,
    /// End of a (possibly wrapped) line
    Eol,
}

/// A text position: a byte offset plus disambiguating [`Affinity`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextPosition {
    /// Byte offset into the source text
    pub offset: usize,
    /// Attachment side
    pub affinity: Affinity,
}

impl TextPosition {
    /// Construct at `offset` with no particular affinity
    pub fn new(offset: usize) -> Self {
        TextPosition {
            offset,
            affinity: Affinity::None,
        }
    }
}

/// Caret navigation mode (§4.7)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NavMode {
    /// One grapheme at a time, logical order
    #[default]
    Simple,
    /// Additionally stops on both sides of a bidi direction change on the
    /// same line, producing two carets at each direction-change boundary
    Skribidi,
}

/// Whether a hit-test result is used to place a visible caret or a selection
/// endpoint
///
/// Caret placement on soft-wrapped lines may snap a past-end hit to the
/// end-of-line; selection endpoints never do (an empty trailing selection
/// segment would otherwise appear on the next line).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MovementType {
    /// Placing a visible (blinking) caret
    Caret,
    /// Extending or setting a selection endpoint
    Selection,
}

/// The geometry of a rendered caret
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaretGeometry {
    /// Top-left corner
    pub pos: Vec2,
    /// Horizontal slant width (nonzero only for italic/oblique carets)
    pub width: f32,
    /// Height (ascent + descent)
    pub height: f32,
    /// True if the caret's local direction is right-to-left
    pub is_rtl: bool,
}

/// Determine whether two adjacent graphemes cross a bidi direction boundary
/// and (in [`NavMode::Skribidi`]) compute the resulting affinity
///
/// `cur_rtl`/`next_rtl` are the directions of the grapheme ending/starting at
/// the boundary. Returns the affinity to stop at, or `None` to continue past
/// the boundary without stopping (simple mode, or same direction).
fn boundary_stop(mode: NavMode, cur_rtl: bool, next_rtl: bool, from_trailing: bool) -> Option<Affinity> {
    if mode == NavMode::Simple || cur_rtl == next_rtl {
        return None;
    }
    // A direction change: skribidi produces two stops, one on each side.
    if from_trailing {
        Some(Affinity::Leading)
    } else {
        Some(Affinity::Trailing)
    }
}

/// Advance one grapheme forward from `pos`, per the Advance forward algorithm
/// (§4.7). `text` must be the same text `display` was prepared from.
pub fn next_position(display: &TextDisplay, text: &str, pos: TextPosition, mode: NavMode) -> TextPosition {
    let cur = unicode::floor_grapheme_boundary(text, pos.offset);
    let next = unicode::next_grapheme_boundary(text, cur);
    if next >= text.len() && cur >= text.len() {
        return TextPosition {
            offset: text.len(),
            affinity: Affinity::Eol,
        };
    }

    let cur_rtl = grapheme_is_rtl(display, cur);
    let next_rtl = grapheme_is_rtl(display, next.min(text.len().saturating_sub(1).max(next)));
    let next_rtl = if next >= text.len() { cur_rtl } else { next_rtl };

    if let Some(affinity) = boundary_stop(mode, cur_rtl, next_rtl, pos.affinity == Affinity::Trailing) {
        if affinity == Affinity::Trailing && pos.affinity != Affinity::Trailing {
            return TextPosition {
                offset: cur,
                affinity: Affinity::Trailing,
            };
        }
    }

    TextPosition {
        offset: next,
        affinity: Affinity::Trailing,
    }
}

/// Advance one grapheme backward from `pos`; symmetric to [`next_position`]
pub fn prev_position(display: &TextDisplay, text: &str, pos: TextPosition, mode: NavMode) -> TextPosition {
    let cur = unicode::floor_grapheme_boundary(text, pos.offset);
    let prev = if cur == 0 {
        0
    } else {
        unicode::prev_grapheme_boundary(text, cur)
    };
    if prev == 0 && cur == 0 {
        return TextPosition {
            offset: 0,
            affinity: Affinity::Sol,
        };
    }

    let cur_rtl = grapheme_is_rtl(display, prev);
    let next_rtl = grapheme_is_rtl(display, cur.min(text.len().saturating_sub(1)));

    if let Some(affinity) = boundary_stop(mode, cur_rtl, next_rtl, pos.affinity == Affinity::Leading) {
        if affinity == Affinity::Leading && pos.affinity != Affinity::Leading {
            return TextPosition {
                offset: cur,
                affinity: Affinity::Leading,
            };
        }
    }

    TextPosition {
        offset: prev,
        affinity: Affinity::Leading,
    }
}

/// Jump forward to the next word boundary (§4.7 Word navigation)
pub fn next_word(text: &str, pos: TextPosition) -> TextPosition {
    TextPosition {
        offset: unicode::next_word_boundary(text, pos.offset),
        affinity: Affinity::Trailing,
    }
}

/// Jump backward to the previous word boundary
pub fn prev_word(text: &str, pos: TextPosition) -> TextPosition {
    TextPosition {
        offset: unicode::prev_word_boundary(text, pos.offset),
        affinity: Affinity::Leading,
    }
}

/// True if the grapheme starting at byte offset `index` sits on an RTL run
fn grapheme_is_rtl(display: &TextDisplay, index: usize) -> bool {
    display
        .find_line(index)
        .and_then(|(line, _)| display.line_is_rtl(line))
        .unwrap_or(false)
}

/// Hit-test screen position `pos` against `display`, per §4.7 Hit testing
///
/// For [`MovementType::Caret`], a hit past the last glyph of a soft-wrapped
/// line snaps to that line's end (equivalently, the start of the next line) —
/// the usual "click past end of wrapped line places the caret at EOL"
/// behaviour. For [`MovementType::Selection`] this snap is suppressed: the
/// result is pulled back to the last grapheme boundary still on the clicked
/// line, so dragging a selection past the visible text of a wrapped line
/// does not silently extend it onto the next line.
pub fn hit_test(display: &TextDisplay, text: &str, pos: Vec2, movement: MovementType) -> TextPosition {
    let index = display.text_index_nearest(pos);
    if movement == MovementType::Selection {
        if let Some((line, range)) = display.find_line(index) {
            let next_starts_here = display
                .line_range(line + 1)
                .is_some_and(|next| next.start == range.end);
            if index == range.end && next_starts_here {
                let back = unicode::prev_grapheme_boundary(text, index);
                if back >= range.start {
                    return TextPosition {
                        offset: back,
                        affinity: Affinity::None,
                    };
                }
            }
        }
    }
    TextPosition {
        offset: index,
        affinity: Affinity::None,
    }
}

/// Line up/down navigation using a sticky `preferred_x` (§4.7 Line up/down)
pub fn line_vertical(
    display: &TextDisplay,
    current_line: usize,
    delta: isize,
    preferred_x: f32,
) -> Option<TextPosition> {
    let n = display.num_lines();
    if n == 0 {
        return None;
    }
    let target = current_line as isize + delta;
    if target < 0 || target as usize >= n {
        return None;
    }
    let target = target as usize;
    let offset = display.line_index_nearest(target, preferred_x)?;
    Some(TextPosition {
        offset,
        affinity: Affinity::None,
    })
}

/// Compute the visual caret geometry for a text position (§4.7 Visual caret)
///
/// `face_id` is the face active at `pos`, used to give an italic/oblique
/// caret a nonzero slant width; pass the face of the run the caret sits in
/// (e.g. from [`crate::GlyphRun::face_id`]).
pub fn visual_caret(display: &TextDisplay, pos: TextPosition, face_id: fonts::FaceId) -> Option<CaretGeometry> {
    let marker = display.text_glyph_pos(pos.offset).as_slice().first().copied()?;
    Some(caret_from_marker(marker, face_id))
}

fn caret_from_marker(marker: MarkerPos, face_id: fonts::FaceId) -> CaretGeometry {
    let height = marker.ascent + marker.descent;
    CaretGeometry {
        pos: Vec2(marker.pos.0, marker.pos.1 - marker.ascent),
        width: italic_caret_width(face_id, height),
        height,
        is_rtl: marker.is_rtl(),
    }
}

/// Compute an italic caret's slant width for a given face and line height
fn italic_caret_width(face_id: fonts::FaceId, height: f32) -> f32 {
    if fonts::library().get_face(face_id).is_italic() {
        height * 0.15
    } else {
        0.0
    }
}

/// Yield selection-highlight rectangles for `range` (§4.7 Selection rectangles)
///
/// Thin wrapper around [`TextDisplay::highlight_range`]: rectangles are
/// produced per line, unioned within each line's maximal visually-contiguous
/// sub-range.
pub fn selection_rects<F: FnMut(Vec2, Vec2)>(display: &TextDisplay, range: std::ops::Range<usize>, f: F) {
    let mut f = f;
    display.highlight_range(range, &mut f);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn affinity_default() {
        assert_eq!(Affinity::default(), Affinity::None);
        assert_eq!(TextPosition::new(5).offset, 5);
    }

    #[test]
    fn word_nav_positions() {
        let text = "one two three";
        let p = TextPosition::new(0);
        let p = next_word(text, p);
        assert_eq!(p.offset, 4);
        let p = prev_word(text, p);
        assert_eq!(p.offset, 0);
    }
}
