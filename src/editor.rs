// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Multi-paragraph text editing
//!
//! [`Editor`] maintains an ordered sequence of [`Paragraph`]s, splitting text
//! on paragraph-separator codepoints (CR, LF, CRLF, NEL, PS, LS) so that each
//! paragraph owns its own [`Text`], layout and version counter, and can be
//! relaid out independently of the rest of the document. Caret and selection
//! positions are UTF-8 byte offsets into the *full* (concatenated) text,
//! matching [`crate::caret`]; bulk operations ([`Editor::replace_range`])
//! additionally accept codepoint offsets (`usize` = "the `n`th `char`"), the
//! unit an IME or external text-editing widget more naturally works in,
//! converting to/from bytes at the boundary via [`crate::conv`].
//!
//! A paragraph's own text includes its trailing separator, so paragraph
//! boundaries are simply points where one paragraph's text ends and the next
//! begins; there is no separate "gap" to account for.

use crate::caret::{self, Affinity, MovementType, NavMode, TextPosition};
use crate::conv::codepoint_to_utf8;
use crate::fonts::FontSelector;
use crate::format::EditableText;
use crate::{unicode, Align, Direction, Status, Text, Vec2};

/// A single paragraph within an [`Editor`]
///
/// Wraps a [`Text`] together with a monotonic version counter (bumped
/// whenever this paragraph is rebuilt by an edit) and its position within
/// the editor: the byte offset of its first codepoint in the full text
/// (`text_start_offset`) and its vertical offset (`y`). Both are recomputed
/// whenever the paragraph list's structure or a preceding paragraph's extent
/// changes; see [`Editor::replace_range`] and [`Editor::recompute_y_offsets`].
#[derive(Clone, Debug)]
pub struct Paragraph<T: EditableText> {
    text: Text<T>,
    version: u32,
    text_start_offset: usize,
    y: f32,
}

impl<T: EditableText> Paragraph<T> {
    fn new(text: Text<T>, text_start_offset: usize) -> Self {
        Paragraph {
            text,
            version: 0,
            text_start_offset,
            y: 0.0,
        }
    }

    /// The current version; bumped whenever this paragraph is rebuilt
    pub fn version(&self) -> u32 {
        self.version
    }

    /// The wrapped [`Text`]
    pub fn text(&self) -> &Text<T> {
        &self.text
    }

    /// Byte offset of this paragraph's first codepoint in the editor's full text
    pub fn text_start_offset(&self) -> usize {
        self.text_start_offset
    }

    /// Number of bytes this paragraph occupies, including its trailing
    /// separator (if any)
    pub fn text_count(&self) -> usize {
        self.text.str_len()
    }

    /// Vertical offset of this paragraph's top within the editor
    pub fn y(&self) -> f32 {
        self.y
    }
}

/// Mouse-click classification, by repetition count within the double-click
/// interval (§4.9)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickCount {
    /// Single click: places the caret
    Single,
    /// Double click: selects the word under the cursor
    Double,
    /// Triple click (or more): selects the whole paragraph
    Triple,
}

/// Maximum interval between clicks, in milliseconds, still counted as a
/// repeat click for the purpose of double/triple-click detection
pub const DOUBLE_CLICK_INTERVAL_MS: u32 = 400;

/// A text selection: an anchor and an active (caret) end
///
/// Both ends are byte offsets into the full (concatenated) text. The anchor
/// is fixed when extending a selection; the active end moves. `range()`
/// returns the pair in text order, as required when drawing selection
/// highlights, which is not necessarily the order in which the endpoints
/// were set (e.g. a backward drag from a later to an earlier position keeps
/// `active < anchor`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    /// The end that does not move as the selection is extended
    pub anchor: TextPosition,
    /// The end that follows caret movement
    pub active: TextPosition,
}

impl Selection {
    /// A collapsed selection (no selected text) at `pos`
    pub fn at(pos: TextPosition) -> Self {
        Selection {
            anchor: pos,
            active: pos,
        }
    }

    /// True if the selection is empty (anchor == active)
    pub fn is_empty(&self) -> bool {
        self.anchor.offset == self.active.offset
    }

    /// The selected byte range, in text order
    pub fn range(&self) -> std::ops::Range<usize> {
        let a = self.anchor.offset;
        let b = self.active.offset;
        a.min(b)..a.max(b)
    }
}

/// Key-based edit and navigation commands (§4.9 Key handling)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditAction {
    /// Move the caret one grapheme left/right (`true` = extend selection)
    CaretLeft(bool),
    CaretRight(bool),
    /// Move the caret one word left/right
    WordLeft(bool),
    WordRight(bool),
    /// Move the caret to start/end of the (wrapped) line
    Home(bool),
    End(bool),
    /// Move the caret up/down one (wrapped) line
    LineUp(bool),
    LineDown(bool),
    /// Delete the grapheme before the caret (or the selection, if non-empty)
    Backspace,
    /// Delete the grapheme after the caret (or the selection, if non-empty)
    Delete,
    /// Insert a line break
    Enter,
}

/// Result of an edit operation: whether the text content changed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EditResult {
    /// True if the text content (not just the caret/selection) changed
    pub text_changed: bool,
}

/// Editor over an ordered sequence of editable paragraphs
///
/// Generic over the editable text container (`String`, or
/// [`crate::format::Markdown`] when the `markdown` feature is enabled). Font,
/// size, direction, wrap width, alignment and bounds are configured once on
/// the editor (via [`Text::new`] passed to [`Editor::new`], or the `set_*`
/// methods below) and applied to every paragraph, including ones created
/// later by splitting; each paragraph's [`Text`] must still be
/// [prepared][Text::prepare] by the caller like any other `Text` before
/// display-dependent queries (hit testing, line up/down, `y` offsets) work.
pub struct Editor<T: EditableText + Default> {
    paragraphs: Vec<Paragraph<T>>,
    font: FontSelector,
    dpem: f32,
    wrap_width: f32,
    align: (Align, Align),
    direction: Direction,
    bounds: Vec2,
    selection: Selection,
    nav_mode: NavMode,
    preferred_x: Option<f32>,
    last_click: Option<(f32, f32, u64)>,
    click_count: u32,
    on_change: Option<Box<dyn FnMut(&[Paragraph<T>])>>,
}

impl<T: EditableText + Default> Default for Editor<T> {
    fn default() -> Self {
        Editor::new(Text::default())
    }
}

impl<T: EditableText + Default> Editor<T> {
    /// Construct from a [`Text`], splitting its content into paragraphs
    ///
    /// The given text's font, size, direction, wrap width, alignment and
    /// bounds become the template applied to every paragraph.
    pub fn new(text: Text<T>) -> Self {
        let font = text.font();
        let dpem = text.font_size();
        let wrap_width = text.wrap_width();
        let align = text.align();
        let direction = text.direction();
        let bounds = text.bounds();
        let content = text.take_text();

        let mut ed = Editor {
            paragraphs: Vec::new(),
            font,
            dpem,
            wrap_width,
            align,
            direction,
            bounds,
            selection: Selection::default(),
            nav_mode: NavMode::default(),
            preferred_x: None,
            last_click: None,
            click_count: 0,
            on_change: None,
        };
        ed.paragraphs = ed.split_into_paragraphs(content.as_str());
        ed
    }

    /// Set the navigation mode (simple or skribidi)
    pub fn set_nav_mode(&mut self, mode: NavMode) {
        self.nav_mode = mode;
    }

    /// Install the single `on_change` callback, invoked after every edit that
    /// changes text content (not on caret-only movement), with the current
    /// paragraph list. There is no partial-update signal: consumers re-query
    /// paragraphs and compare [`Paragraph::version`] to find what changed.
    pub fn set_on_change<F: FnMut(&[Paragraph<T>]) + 'static>(&mut self, f: F) {
        self.on_change = Some(Box::new(f));
    }

    /// The paragraph sequence
    pub fn paragraphs(&self) -> &[Paragraph<T>] {
        &self.paragraphs
    }

    /// The current selection (collapsed if there is none)
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Total length of the full text, in bytes
    pub fn len(&self) -> usize {
        self.paragraphs
            .last()
            .map(|p| p.text_start_offset + p.text_count())
            .unwrap_or(0)
    }

    /// Concatenate every paragraph's text into the full (editor-wide) text
    ///
    /// This is the unit `replace_range`'s codepoint offsets and
    /// [`Editor::caret_codepoint`] are defined over; paragraphs are purely an
    /// internal layout/versioning split, not a separate addressing scheme.
    pub fn full_text(&self) -> String {
        let mut s = String::with_capacity(self.len());
        for p in &self.paragraphs {
            s.push_str(p.text.as_str());
        }
        s
    }

    /// The caret's position as a codepoint offset (the `n`th `char`) into
    /// the full text
    pub fn caret_codepoint(&self) -> usize {
        crate::conv::utf8_to_codepoint(&self.full_text(), self.selection.active.offset)
    }

    /// Set text bounds, applying to every existing paragraph and the
    /// template used for paragraphs created later
    ///
    /// As with [`Text::set_bounds`], bounds are expected to be finite; an
    /// editor constructed without finite bounds (the default) simply leaves
    /// new paragraphs' `Text` unbounded, same as a freshly-constructed
    /// `Text` does, until this is called.
    pub fn set_bounds(&mut self, bounds: Vec2) {
        self.bounds = bounds;
        if bounds.is_finite() {
            for p in self.paragraphs.iter_mut() {
                p.text.set_bounds(bounds);
            }
        }
    }

    /// Set the wrap width, applying to every paragraph
    pub fn set_wrap_width(&mut self, wrap_width: f32) {
        self.wrap_width = wrap_width;
        for p in self.paragraphs.iter_mut() {
            p.text.set_wrap_width(wrap_width);
        }
    }

    /// Set the font selector, applying to every paragraph
    pub fn set_font(&mut self, font: FontSelector) {
        self.font = font;
        for p in self.paragraphs.iter_mut() {
            p.text.set_font(font);
        }
    }

    /// Set the font size (dots per em), applying to every paragraph
    pub fn set_font_size(&mut self, dpem: f32) {
        self.dpem = dpem;
        for p in self.paragraphs.iter_mut() {
            p.text.set_font_size(dpem);
        }
    }

    /// Set the base text direction, applying to every paragraph
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
        for p in self.paragraphs.iter_mut() {
            p.text.set_direction(direction);
        }
    }

    /// Set text alignment, applying to every paragraph
    pub fn set_align(&mut self, align: (Align, Align)) {
        self.align = align;
        for p in self.paragraphs.iter_mut() {
            p.text.set_align(align);
        }
    }

    /// Recompute each paragraph's vertical offset from its prepared height
    ///
    /// Call after (re-)preparing paragraphs' `Text`s, or whenever a
    /// preceding paragraph's prepared height may have changed. Paragraphs
    /// not yet wrapped contribute no height to the accumulation (matching
    /// the position they had before preparation).
    pub fn recompute_y_offsets(&mut self) {
        let mut y = 0.0f32;
        for p in self.paragraphs.iter_mut() {
            p.y = y;
            if let Ok((tl, br)) = p.text.bounding_box() {
                y += br.1 - tl.1;
            }
        }
    }

    fn make_text(&self, s: &str) -> Text<T> {
        let mut t = Text::new(Self::text_from_str(s));
        t.set_font(self.font);
        t.set_font_size(self.dpem);
        t.set_wrap_width(self.wrap_width);
        t.set_align(self.align);
        t.set_direction(self.direction);
        if self.bounds.is_finite() {
            t.set_bounds(self.bounds);
        }
        t
    }

    fn text_from_str(s: &str) -> T {
        let mut t = T::default();
        t.set_string(s.to_string());
        t
    }

    fn split_into_paragraphs(&self, s: &str) -> Vec<Paragraph<T>> {
        unicode::split_paragraphs(s)
            .into_iter()
            .map(|range| Paragraph::new(self.make_text(&s[range.clone()]), range.start))
            .collect()
    }

    fn recompute_offsets(&mut self) {
        let mut offset = 0usize;
        for p in self.paragraphs.iter_mut() {
            p.text_start_offset = offset;
            offset += p.text_count();
        }
    }

    /// Map a global byte offset to `(paragraph_index, local_offset)`
    ///
    /// At a paragraph boundary (`global` equal to some paragraph's
    /// `text_start_offset`), `prefer_earlier` chooses whether the boundary
    /// resolves to the end of the preceding paragraph or the start of the
    /// following one — e.g. backward movement prefers the former, forward
    /// movement the latter.
    fn locate(&self, global: usize, prefer_earlier: bool) -> (usize, usize) {
        debug_assert!(!self.paragraphs.is_empty());
        let mut idx = self
            .paragraphs
            .partition_point(|p| p.text_start_offset <= global)
            .saturating_sub(1);
        if prefer_earlier && idx > 0 && self.paragraphs[idx].text_start_offset == global {
            idx -= 1;
        }
        let local = global - self.paragraphs[idx].text_start_offset;
        (idx, local)
    }

    fn notify_change(&mut self) {
        if let Some(f) = self.on_change.as_mut() {
            f(&self.paragraphs);
        }
    }

    fn set_active(&mut self, offset: usize, affinity: Affinity, extend: bool) {
        let pos = TextPosition { offset, affinity };
        self.selection.active = pos;
        if !extend {
            self.selection.anchor = pos;
        }
    }

    fn paragraph_ready(&self, idx: usize, status: Status) -> bool {
        self.paragraphs[idx].text.check_status(status).is_ok()
    }

    /// Replace the whole text, splitting it into fresh paragraphs and
    /// clearing the selection
    pub fn set_text(&mut self, text: T) {
        let s = text.as_str().to_string();
        self.paragraphs = self.split_into_paragraphs(&s);
        self.selection = Selection::default();
        self.preferred_x = None;
        self.notify_change();
    }

    /// Replace a codepoint range of the full text with new text
    ///
    /// Core edit operation (§4.9): detaches the start and end paragraphs,
    /// merges their surviving head/tail with the inserted text and re-splits
    /// on separators, rebuilding only the affected paragraphs (the rest of
    /// the document is untouched). Positions the caret at the leading edge
    /// of the last inserted grapheme, or its trailing edge if the insertion
    /// ends with a line feed (so `Enter` lands the caret at the start of the
    /// new paragraph).
    pub fn replace_range(&mut self, cp_range: std::ops::Range<usize>, replace_with: &str) {
        let full = self.full_text();
        let start = codepoint_to_utf8(&full, cp_range.start);
        let end = codepoint_to_utf8(&full, cp_range.end);
        self.replace_byte_range(start..end, replace_with);
    }

    fn replace_byte_range(&mut self, range: std::ops::Range<usize>, replace_with: &str) {
        let (start_idx, start_local) = self.locate(range.start, true);
        let (end_idx, end_local) = self.locate(range.end, false);

        let head = self.paragraphs[start_idx].text.as_str()[..start_local].to_string();
        let tail = self.paragraphs[end_idx].text.as_str()[end_local..].to_string();
        let merged = format!("{head}{replace_with}{tail}");

        let base_offset = self.paragraphs[start_idx].text_start_offset;
        let prev_version = self.paragraphs[start_idx..=end_idx]
            .iter()
            .map(Paragraph::version)
            .max()
            .unwrap_or(0);

        let mut new_paragraphs = self.split_into_paragraphs(&merged);
        for p in new_paragraphs.iter_mut() {
            p.text_start_offset += base_offset;
            p.version = prev_version.wrapping_add(1);
        }

        let insert_point = head.len();
        let ends_with_lf = replace_with.ends_with('\n');
        let (caret_local, affinity) = if replace_with.is_empty() {
            (insert_point, Affinity::None)
        } else if ends_with_lf {
            (insert_point + replace_with.len(), Affinity::Trailing)
        } else {
            let last = unicode::prev_grapheme_boundary(replace_with, replace_with.len());
            (insert_point + last, Affinity::Leading)
        };

        self.paragraphs.splice(start_idx..=end_idx, new_paragraphs);
        self.recompute_offsets();

        let pos = TextPosition {
            offset: base_offset + caret_local,
            affinity,
        };
        self.selection = Selection::at(pos);
        self.preferred_x = None;
        self.notify_change();
    }

    fn insert_str(&mut self, s: &str) {
        let range = if self.selection.is_empty() {
            let at = self.selection.active.offset;
            at..at
        } else {
            self.selection.range()
        };
        self.replace_byte_range(range, s);
    }

    /// Insert a single codepoint at the caret, replacing any selection
    pub fn insert_codepoint(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.insert_str(c.encode_utf8(&mut buf));
    }

    /// Paste a UTF-8 string at the caret, replacing any selection
    pub fn paste_utf8(&mut self, s: &str) {
        self.insert_str(s);
    }

    /// Paste a sequence of codepoints (e.g. from a UTF-32 clipboard source)
    pub fn paste_utf32(&mut self, chars: &[char]) {
        let s: String = chars.iter().collect();
        self.insert_str(&s);
    }

    /// Cut the current selection, returning its text (empty if no selection)
    pub fn cut(&mut self) -> String {
        if self.selection.is_empty() {
            return String::new();
        }
        let range = self.selection.range();
        let full = self.full_text();
        let cut = full[range.clone()].to_string();
        self.replace_byte_range(range, "");
        cut
    }

    /// Copy the current selection without modifying the text
    pub fn copy(&self) -> String {
        if self.selection.is_empty() {
            return String::new();
        }
        self.full_text()[self.selection.range()].to_string()
    }

    /// Handle a navigation/edit key action
    ///
    /// Paragraphs must be prepared ([`Text::prepare`]) for caret navigation
    /// (`Home`/`End`/`LineUp`/`LineDown`) to account for line wrapping;
    /// unprepared paragraphs fall back to whole-paragraph Home/End and plain
    /// grapheme stepping.
    pub fn handle_key(&mut self, action: EditAction) -> EditResult {
        use EditAction::*;
        match action {
            CaretLeft(extend) => {
                self.move_caret(extend, |ed| ed.move_by(false));
                EditResult::default()
            }
            CaretRight(extend) => {
                self.move_caret(extend, |ed| ed.move_by(true));
                EditResult::default()
            }
            WordLeft(extend) => {
                self.move_caret(extend, |ed| ed.word_by(false));
                EditResult::default()
            }
            WordRight(extend) => {
                self.move_caret(extend, |ed| ed.word_by(true));
                EditResult::default()
            }
            Home(extend) => {
                self.move_caret(extend, |ed| ed.line_bound(true));
                EditResult::default()
            }
            End(extend) => {
                self.move_caret(extend, |ed| ed.line_bound(false));
                EditResult::default()
            }
            LineUp(extend) => {
                self.move_vertical(extend, -1);
                EditResult::default()
            }
            LineDown(extend) => {
                self.move_vertical(extend, 1);
                EditResult::default()
            }
            Backspace => EditResult {
                text_changed: self.backspace(),
            },
            Delete => EditResult {
                text_changed: self.delete_forward(),
            },
            Enter => {
                self.insert_str("\n");
                EditResult { text_changed: true }
            }
        }
    }

    fn move_by(&self, forward: bool) -> TextPosition {
        let (idx, local) = self.locate(self.selection.active.offset, !forward);
        let s = self.paragraphs[idx].text.as_str();
        let local_pos = TextPosition {
            offset: local,
            affinity: self.selection.active.affinity,
        };

        let result = if self.paragraph_ready(idx, Status::LevelRuns) {
            let display = self.paragraphs[idx].text.unchecked_display();
            if forward {
                caret::next_position(display, s, local_pos, self.nav_mode)
            } else {
                caret::prev_position(display, s, local_pos, self.nav_mode)
            }
        } else {
            let off = if forward {
                unicode::next_grapheme_boundary(s, local)
            } else {
                unicode::prev_grapheme_boundary(s, local)
            };
            TextPosition::new(off)
        };

        if forward && result.offset == s.len() && idx + 1 < self.paragraphs.len() {
            let next = &self.paragraphs[idx + 1];
            return TextPosition {
                offset: next.text_start_offset,
                affinity: Affinity::Sol,
            };
        }
        if !forward && result.offset == 0 && idx > 0 {
            let prev = &self.paragraphs[idx - 1];
            return TextPosition {
                offset: prev.text_start_offset + prev.text_count(),
                affinity: Affinity::Eol,
            };
        }

        TextPosition {
            offset: self.paragraphs[idx].text_start_offset + result.offset,
            affinity: result.affinity,
        }
    }

    fn word_by(&self, forward: bool) -> TextPosition {
        let (idx, local) = self.locate(self.selection.active.offset, !forward);
        let s = self.paragraphs[idx].text.as_str();
        let local_pos = TextPosition {
            offset: local,
            affinity: self.selection.active.affinity,
        };
        let result = if forward {
            caret::next_word(s, local_pos)
        } else {
            caret::prev_word(s, local_pos)
        };

        if forward && result.offset >= s.len() && idx + 1 < self.paragraphs.len() {
            let next = &self.paragraphs[idx + 1];
            return TextPosition {
                offset: next.text_start_offset,
                affinity: Affinity::Sol,
            };
        }
        if !forward && result.offset == 0 && idx > 0 {
            let prev = &self.paragraphs[idx - 1];
            return TextPosition {
                offset: prev.text_start_offset + prev.text_count(),
                affinity: Affinity::Eol,
            };
        }

        TextPosition {
            offset: self.paragraphs[idx].text_start_offset + result.offset,
            affinity: result.affinity,
        }
    }

    fn line_bound(&self, start: bool) -> TextPosition {
        let (idx, local) = self.locate(self.selection.active.offset, false);
        let para = &self.paragraphs[idx];
        let s = para.text.as_str();
        if self.paragraph_ready(idx, Status::Wrapped) {
            let display = para.text.unchecked_display();
            if let Some((_, range)) = display.find_line(local) {
                let offset = if start { range.start } else { range.end };
                let affinity = if start { Affinity::Sol } else { Affinity::Eol };
                return TextPosition {
                    offset: para.text_start_offset + offset,
                    affinity,
                };
            }
        }
        if start {
            TextPosition {
                offset: para.text_start_offset,
                affinity: Affinity::Sol,
            }
        } else {
            TextPosition {
                offset: para.text_start_offset + s.len(),
                affinity: Affinity::Eol,
            }
        }
    }

    fn move_caret(&mut self, extend: bool, f: impl FnOnce(&Self) -> TextPosition) {
        let new_pos = f(self);
        self.set_active(new_pos.offset, new_pos.affinity, extend);
        self.preferred_x = None;
    }

    fn move_vertical(&mut self, extend: bool, delta: isize) {
        let (idx, local) = self.locate(self.selection.active.offset, delta < 0);
        if !self.paragraph_ready(idx, Status::Wrapped) {
            return;
        }
        let start_offset = self.paragraphs[idx].text_start_offset;
        let line = match self.paragraphs[idx].text.unchecked_display().find_line(local) {
            Some((line, _)) => line,
            None => return,
        };
        let x = match self.preferred_x {
            Some(x) => x,
            None => {
                let marker = self.paragraphs[idx]
                    .text
                    .unchecked_display()
                    .text_glyph_pos(local)
                    .as_slice()
                    .first()
                    .map(|m| m.pos.0)
                    .unwrap_or(0.0);
                self.preferred_x = Some(marker);
                marker
            }
        };

        let moved = caret::line_vertical(self.paragraphs[idx].text.unchecked_display(), line, delta, x);
        if let Some(new_pos) = moved {
            self.set_active(start_offset + new_pos.offset, new_pos.affinity, extend);
            return;
        }

        let target_idx = if delta < 0 {
            idx.checked_sub(1)
        } else if idx + 1 < self.paragraphs.len() {
            Some(idx + 1)
        } else {
            None
        };
        let Some(target_idx) = target_idx else {
            return;
        };
        if !self.paragraph_ready(target_idx, Status::Wrapped) {
            return;
        }
        let target_offset = self.paragraphs[target_idx].text_start_offset;
        let target_display = self.paragraphs[target_idx].text.unchecked_display();
        let target_line = if delta < 0 {
            target_display.num_lines().saturating_sub(1)
        } else {
            0
        };
        if let Some(offset) = target_display.line_index_nearest(target_line, x) {
            self.set_active(target_offset + offset, Affinity::None, extend);
        }
    }

    /// Delete the grapheme (or full emoji/flag/keycap sequence) preceding
    /// the caret, per the backspace state machine (§4.9)
    ///
    /// Returns `true` if text was modified.
    fn backspace(&mut self) -> bool {
        if !self.selection.is_empty() {
            self.replace_byte_range(self.selection.range(), "");
            return true;
        }
        let at = self.selection.active.offset;
        if at == 0 {
            return false;
        }
        let full = self.full_text();
        let start = backspace_delete_start(&full, at);
        self.replace_byte_range(start..at, "");
        true
    }

    /// Delete the grapheme following the caret
    fn delete_forward(&mut self) -> bool {
        if !self.selection.is_empty() {
            self.replace_byte_range(self.selection.range(), "");
            return true;
        }
        let at = self.selection.active.offset;
        let full = self.full_text();
        let end = unicode::next_grapheme_boundary(&full, at);
        if end == at {
            return false;
        }
        self.replace_byte_range(at..end, "");
        true
    }

    fn paragraph_at_y(&self, y: f32) -> usize {
        let mut idx = 0;
        for (i, p) in self.paragraphs.iter().enumerate() {
            if p.y <= y {
                idx = i;
            } else {
                break;
            }
        }
        idx
    }

    /// Handle a mouse click at screen position `(x, y)`, classifying it as a
    /// single/double/triple click based on elapsed time since the previous
    /// click (milliseconds, monotonic; e.g. from `Instant::elapsed`)
    pub fn click(&mut self, x: f32, y: f32, elapsed_ms: u64) -> ClickCount {
        let is_repeat = self
            .last_click
            .map(|(lx, ly, _)| (lx - x).abs() < 4.0 && (ly - y).abs() < 4.0)
            .unwrap_or(false)
            && elapsed_ms < u64::from(DOUBLE_CLICK_INTERVAL_MS);
        self.click_count = if is_repeat { self.click_count + 1 } else { 1 };
        self.last_click = Some((x, y, elapsed_ms));

        let count = match self.click_count {
            1 => ClickCount::Single,
            2 => ClickCount::Double,
            _ => ClickCount::Triple,
        };

        let idx = self.paragraph_at_y(y);
        if !self.paragraph_ready(idx, Status::Wrapped) {
            return count;
        }
        let para = &self.paragraphs[idx];
        let display = para.text.unchecked_display();
        let s = para.text.as_str();
        let base = para.text_start_offset;
        let hit = caret::hit_test(display, s, Vec2(x, y - para.y), MovementType::Caret);

        match count {
            ClickCount::Single => {
                self.selection = Selection::at(TextPosition {
                    offset: base + hit.offset,
                    affinity: hit.affinity,
                });
            }
            ClickCount::Double => {
                let start = unicode::prev_word_boundary(s, (hit.offset + 1).min(s.len()));
                let end = unicode::next_word_boundary(s, hit.offset);
                self.selection = Selection {
                    anchor: TextPosition::new(base + start),
                    active: TextPosition::new(base + end.max(start)),
                };
            }
            ClickCount::Triple => {
                self.selection = Selection {
                    anchor: TextPosition::new(base),
                    active: TextPosition::new(base + s.len()),
                };
            }
        }
        self.preferred_x = None;
        count
    }

    /// Handle a mouse drag to screen position `(x, y)`, extending the active
    /// selection endpoint
    pub fn drag(&mut self, x: f32, y: f32) {
        let idx = self.paragraph_at_y(y);
        if !self.paragraph_ready(idx, Status::Wrapped) {
            return;
        }
        let para = &self.paragraphs[idx];
        let display = para.text.unchecked_display();
        let s = para.text.as_str();
        let base = para.text_start_offset;
        let hit = caret::hit_test(display, s, Vec2(x, y - para.y), MovementType::Selection);
        self.selection.active = TextPosition {
            offset: base + hit.offset,
            affinity: hit.affinity,
        };
        self.preferred_x = None;
    }
}

/// Find the start of the sequence that a single backspace should delete,
/// implementing the backspace state machine (§4.9): a bare grapheme boundary
/// normally, but widened to swallow an entire flag (regional-indicator pair),
/// keycap sequence, or emoji ZWJ sequence as one unit.
fn backspace_delete_start(text: &str, at: usize) -> usize {
    let prev = crate::unicode::prev_grapheme_boundary(text, at);
    let grapheme = &text[prev..at];
    let mut chars = grapheme.chars().rev();

    // BEFORE_VS / BEFORE_EMOJI_MODIFIER: a modifier/VS attaches to the
    // preceding base as one grapheme already (UAX #29 handles this), so the
    // default `prev..at` span already covers it.
    if let Some(last) = chars.next() {
        if crate::unicode::is_regional_indicator(last) {
            // ODD-EVEN-RIS: flags are pairs of regional indicators; delete
            // both halves if the grapheme before this one is also an RI and
            // an even number of RIs precede it (keeping pairing parity).
            let before = &text[..prev];
            let mut count = 0usize;
            for c in before.chars().rev() {
                if crate::unicode::is_regional_indicator(c) {
                    count += 1;
                } else {
                    break;
                }
            }
            if count % 2 == 1 {
                let pair_start = crate::unicode::prev_grapheme_boundary(text, prev);
                return pair_start;
            }
        } else if last == crate::unicode::CANCEL_TAG {
            // IN_TAG_SEQUENCE: delete back through the whole tag sequence to
            // its base emoji.
            if let Some(base_start) = find_tag_sequence_start(text, prev) {
                return base_start;
            }
        }
    }

    prev
}

/// Given the byte offset of a CANCEL TAG grapheme, find the start of the
/// whole preceding tag sequence (base emoji + tag spec chars)
fn find_tag_sequence_start(text: &str, cancel_tag_start: usize) -> Option<usize> {
    let mut pos = cancel_tag_start;
    loop {
        let prev = crate::unicode::prev_grapheme_boundary(text, pos);
        if prev == pos {
            return Some(pos);
        }
        let g = &text[prev..pos];
        if g.chars().all(crate::unicode::is_tag_spec_char) {
            pos = prev;
            continue;
        }
        return Some(prev);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn insert_and_backspace() {
        let mut ed: Editor<String> = Editor::new(Text::new(String::from("ab")));
        ed.handle_key(EditAction::End(false));
        ed.insert_codepoint('c');
        assert_eq!(ed.full_text(), "abc");
        let changed = ed.handle_key(EditAction::Backspace);
        assert!(changed.text_changed);
        assert_eq!(ed.full_text(), "ab");
    }

    #[test]
    fn selection_replace() {
        let mut ed: Editor<String> = Editor::new(Text::new(String::from("hello")));
        ed.selection = Selection {
            anchor: TextPosition::new(0),
            active: TextPosition::new(5),
        };
        ed.insert_codepoint('x');
        assert_eq!(ed.full_text(), "x");
    }

    #[test]
    fn backspace_flag_pair() {
        // Regional indicators for "US": U+1F1FA U+1F1F8
        let s = "\u{1F1FA}\u{1F1F8}";
        let mut ed: Editor<String> = Editor::new(Text::new(String::from(s)));
        ed.selection = Selection::at(TextPosition::new(s.len()));
        ed.handle_key(EditAction::Backspace);
        assert_eq!(ed.full_text(), "");
    }

    #[test]
    fn version_bumps_on_edit() {
        let mut ed: Editor<String> = Editor::new(Text::new(String::new()));
        let v0 = ed.paragraphs()[0].version();
        ed.insert_codepoint('a');
        assert_eq!(ed.paragraphs()[0].version(), v0 + 1);
    }

    #[test]
    fn click_classification() {
        let mut ed: Editor<String> = Editor::new(Text::new(String::from("hello world")));
        assert_eq!(ed.click(0.0, 0.0, 1000), ClickCount::Single);
        assert_eq!(ed.click(0.0, 0.0, 50), ClickCount::Double);
        assert_eq!(ed.click(0.0, 0.0, 50), ClickCount::Triple);
    }

    #[test]
    fn enter_splits_into_two_paragraphs() {
        let mut ed: Editor<String> = Editor::new(Text::new(String::from("ab")));
        ed.selection = Selection::at(TextPosition::new(1));
        ed.handle_key(EditAction::Enter);
        assert_eq!(ed.paragraphs().len(), 2);
        assert_eq!(ed.paragraphs()[0].text().as_str(), "a\n");
        assert_eq!(ed.paragraphs()[1].text().as_str(), "b");
        assert_eq!(ed.paragraphs()[1].text_start_offset(), 2);
        assert_eq!(ed.selection().active.offset, 2);
    }

    #[test]
    fn enter_at_end_creates_trailing_empty_paragraph() {
        let mut ed: Editor<String> = Editor::new(Text::new(String::from("ab")));
        ed.handle_key(EditAction::End(false));
        ed.handle_key(EditAction::Enter);
        assert_eq!(ed.paragraphs().len(), 2);
        assert_eq!(ed.paragraphs()[1].text().as_str(), "");
        assert_eq!(ed.full_text(), "ab\n");
    }

    #[test]
    fn backspace_merges_paragraphs() {
        let mut ed: Editor<String> = Editor::new(Text::new(String::from("a\nb")));
        assert_eq!(ed.paragraphs().len(), 2);
        ed.selection = Selection::at(TextPosition::new(2)); // start of "b"
        ed.handle_key(EditAction::Backspace);
        assert_eq!(ed.full_text(), "ab");
        assert_eq!(ed.paragraphs().len(), 1);
    }

    #[test]
    fn paragraph_offsets_stay_contiguous() {
        let ed: Editor<String> = Editor::new(Text::new(String::from("one\ntwo\nthree")));
        let mut expected = 0;
        for p in ed.paragraphs() {
            assert_eq!(p.text_start_offset(), expected);
            expected += p.text_count();
        }
        assert_eq!(expected, ed.len());
    }
}
