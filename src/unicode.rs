// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Unicode codepoint classification and segmentation
//!
//! This module collects the codepoint-property queries and boundary
//! segmenters shared by the itemizer, line breaker, caret model and editor,
//! so each of those agree on one notion of "script", "emoji" and
//! "grapheme"/"word" boundary.

use icu_properties::maps::CodePointMapDataBorrowed;
use icu_properties::props::Script;
use icu_properties::sets::CodePointSetDataBorrowed;
use unicode_segmentation::UnicodeSegmentation;

const SCRIPT_DATA: CodePointMapDataBorrowed<'static, Script> = icu_properties::maps::script();
const EMOJI_DATA: CodePointSetDataBorrowed<'static> = icu_properties::sets::emoji();
const EMOJI_MODIFIER_DATA: CodePointSetDataBorrowed<'static> =
    icu_properties::sets::emoji_modifier();
const EMOJI_MODIFIER_BASE_DATA: CodePointSetDataBorrowed<'static> =
    icu_properties::sets::emoji_modifier_base();
const REGIONAL_INDICATOR_DATA: CodePointSetDataBorrowed<'static> =
    icu_properties::sets::regional_indicator();
const VARIATION_SELECTOR_DATA: CodePointSetDataBorrowed<'static> =
    icu_properties::sets::variation_selector();

/// Zero-width joiner
pub const ZWJ: char = '\u{200D}';
/// Combining enclosing keycap
pub const COMBINING_ENCLOSING_KEYCAP: char = '\u{20E3}';
/// Cancel tag, terminating an emoji tag sequence
pub const CANCEL_TAG: char = '\u{E007F}';

/// The script of a codepoint (ISO-15924, via [`Script`])
pub fn script(c: char) -> Script {
    SCRIPT_DATA.get(c)
}

/// True if `c` is a paragraph separator
///
/// Paragraph boundaries sit immediately after one of these codepoints
/// (CRLF is handled as a pair: the LF half is also a separator).
pub fn is_paragraph_separator(c: char) -> bool {
    matches!(c, '\u{000A}' | '\u{000D}' | '\u{0085}' | '\u{2028}' | '\u{2029}')
}

/// True if `c` is whitespace
pub fn is_whitespace(c: char) -> bool {
    c.is_whitespace()
}

/// True if `c` is a control character
pub fn is_control(c: char) -> bool {
    c.is_control()
}

/// True if `c` has the Emoji property
pub fn is_emoji(c: char) -> bool {
    EMOJI_DATA.contains(c)
}

/// True if `c` is an emoji skin-tone modifier
pub fn is_emoji_modifier(c: char) -> bool {
    EMOJI_MODIFIER_DATA.contains(c)
}

/// True if `c` is a base character an emoji modifier may apply to
pub fn is_emoji_modifier_base(c: char) -> bool {
    EMOJI_MODIFIER_BASE_DATA.contains(c)
}

/// True if `c` is a regional indicator symbol (flag letter)
pub fn is_regional_indicator(c: char) -> bool {
    REGIONAL_INDICATOR_DATA.contains(c)
}

/// True if `c` is a variation selector
pub fn is_variation_selector(c: char) -> bool {
    VARIATION_SELECTOR_DATA.contains(c)
}

/// True if `c` is a tag specification character (U+E0020..=U+E007E)
pub fn is_tag_spec_char(c: char) -> bool {
    ('\u{E0020}'..='\u{E007E}').contains(&c)
}

/// True if `c` is U+20E3 COMBINING ENCLOSING KEYCAP
pub fn is_keycap_base(c: char) -> bool {
    c == COMBINING_ENCLOSING_KEYCAP
}

/// True if `c` is the zero-width joiner
pub fn is_zwj(c: char) -> bool {
    c == ZWJ
}

/// True if `script` is one which adopts the surrounding run's script
/// (Common and Inherited, per UAX #24 script-extension resolution)
pub fn is_transparent_script(script: Script) -> bool {
    matches!(script, Script::Common | Script::Inherited)
}

/// Iterate over grapheme-cluster boundaries in `text`, in logical order
///
/// Yields each boundary's byte offset, including `0` and `text.len()`.
pub fn grapheme_boundaries(text: &str) -> impl Iterator<Item = usize> + '_ {
    text.grapheme_indices(true)
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
}

/// Find the nearest grapheme-cluster boundary at or before byte offset `at`
pub fn floor_grapheme_boundary(text: &str, at: usize) -> usize {
    grapheme_boundaries(text)
        .take_while(|&b| b <= at)
        .last()
        .unwrap_or(0)
}

/// Find the next grapheme-cluster boundary strictly after byte offset `at`
///
/// Returns `text.len()` if `at` is already the last boundary.
pub fn next_grapheme_boundary(text: &str, at: usize) -> usize {
    grapheme_boundaries(text)
        .find(|&b| b > at)
        .unwrap_or(text.len())
}

/// Find the previous grapheme-cluster boundary strictly before byte offset `at`
///
/// Returns `0` if `at` is already the first boundary.
pub fn prev_grapheme_boundary(text: &str, at: usize) -> usize {
    grapheme_boundaries(text)
        .take_while(|&b| b < at)
        .last()
        .unwrap_or(0)
}

/// Find the next word-break boundary after `at` whose following codepoint is
/// not whitespace
///
/// Used for ctrl+right-style "jump a word" navigation (§4.7 Word navigation).
pub fn next_word_boundary(text: &str, at: usize) -> usize {
    for (i, word) in text.split_word_bound_indices() {
        let end = i + word.len();
        if end > at && !word.trim_start().is_empty() {
            return end;
        }
    }
    text.len()
}

/// Find the previous word-break boundary before `at` whose following
/// codepoint is not whitespace
pub fn prev_word_boundary(text: &str, at: usize) -> usize {
    let mut best = 0;
    for (i, word) in text.split_word_bound_indices() {
        if i >= at {
            break;
        }
        if !word.trim_start().is_empty() {
            best = i;
        }
    }
    best
}

/// Split `text` into paragraph byte ranges
///
/// A paragraph boundary sits immediately after each [`is_paragraph_separator`]
/// codepoint (CRLF counts as one boundary, not two); each paragraph's range
/// includes its own trailing separator. Always yields at least one range, and
/// the final range (covering whatever follows the last separator) is included
/// even when empty, so `"a\n"` splits into `["a\n", ""]` — a trailing
/// separator always starts a new, currently-empty, paragraph.
pub fn split_paragraphs(text: &str) -> Vec<std::ops::Range<usize>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if is_paragraph_separator(c) {
            let mut end = i + c.len_utf8();
            if c == '\r' {
                if let Some(&(j, '\n')) = chars.peek() {
                    end = j + 1;
                    chars.next();
                }
            }
            out.push(start..end);
            start = end;
        }
    }
    out.push(start..text.len());
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scripts() {
        assert_eq!(script('a'), Script::Latin);
        assert_eq!(script('א'), Script::Hebrew);
        assert!(is_transparent_script(script(' ')));
        assert!(is_transparent_script(script('1')));
    }

    #[test]
    fn emoji_props() {
        assert!(is_emoji('😀'));
        assert!(!is_emoji('a'));
        assert!(is_regional_indicator('\u{1F1EB}')); // 🇫
        assert!(is_zwj(ZWJ));
    }

    #[test]
    fn grapheme_nav() {
        let s = "a👨‍👩‍👧b";
        assert_eq!(floor_grapheme_boundary(s, s.len()), s.len());
        let first = next_grapheme_boundary(s, 0);
        assert!(first > 0 && first < s.len());
        assert_eq!(prev_grapheme_boundary(s, first), 0);
    }

    #[test]
    fn word_nav() {
        let s = "one two three";
        assert_eq!(next_word_boundary(s, 0), 3);
        assert_eq!(next_word_boundary(s, 3), 7);
        assert_eq!(prev_word_boundary(s, 7), 4);
    }

    #[test]
    fn paragraph_split_basic() {
        let ranges = split_paragraphs("a\nb");
        let texts: Vec<&str> = ranges.iter().map(|r| &"a\nb"[r.clone()]).collect();
        assert_eq!(texts, vec!["a\n", "b"]);
    }

    #[test]
    fn paragraph_split_trailing_separator() {
        let ranges = split_paragraphs("a\n");
        let texts: Vec<&str> = ranges.iter().map(|r| &"a\n"[r.clone()]).collect();
        assert_eq!(texts, vec!["a\n", ""]);
    }

    #[test]
    fn paragraph_split_crlf_is_one_boundary() {
        let s = "a\r\nb";
        let ranges = split_paragraphs(s);
        let texts: Vec<&str> = ranges.iter().map(|r| &s[r.clone()]).collect();
        assert_eq!(texts, vec!["a\r\n", "b"]);
    }

    #[test]
    fn paragraph_split_empty_text() {
        let ranges = split_paragraphs("");
        assert_eq!(ranges, vec![0..0]);
    }
}
