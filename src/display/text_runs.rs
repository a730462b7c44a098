// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Text preparation: line breaking and BIDI

#![allow(clippy::unnecessary_unwrap)]

use super::TextDisplay;
use crate::bidi::BidiResolver;
use crate::conv::{to_u32, to_usize};
use crate::fonts::{library, FontSelector, NoFontMatch};
use crate::format::FormattableText;
use crate::unicode;
use crate::{shaper, Direction, Range};
use icu_properties::props::Script;
use unicode_bidi::{BidiClass, Level, LTR_LEVEL, RTL_LEVEL};
use xi_unicode::LineBreakIterator;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum RunSpecial {
    None,
    /// Run ends with a hard break
    HardBreak,
    /// Run does not end with a break
    NoBreak,
    /// Run is a horizontal tab (run is a single char only)
    HTab,
}

impl TextDisplay {
    /// Update font size
    ///
    /// This updates the result of [`TextDisplay::prepare_runs`] due to change
    /// in font size.
    ///
    /// Parameters: see [`crate::Environment`] documentation.
    pub(crate) fn resize_runs<F: FormattableText + ?Sized>(&mut self, text: &F, dpem: f32) {
        let mut font_tokens = text.font_tokens(dpem, FontSelector::default());
        let mut next_fmt = font_tokens.next();

        let mut input = shaper::Input {
            text: text.as_str(),
            dpem,
            level: LTR_LEVEL,
            script: Script::Common,
        };

        for run in &mut self.runs {
            while let Some(fmt) = next_fmt.as_ref() {
                if fmt.start > run.range.start {
                    break;
                }
                input.dpem = fmt.dpem;
                next_fmt = font_tokens.next();
            }

            input.level = run.level;
            input.script = run.script;
            let mut breaks = Default::default();
            std::mem::swap(&mut breaks, &mut run.breaks);
            if run.level.is_rtl() {
                breaks.reverse();
            }
            *run = shaper::shape(input, run.range, run.face_id, breaks, run.special);
        }
    }

    /// Prepare text runs
    ///
    /// This is the first step of preparation: breaking text into runs according
    /// to font properties, bidi-levels and line-wrap points.
    ///
    /// Parameters: see [`crate::Environment`] documentation.
    pub fn prepare_runs<F: FormattableText + ?Sized>(
        &mut self,
        text: &F,
        direction: Direction,
        mut font: FontSelector,
        mut dpem: f32,
    ) -> Result<(), NoFontMatch> {
        // This method constructs a list of "hard lines" (the initial line and any
        // caused by a hard break), each composed of a list of "level runs" (the
        // result of splitting and reversing according to Unicode TR9 aka
        // Bidirectional algorithm), plus a list of "soft break" positions
        // (where wrapping may introduce new lines depending on available space).

        self.runs.clear();

        let mut font_tokens = text.font_tokens(dpem, font);
        let mut next_fmt = font_tokens.next();
        if let Some(fmt) = next_fmt.as_ref() {
            if fmt.start == 0 {
                font = fmt.font;
                dpem = fmt.dpem;
                next_fmt = font_tokens.next();
            }
        }

        let fonts = library();
        let text = text.as_str();

        // Bidi reordering is always applied (per Environment::bidi's
        // recommendation); `direction` only controls the fallback / forced
        // paragraph embedding level used where the text has no strongly
        // directional characters.
        let (default_para_level, fallback_rtl) = match direction {
            Direction::Auto => (None, false),
            Direction::AutoRtl => (None, true),
            Direction::Ltr => (Some(LTR_LEVEL), false),
            Direction::Rtl => (Some(RTL_LEVEL), true),
        };

        let resolver = BidiResolver::new(text, default_para_level);
        let levels = resolver.levels();
        assert_eq!(text.len(), levels.len());
        let fallback_level = if fallback_rtl { RTL_LEVEL } else { LTR_LEVEL };
        let level: Level = levels.first().cloned().unwrap_or(fallback_level);
        let classes = resolver.classes();
        // Positions at which the itemizer must break for a bidi-level
        // change, derived from the resolver's runs rather than re-deriving
        // level transitions inline.
        let bidi_run_starts: std::collections::HashSet<usize> =
            resolver.runs().map(|run| run.range.start).collect();

        let mut font_id = fonts.select_font(&font).map_err(|_| NoFontMatch)?;
        let mut face_id = fonts.first_face_for(font_id).map_err(|_| NoFontMatch)?;
        let mut input = shaper::Input {
            text,
            dpem,
            level,
            script: Script::Common,
        };

        let mut start = 0;
        let mut breaks = Default::default();

        // Iterates over `(pos, hard)` tuples:
        let mut breaks_iter = LineBreakIterator::new(text);
        let mut next_break = breaks_iter.next().unwrap_or((0, false));

        let mut last_is_control = false;
        let mut last_is_htab = false;
        let mut non_control_end = 0;

        for (pos, c) in text.char_indices() {
            // Handling for control chars
            if !last_is_control {
                non_control_end = pos;
            }
            let is_control = c.is_control();
            let is_htab = c == '\t';
            let control_break = is_htab || (last_is_control && !is_control);

            // Is wrapping allowed at this position?
            let is_break = next_break.0 == pos;
            // Forcibly end the line?
            let hard_break = is_break && next_break.1;
            if is_break {
                next_break = breaks_iter.next().unwrap_or((0, false));
            }

            // Force end of current run?
            let bidi_break = pos > 0 && bidi_run_starts.contains(&pos);

            let mut fmt_break = false;
            if let Some(fmt) = next_fmt.as_ref() {
                if to_usize(fmt.start) == pos {
                    fmt_break = true;
                    font = fmt.font;
                    font_id = fonts.select_font(&font).map_err(|_| NoFontMatch)?;
                    dpem = fmt.dpem;
                    next_fmt = font_tokens.next();
                }
            }

            // Common/Inherited scripts (spaces, digits, punctuation, combining
            // marks) adopt the surrounding run's script rather than forcing a
            // break (UAX #24 script-extension resolution).
            let char_script = unicode::script(c);
            let script_break = pos > 0
                && !unicode::is_transparent_script(char_script)
                && char_script != input.script;

            let opt_last_face = if matches!(
                classes[pos],
                BidiClass::L | BidiClass::R | BidiClass::AL | BidiClass::EN | BidiClass::AN
            ) {
                None
            } else {
                Some(face_id)
            };
            let new_face_id = fonts
                .face_for_char_or_first(font_id, opt_last_face, c)
                .map_err(|_| NoFontMatch)?;
            let font_break = pos > 0 && new_face_id != face_id;

            if hard_break || control_break || bidi_break || fmt_break || font_break || script_break
            {
                // TODO: sometimes this results in empty runs immediately
                // following another run. Ideally we would either merge these
                // into the previous run or not simply break in this case.
                // Note: the prior run may end with NoBreak while the latter
                // (and the merge result) do not.
                let range = (start..non_control_end).into();
                let special = match () {
                    _ if hard_break => RunSpecial::HardBreak,
                    _ if last_is_htab => RunSpecial::HTab,
                    _ if last_is_control || is_break => RunSpecial::None,
                    _ => RunSpecial::NoBreak,
                };
                self.runs
                    .push(shaper::shape(input, range, face_id, breaks, special));

                start = pos;
                non_control_end = pos;
                input.level = levels[pos];
                breaks = Default::default();
            } else if is_break && !is_control {
                // We do break runs when hitting control chars, but only when
                // encountering the next non-control character.
                breaks.push(shaper::GlyphBreak::new(to_u32(pos)));
            }

            if !unicode::is_transparent_script(char_script)
                && (pos == 0 || input.script == Script::Common || script_break)
            {
                input.script = char_script;
            }

            last_is_control = is_control;
            last_is_htab = is_htab;
            face_id = new_face_id;
            input.dpem = dpem;
        }

        // The LineBreakIterator finishes with a break (unless the string is empty).
        // This is a hard break when the string finishes with an explicit line-break.
        debug_assert_eq!(next_break.0, text.len());
        let hard_break = next_break.1;

        // Conclude: add last run. This may be empty, but we want it anyway.
        if !last_is_control {
            non_control_end = text.len();
        }
        let range = (start..non_control_end).into();
        let special = match () {
            _ if hard_break => RunSpecial::HardBreak,
            _ if last_is_htab => RunSpecial::HTab,
            _ => RunSpecial::None,
        };
        self.runs
            .push(shaper::shape(input, range, face_id, breaks, special));

        // Following a hard break we have an implied empty line.
        if hard_break {
            let range = Range::from(text.len()..text.len());
            input.level = default_para_level.unwrap_or(fallback_level);
            breaks = Default::default();
            self.runs.push(shaper::shape(
                input,
                range,
                face_id,
                breaks,
                RunSpecial::None,
            ));
        }

        /*
        println!("text: {}", text);
        for run in &self.runs {
            let slice = &text[run.range];
            print!(
                "\t{:?}, text[{}..{}]: '{}', ",
                run.level, run.range.start, run.range.end, slice
            );
            match run.special {
                RunSpecial::None => (),
                RunSpecial::HardBreak => println!("HardBreak, "),
                RunSpecial::NoBreak => print!("NoBreak, "),
                RunSpecial::HTab => print!("HTab, "),
            }
            print!("breaks=[");
            let mut iter = run.breaks.iter();
            if let Some(b) = iter.next() {
                print!("{}", b.index);
            }
            for b in iter {
                print!(", {}", b.index);
            }
            println!("]");
        }
        */
        Ok(())
    }
}
