// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Bidirectional (UAX #9) level resolution
//!
//! Thin wrapper over `unicode_bidi::BidiInfo`, exposing the maximal
//! constant-level runs the itemizer ([`crate::display::text_runs`]) breaks
//! shaping runs on.

use unicode_bidi::{BidiClass, BidiInfo, Level};

/// A maximal range of text at one constant bidi embedding level, in logical
/// (byte-offset) order
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BidiRun {
    /// Byte range of the run within the source text
    pub range: std::ops::Range<usize>,
    /// The bidi embedding level of this run
    pub level: Level,
}

/// Resolves bidi embedding levels and original classes for a text
///
/// Constructed once per text-preparation pass. `levels()`/`classes()` give
/// `unicode_bidi`'s per-byte resolution directly; `runs()` collapses that
/// into the maximal constant-level ranges the itemizer breaks level runs on.
pub(crate) struct BidiResolver {
    levels: Vec<Level>,
    classes: Vec<BidiClass>,
}

impl BidiResolver {
    pub(crate) fn new(text: &str, default_para_level: Option<Level>) -> Self {
        let info = BidiInfo::new(text, default_para_level);
        BidiResolver {
            levels: info.levels,
            classes: info.original_classes,
        }
    }

    /// Per-byte resolved embedding level (one entry per byte of the source text)
    pub(crate) fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Per-byte original bidi class, before resolution
    pub(crate) fn classes(&self) -> &[BidiClass] {
        &self.classes
    }

    /// Maximal constant-level ranges, in logical order
    ///
    /// Used by the itemizer to find the positions at which a change in bidi
    /// level forces a level-run break.
    pub(crate) fn runs(&self) -> impl Iterator<Item = BidiRun> + '_ {
        let levels = &self.levels;
        let mut start = 0;
        std::iter::from_fn(move || {
            if start >= levels.len() {
                return None;
            }
            let level = levels[start];
            let mut end = start + 1;
            while end < levels.len() && levels[end] == level {
                end += 1;
            }
            let run = BidiRun {
                range: start..end,
                level,
            };
            start = end;
            Some(run)
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn runs_cover_text_contiguously() {
        let resolver = BidiResolver::new("hello world", None);
        let mut expected_start = 0;
        for run in resolver.runs() {
            assert_eq!(run.range.start, expected_start);
            expected_start = run.range.end;
        }
        assert_eq!(expected_start, "hello world".len());
    }

    #[test]
    fn runs_split_on_direction_change() {
        // "a" (LTR) + Arabic (RTL) + "b" (LTR): at least two runs.
        let text = "a\u{0627}b";
        let resolver = BidiResolver::new(text, None);
        let runs: Vec<_> = resolver.runs().collect();
        assert!(runs.len() >= 2);
    }
}
