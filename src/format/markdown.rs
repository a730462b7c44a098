// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Markdown parsing

use super::{EditableText, EffectFlags, FontToken, FormattableText};
use crate::conv::to_u32;
use crate::fonts::{FamilySelector, FontSelector, FontStyle, FontWeight};
use pulldown_cmark::{Event, Tag};
use thiserror::Error;

/// Markdown parsing errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not supported by Markdown parser: {0}")]
    NotSupported(&'static str),
}

/// Text formatted as Markdown
///
/// Construct via [`Markdown::new`]. Implements [`FormattableText`] (deriving
/// font selection and underline/strikethrough effects from the parsed
/// structure) and [`EditableText`] (edits simply re-parse the whole text,
/// which is cheap relative to the cost of re-shaping it anyway).
#[derive(Clone, Debug, PartialEq)]
pub struct Markdown {
    text: String,
    fmt: Vec<Fmt>,
    effects: Vec<(u32, EffectFlags)>,
}

impl Markdown {
    /// Parse a Markdown document
    #[inline]
    pub fn new(input: &str) -> Result<Self, Error> {
        parse(input)
    }
}

impl Default for Markdown {
    /// The empty document
    fn default() -> Self {
        Markdown {
            text: String::new(),
            fmt: Vec::new(),
            effects: Vec::new(),
        }
    }
}

impl FormattableText for Markdown {
    type Effect = EffectFlags;

    #[inline]
    fn as_str(&self) -> &str {
        &self.text
    }

    fn font_tokens(&self, dpem: f32, font: FontSelector) -> impl Iterator<Item = FontToken> {
        self.fmt.iter().map(move |fmt| FontToken {
            start: fmt.start,
            dpem: dpem * fmt.rel_size,
            font: fmt.resolve(&font),
        })
    }

    fn effect_tokens(&self) -> &[(u32, EffectFlags)] {
        &self.effects
    }
}

impl EditableText for Markdown {
    fn set_string(&mut self, string: String) {
        *self = parse(&string).unwrap_or(Markdown {
            text: string,
            fmt: Vec::new(),
            effects: Vec::new(),
        });
    }

    fn swap_string(&mut self, string: &mut String) {
        let mut text = std::mem::take(&mut self.text);
        std::mem::swap(&mut text, string);
        self.set_string(text);
    }

    fn insert_char(&mut self, index: usize, c: char) {
        let mut buf = [0u8; 4];
        let s = c.encode_utf8(&mut buf);
        self.replace_range(index..index, s);
    }

    fn replace_range(&mut self, range: std::ops::Range<usize>, replace_with: &str) {
        let mut text = std::mem::take(&mut self.text);
        text.replace_range(range, replace_with);
        self.set_string(text);
    }
}

fn parse(input: &str) -> Result<Markdown, Error> {
    let mut text = String::with_capacity(input.len());
    let mut fmt: Vec<Fmt> = Vec::new();
    let mut set_last = |item: &StackItem| {
        let f = Fmt::new(item);
        if let Some(last) = fmt.last_mut() {
            if last.start >= item.start {
                *last = f;
                return;
            }
        }
        fmt.push(f);
    };

    let mut state = State::None;
    let mut stack = Vec::with_capacity(16);
    let mut item = StackItem {
        rel_size: 1.0,
        ..Default::default()
    };

    let options = pulldown_cmark::Options::ENABLE_STRIKETHROUGH;
    let mut parser = pulldown_cmark::Parser::new_ext(input, options);
    while let Some(ev) = parser.next() {
        match ev {
            Event::Start(tag) => {
                item.start = to_u32(text.len());
                if let Some(clone) = item.start_tag(&mut text, &mut state, tag)? {
                    stack.push(item);
                    item = clone;
                    set_last(&item);
                }
            }
            Event::End(tag) => {
                if item.end_tag(&mut state, tag) {
                    item = stack.pop().unwrap();
                    item.start = to_u32(text.len());
                    set_last(&item);
                }
            }
            Event::Text(part) => {
                state.part(&mut text);
                text.push_str(&part);
            }
            Event::Code(part) => {
                state.part(&mut text);
                item.start = to_u32(text.len());

                let mut item2 = item.clone();
                item2.family = Some(FamilySelector::MONOSPACE);
                set_last(&item2);

                text.push_str(&part);

                item.start = to_u32(text.len());
                set_last(&item);
            }
            Event::Html(_) => return Err(Error::NotSupported("embedded HTML")),
            Event::FootnoteReference(_) => return Err(Error::NotSupported("footnote")),
            Event::SoftBreak => state.soft_break(&mut text),
            Event::HardBreak => state.hard_break(&mut text),
            Event::Rule => return Err(Error::NotSupported("horizontal rule")),
            Event::TaskListMarker(_) => return Err(Error::NotSupported("task list")),
        }
    }

    let mut effects = Vec::new();
    let mut flags = EffectFlags::default();
    for token in &fmt {
        if token.flags != flags {
            effects.push((token.start, token.flags));
            flags = token.flags;
        }
    }

    Ok(Markdown { text, fmt, effects })
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum State {
    None,
    BlockStart,
    BlockEnd,
    ListItem,
    Part,
}

impl State {
    fn start_block(&mut self, text: &mut String) {
        match *self {
            State::None | State::BlockStart => (),
            State::BlockEnd | State::ListItem | State::Part => text.push_str("\n\n"),
        }
        *self = State::BlockStart;
    }
    fn end_block(&mut self) {
        *self = State::BlockEnd;
    }
    fn part(&mut self, text: &mut String) {
        match *self {
            State::None | State::BlockStart | State::Part | State::ListItem => (),
            State::BlockEnd => text.push_str("\n\n"),
        }
        *self = State::Part;
    }
    fn list_item(&mut self, text: &mut String) {
        match *self {
            State::None | State::BlockStart | State::BlockEnd => {
                debug_assert_eq!(*self, State::BlockStart);
            }
            State::ListItem | State::Part => text.push_str("\n"),
        }
        *self = State::ListItem;
    }
    fn soft_break(&mut self, text: &mut String) {
        text.push(' ');
    }
    fn hard_break(&mut self, text: &mut String) {
        text.push('\n');
    }
}

/// A font/effect override active from `start` onwards (until superseded)
#[derive(Clone, Debug, PartialEq)]
struct Fmt {
    start: u32,
    family: Option<FamilySelector>,
    weight: Option<FontWeight>,
    style: Option<FontStyle>,
    rel_size: f32,
    flags: EffectFlags,
}

impl Fmt {
    fn new(item: &StackItem) -> Self {
        Fmt {
            start: item.start,
            family: item.family.clone(),
            weight: item.weight,
            style: item.style,
            rel_size: item.rel_size,
            flags: item.flags,
        }
    }

    /// Apply this override on top of a base selector
    fn resolve(&self, base: &FontSelector) -> FontSelector {
        let mut sel = base.clone();
        if let Some(family) = self.family.clone() {
            sel.family = family;
        }
        if let Some(weight) = self.weight {
            sel.weight = weight;
        }
        if let Some(style) = self.style {
            sel.style = style;
        }
        sel
    }
}

#[derive(Clone, Debug, Default)]
struct StackItem {
    list: Option<u64>,
    start: u32,
    family: Option<FamilySelector>,
    weight: Option<FontWeight>,
    style: Option<FontStyle>,
    rel_size: f32,
    flags: EffectFlags,
}

impl StackItem {
    // process a tag; may modify current item and may return new item
    fn start_tag(
        &mut self,
        text: &mut String,
        state: &mut State,
        tag: Tag,
    ) -> Result<Option<Self>, Error> {
        fn with_clone<F: Fn(&mut StackItem)>(s: &mut StackItem, c: F) -> Option<StackItem> {
            let mut item = s.clone();
            c(&mut item);
            Some(item)
        }

        Ok(match tag {
            Tag::Paragraph => {
                state.start_block(text);
                None
            }
            Tag::Heading(level) => {
                state.start_block(text);
                self.start = to_u32(text.len());
                with_clone(self, |item| {
                    item.rel_size = match level {
                        1 => 2.0,
                        2 => 1.75,
                        3 => 1.5,
                        4 => 1.35,
                        5 => 1.2,
                        6 => 1.1,
                        _ => panic!("Unexpected: heading level not in 1..=6"),
                    }
                })
            }
            Tag::CodeBlock(_) => {
                state.start_block(text);
                self.start = to_u32(text.len());
                with_clone(self, |item| item.family = Some(FamilySelector::MONOSPACE))
            }
            Tag::List(start) => {
                state.start_block(text);
                self.list = start;
                None
            }
            Tag::Item => {
                state.list_item(text);
                // NOTE: we use \t for indent, which indents only the first
                // line. Without better flow control we cannot fix this.
                match &mut self.list {
                    Some(x) => {
                        text.push_str(&format!("{}\t", x));
                        *x += 1;
                    }
                    None => text.push_str("\u{2022}\t"),
                }
                None
            }
            Tag::Emphasis => with_clone(self, |item| item.style = Some(FontStyle::Italic)),
            Tag::Strong => with_clone(self, |item| item.weight = Some(FontWeight::BOLD)),
            Tag::Strikethrough => with_clone(self, |item| {
                item.flags.set(EffectFlags::STRIKETHROUGH, true)
            }),
            Tag::BlockQuote => return Err(Error::NotSupported("block quote")),
            Tag::FootnoteDefinition(_) => return Err(Error::NotSupported("footnote")),
            Tag::Table(_) | Tag::TableHead | Tag::TableRow | Tag::TableCell => {
                return Err(Error::NotSupported("table"))
            }
            Tag::Link(..) => return Err(Error::NotSupported("link")),
            Tag::Image(..) => return Err(Error::NotSupported("image")),
        })
    }

    // returns true if stack must be popped
    fn end_tag(&self, state: &mut State, tag: Tag) -> bool {
        match tag {
            Tag::Paragraph | Tag::List(_) => {
                state.end_block();
                false
            }
            Tag::Heading(_) | Tag::CodeBlock(_) => {
                state.end_block();
                true
            }
            Tag::Item => false,
            Tag::Emphasis | Tag::Strong | Tag::Strikethrough => true,
            tag => unimplemented!("{:?}", tag),
        }
    }
}
