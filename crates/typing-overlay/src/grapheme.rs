//! Grapheme segmentation for typewriter reveal.
//!
//! Splits text into the pieces a viewer perceives as single characters, so
//! that one reveal step never shows half of a flag, a skin-toned emoji or a
//! joined emoji sequence. The rules are table driven:
//!
//! - a supplementary-plane code point followed by a Fitzpatrick modifier, or
//!   two consecutive regional indicators, form one base;
//! - after the base, at most one code point from [`CLUSTER_EXTENDERS`], one
//!   variation selector and one combining mark for symbols are absorbed, in
//!   that order;
//! - a zero-width joiner glues the next base onto the current grapheme.
//!
//! Concatenating the produced pieces always yields the input unchanged.

use std::iter::FusedIterator;

const REGIONAL_INDICATOR: (u32, u32) = (0x1F1E6, 0x1F1FF);
const FITZPATRICK_MODIFIER: (u32, u32) = (0x1F3FB, 0x1F3FF);
const VARIATION_SELECTOR: (u32, u32) = (0xFE00, 0xFE0F);
const COMBINING_MARK_FOR_SYMBOLS: (u32, u32) = (0x20D0, 0x20FF);
const ZERO_WIDTH_JOINER: char = '\u{200D}';

/// Code points that attach to the preceding base character.
pub const CLUSTER_EXTENDERS: [char; 13] = [
    '\u{0308}', // COMBINING DIAERESIS
    '\u{0937}', // DEVANAGARI LETTER SSA
    '\u{093F}', // DEVANAGARI VOWEL SIGN I
    '\u{0BA8}', // TAMIL LETTER NA
    '\u{0BBF}', // TAMIL VOWEL SIGN I
    '\u{0BCD}', // TAMIL SIGN VIRAMA
    '\u{0E31}', // THAI CHARACTER MAI HAN-AKAT
    '\u{0E33}', // THAI CHARACTER SARA AM
    '\u{0E40}', // THAI CHARACTER SARA E
    '\u{0E49}', // THAI CHARACTER MAI THO
    '\u{1100}', // HANGUL CHOSEONG KIYEOK
    '\u{1161}', // HANGUL JUNGSEONG A
    '\u{11A8}', // HANGUL JONGSEONG KIYEOK
];

/// Iterator over the graphemes of a string slice.
#[derive(Debug, Clone)]
pub struct Graphemes<'a> {
    text: &'a str,
    pos: usize,
}

/// Iterate over the graphemes of `text` without allocating.
pub fn graphemes(text: &str) -> Graphemes<'_> {
    Graphemes { text, pos: 0 }
}

/// Split `text` into graphemes.
pub fn segment(text: &str) -> Vec<&str> {
    graphemes(text).collect()
}

impl<'a> Iterator for Graphemes<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.text[self.pos..];
        if rest.is_empty() {
            return None;
        }

        let len = grapheme_len(rest);
        self.pos += len;
        Some(&rest[..len])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.text.len() - self.pos;
        (usize::from(remaining > 0), Some(remaining))
    }
}

impl FusedIterator for Graphemes<'_> {}

/// Byte length of the grapheme at the start of `s` (which must be non-empty).
fn grapheme_len(s: &str) -> usize {
    let mut end = 0;

    loop {
        end = base_end(s, end);

        if let Some(c) = char_at(s, end)
            && CLUSTER_EXTENDERS.contains(&c)
        {
            end += c.len_utf8();
        }
        if let Some(c) = char_at(s, end)
            && in_range(c, VARIATION_SELECTOR)
        {
            end += c.len_utf8();
        }
        if let Some(c) = char_at(s, end)
            && in_range(c, COMBINING_MARK_FOR_SYMBOLS)
        {
            end += c.len_utf8();
        }

        match char_at(s, end) {
            Some(ZERO_WIDTH_JOINER) => {
                end += ZERO_WIDTH_JOINER.len_utf8();
                if end >= s.len() {
                    return end;
                }
            }
            _ => return end,
        }
    }
}

/// End offset of the base character starting at `start`.
fn base_end(s: &str, start: usize) -> usize {
    let Some(current) = char_at(s, start) else {
        return start;
    };
    let after = start + current.len_utf8();

    // Only supplementary-plane characters pair up with a following modifier.
    if u32::from(current) > 0xFFFF
        && let Some(next) = char_at(s, after)
    {
        let flag_pair =
            in_range(current, REGIONAL_INDICATOR) && in_range(next, REGIONAL_INDICATOR);
        if flag_pair || in_range(next, FITZPATRICK_MODIFIER) {
            return after + next.len_utf8();
        }
    }

    after
}

#[inline]
fn char_at(s: &str, offset: usize) -> Option<char> {
    s.get(offset..).and_then(|rest| rest.chars().next())
}

#[inline]
fn in_range(c: char, (lower, upper): (u32, u32)) -> bool {
    (lower..=upper).contains(&u32::from(c))
}
