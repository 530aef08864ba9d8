//! Emoji detection over extended grapheme clusters.

use unicode_segmentation::UnicodeSegmentation;

/// Code point ranges whose scalars can start an emoji presentation.
const EMOJI_RANGES: &[(u32, u32)] = &[
    (0x00A9, 0x00A9),
    (0x00AE, 0x00AE),
    (0x203C, 0x203C),
    (0x2049, 0x2049),
    (0x2122, 0x2122),
    (0x2139, 0x2139),
    (0x2194, 0x21AA),
    (0x231A, 0x23FF),
    (0x24C2, 0x24C2),
    (0x25AA, 0x25FE),
    (0x2600, 0x27BF),
    (0x2934, 0x2935),
    (0x2B05, 0x2B55),
    (0x3030, 0x3030),
    (0x303D, 0x303D),
    (0x3297, 0x3299),
    (0x1F000, 0x1FAFF),
];

const KEYCAP: char = '\u{20E3}';

fn in_emoji_range(c: char) -> bool {
    let cp = c as u32;
    EMOJI_RANGES
        .iter()
        .any(|&(lo, hi)| (lo..=hi).contains(&cp))
}

/// Whether a single grapheme cluster renders as an emoji.
///
/// Low code points that are emoji only by variation (©, ↔, ...) count only
/// when more scalars follow, e.g. a VS16 selector. Keycap sequences such as
/// `1️⃣` also count.
pub fn is_emoji(grapheme: &str) -> bool {
    let mut scalars = grapheme.chars();
    let Some(first) = scalars.next() else {
        return false;
    };
    let multi = scalars.next().is_some();

    if (first.is_ascii_digit() || first == '#' || first == '*') && grapheme.contains(KEYCAP) {
        return true;
    }
    if !in_emoji_range(first) {
        return false;
    }
    first as u32 > 0x238C || multi
}

/// The first grapheme of `text`, if it is an emoji.
pub fn first_emoji(text: &str) -> Option<&str> {
    text.graphemes(true).next().filter(|g| is_emoji(g))
}

/// Split a run of emoji into graphemes, dropping anything that is not one.
pub fn emoji_graphemes(text: &str) -> impl Iterator<Item = &str> {
    text.graphemes(true).filter(|g| is_emoji(g))
}
