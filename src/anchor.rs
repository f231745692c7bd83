//! Anchor identifiers for headings.
//!
//! Every TOC entry links to its heading through a fragment identifier derived
//! from the heading text. The derivation mirrors the ids the HTML renderer
//! assigns to section headings, so `href="#_my_heading"` in the generated TOC
//! lands on the right element:
//!
//! ```text
//! "Why I Don't *Use* (Much) CSS!"  →  "_why_i_dont_use_much_css"
//! "Input / Output"                  →  "_input_output"
//! ```
//!
//! The rules are applied in a fixed order; changing the order changes the
//! output (e.g. `_/_` is collapsed *before* bare slashes are stripped).
//!
//! Two different headings can normalize to the same identifier. Collisions are
//! not deduplicated.

/// Apostrophe forms removed from identifiers.
///
/// `â€™` is the UTF-8 encoding of `’` (U+2019) decoded as Windows-1252. Older
/// posts were written through an editor that produced it, and the anchors
/// published for them drop those bytes. The correctly decoded `’` is dropped
/// as well so both spellings produce the same identifier.
const APOSTROPHES: &[&str] = &["'", "â€™", "\u{2019}"];

/// Characters removed after lowercasing.
const STRIPPED: &[char] = &['(', ')', '/', '`', '!'];

/// Turn heading text into a lowercase anchor identifier.
///
/// Already-normalized input is returned unchanged, so the function can be
/// applied to identifiers coming back from templates without drifting.
/// The `_` prefix is only added when the text does not already start with
/// one, so a heading such as `_x` gives `_x` rather than `__x`.
pub fn normalize(heading: &str) -> String {
    let mut ident = heading.replace(' ', "_");
    if !ident.starts_with('_') {
        ident.insert(0, '_');
    }
    for apostrophe in APOSTROPHES {
        ident = ident.replace(apostrophe, "");
    }
    ident = ident.replace('*', "");
    ident = ident.to_lowercase();
    ident = ident.replace("_/_", "_");
    ident.retain(|c| !STRIPPED.contains(&c));
    ident
}
