//! HTML entity escaping and decoding for text that crosses into or out of
//! markup.

pub mod extract;

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub use extract::extract_first_match;

static HEX_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"&#x([0-9a-fA-F]+);").unwrap());

static DEC_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"&#(\d+);").unwrap());

/// Escape the five HTML-significant characters. Each input character is
/// mapped at most once, so `&amp;` in the input becomes `&amp;amp;`.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Decode named and numeric character references.
///
/// Single pass over a fixed replacement list, applied in order to the whole
/// string: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&#39;`, hex refs, decimal
/// refs. Because `&amp;` goes first, `&amp;lt;` chains into `<`; nothing is
/// re-run after the list is exhausted. Numeric references outside the
/// Unicode scalar range are kept as written.
pub fn decode_entities(text: &str) -> String {
    let decoded = text
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    let decoded = replace_numeric(&HEX_REF, &decoded, 16);
    replace_numeric(&DEC_REF, &decoded, 10).into_owned()
}

fn replace_numeric<'a>(re: &Regex, text: &'a str, radix: u32) -> Cow<'a, str> {
    re.replace_all(text, |caps: &Captures| {
        u32::from_str_radix(&caps[1], radix)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    })
}
