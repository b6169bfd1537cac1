use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#[xX](?P<hex>[0-9a-fA-F]{1,8})|#(?P<dec>[0-9]{1,10})|(?P<name>[a-zA-Z][a-zA-Z0-9]{1,31}));")
        .expect("entity regex")
});

/// Named entities WordPress emits in titles, excerpts and post bodies.
fn named_entity(name: &str) -> Option<&'static str> {
    let decoded = match name {
        "amp" => "&",
        "quot" => "\"",
        "apos" => "'",
        "lt" => "<",
        "gt" => ">",
        "nbsp" => " ",
        "hellip" => "…",
        "ndash" => "–",
        "mdash" => "—",
        "lsquo" => "‘",
        "rsquo" => "’",
        "sbquo" => "‚",
        "ldquo" => "“",
        "rdquo" => "”",
        "bdquo" => "„",
        "laquo" => "«",
        "raquo" => "»",
        "bull" => "•",
        "middot" => "·",
        "copy" => "©",
        "reg" => "®",
        "trade" => "™",
        "euro" => "€",
        "deg" => "°",
        "times" => "×",
        "acirc" => "â",
        "auml" => "ä",
        "ouml" => "ö",
        "uuml" => "ü",
        "Auml" => "Ä",
        "Ouml" => "Ö",
        "Uuml" => "Ü",
        "szlig" => "ß",
        _ => return None,
    };
    Some(decoded)
}

/// Decode named and numeric character references in a single pass.
///
/// Unknown names and numeric references that do not map to a Unicode scalar
/// are left exactly as written. Because the scan is single-pass, an escaped
/// entity such as `&amp;lt;` decodes to the literal text `&lt;`.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let original = caps.get(0).map(|m| m.as_str()).unwrap_or_default();

            if let Some(hex) = caps.name("hex") {
                return u32::from_str_radix(hex.as_str(), 16)
                    .ok()
                    .and_then(text_char)
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| original.to_string());
            }

            if let Some(dec) = caps.name("dec") {
                return dec
                    .as_str()
                    .parse::<u32>()
                    .ok()
                    .and_then(text_char)
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| original.to_string());
            }

            caps.name("name")
                .and_then(|name| named_entity(name.as_str()))
                .map(str::to_string)
                .unwrap_or_else(|| original.to_string())
        })
        .into_owned()
}

/// Scalar for a numeric reference, refusing NUL and the C0 controls other than
/// whitespace so they never reach JSON-LD or attribute text.
fn text_char(code: u32) -> Option<char> {
    let c = char::from_u32(code)?;
    match c {
        '\t' | '\n' | '\u{0C}' | '\r' => Some(c),
        '\0'..='\u{1F}' | '\u{7F}' => None,
        _ => Some(c),
    }
}

/// Escape text for use inside a double-quoted attribute value.
pub fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape text for use as element content.
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
