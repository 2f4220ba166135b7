//! Text cleanup helpers shared by every extraction strategy

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31})(;?)").unwrap()
});

static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)import([A-Za-z_]\w*)").unwrap());

static ASSIGN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\b(url|data)=(f"|requests\b)"#).unwrap());

/// Latin-1 entity names in code point order from U+00A0
///
/// These, like [`LEGACY_ASCII`], also decode without the trailing semicolon,
/// as browsers do for legacy markup.
const LATIN1_NAMES: [&str; 96] = [
    "nbsp", "iexcl", "cent", "pound", "curren", "yen", "brvbar", "sect", "uml", "copy", "ordf",
    "laquo", "not", "shy", "reg", "macr", "deg", "plusmn", "sup2", "sup3", "acute", "micro",
    "para", "middot", "cedil", "sup1", "ordm", "raquo", "frac14", "frac12", "frac34", "iquest",
    "Agrave", "Aacute", "Acirc", "Atilde", "Auml", "Aring", "AElig", "Ccedil", "Egrave",
    "Eacute", "Ecirc", "Euml", "Igrave", "Iacute", "Icirc", "Iuml", "ETH", "Ntilde", "Ograve",
    "Oacute", "Ocirc", "Otilde", "Ouml", "times", "Oslash", "Ugrave", "Uacute", "Ucirc", "Uuml",
    "Yacute", "THORN", "szlig", "agrave", "aacute", "acirc", "atilde", "auml", "aring", "aelig",
    "ccedil", "egrave", "eacute", "ecirc", "euml", "igrave", "iacute", "icirc", "iuml", "eth",
    "ntilde", "ograve", "oacute", "ocirc", "otilde", "ouml", "divide", "oslash", "ugrave",
    "uacute", "ucirc", "uuml", "yacute", "thorn", "yuml",
];

/// Every other known name; only [`LEGACY_ASCII`] ones decode without a semicolon
const NAMED: &[(&str, char)] = &[
    ("amp", '&'), ("AMP", '&'), ("lt", '<'), ("LT", '<'), ("gt", '>'), ("GT", '>'),
    ("quot", '"'), ("QUOT", '"'), ("COPY", '©'), ("REG", '®'), ("apos", '\''), ("Tab", '\t'),
    ("NewLine", '\n'), ("excl", '!'), ("num", '#'), ("dollar", '$'), ("percnt", '%'),
    ("lpar", '('), ("rpar", ')'), ("ast", '*'), ("plus", '+'), ("comma", ','), ("period", '.'),
    ("sol", '/'), ("colon", ':'), ("semi", ';'), ("equals", '='), ("quest", '?'),
    ("commat", '@'), ("lsqb", '['), ("rsqb", ']'), ("bsol", '\\'), ("Hat", '^'),
    ("lowbar", '_'), ("grave", '`'), ("lcub", '{'), ("rcub", '}'), ("verbar", '|'),
    ("vert", '|'), ("OElig", 'Œ'), ("oelig", 'œ'), ("Scaron", 'Š'), ("scaron", 'š'),
    ("Yuml", 'Ÿ'), ("fnof", 'ƒ'), ("circ", 'ˆ'), ("tilde", '˜'), ("ensp", '\u{2002}'),
    ("emsp", '\u{2003}'), ("thinsp", '\u{2009}'), ("zwnj", '\u{200c}'), ("zwj", '\u{200d}'),
    ("lrm", '\u{200e}'), ("rlm", '\u{200f}'), ("ndash", '–'), ("mdash", '—'), ("lsquo", '‘'),
    ("rsquo", '’'), ("sbquo", '‚'), ("ldquo", '“'), ("rdquo", '”'), ("bdquo", '„'),
    ("dagger", '†'), ("Dagger", '‡'), ("bull", '•'), ("hellip", '…'), ("permil", '‰'),
    ("prime", '′'), ("Prime", '″'), ("lsaquo", '‹'), ("rsaquo", '›'), ("oline", '‾'),
    ("frasl", '⁄'), ("euro", '€'), ("image", 'ℑ'), ("weierp", '℘'), ("real", 'ℜ'),
    ("trade", '™'), ("alefsym", 'ℵ'), ("larr", '←'), ("uarr", '↑'), ("rarr", '→'),
    ("darr", '↓'), ("harr", '↔'), ("crarr", '↵'), ("lArr", '⇐'), ("uArr", '⇑'), ("rArr", '⇒'),
    ("dArr", '⇓'), ("hArr", '⇔'), ("forall", '∀'), ("part", '∂'), ("exist", '∃'),
    ("empty", '∅'), ("nabla", '∇'), ("isin", '∈'), ("notin", '∉'), ("ni", '∋'), ("prod", '∏'),
    ("sum", '∑'), ("minus", '−'), ("lowast", '∗'), ("radic", '√'), ("prop", '∝'),
    ("infin", '∞'), ("ang", '∠'), ("and", '∧'), ("or", '∨'), ("cap", '∩'), ("cup", '∪'),
    ("int", '∫'), ("there4", '∴'), ("sim", '∼'), ("cong", '≅'), ("asymp", '≈'), ("ne", '≠'),
    ("equiv", '≡'), ("le", '≤'), ("ge", '≥'), ("sub", '⊂'), ("sup", '⊃'), ("nsub", '⊄'),
    ("sube", '⊆'), ("supe", '⊇'), ("oplus", '⊕'), ("otimes", '⊗'), ("perp", '⊥'), ("sdot", '⋅'),
    ("lceil", '⌈'), ("rceil", '⌉'), ("lfloor", '⌊'), ("rfloor", '⌋'), ("lang", '⟨'),
    ("rang", '⟩'), ("loz", '◊'), ("spades", '♠'), ("clubs", '♣'), ("hearts", '♥'),
    ("diams", '♦'), ("Alpha", 'Α'), ("Beta", 'Β'), ("Gamma", 'Γ'), ("Delta", 'Δ'),
    ("Epsilon", 'Ε'), ("Zeta", 'Ζ'), ("Eta", 'Η'), ("Theta", 'Θ'), ("Iota", 'Ι'),
    ("Kappa", 'Κ'), ("Lambda", 'Λ'), ("Mu", 'Μ'), ("Nu", 'Ν'), ("Xi", 'Ξ'), ("Omicron", 'Ο'),
    ("Pi", 'Π'), ("Rho", 'Ρ'), ("Sigma", 'Σ'), ("Tau", 'Τ'), ("Upsilon", 'Υ'), ("Phi", 'Φ'),
    ("Chi", 'Χ'), ("Psi", 'Ψ'), ("Omega", 'Ω'), ("alpha", 'α'), ("beta", 'β'), ("gamma", 'γ'),
    ("delta", 'δ'), ("epsilon", 'ε'), ("zeta", 'ζ'), ("eta", 'η'), ("theta", 'θ'),
    ("iota", 'ι'), ("kappa", 'κ'), ("lambda", 'λ'), ("mu", 'μ'), ("nu", 'ν'), ("xi", 'ξ'),
    ("omicron", 'ο'), ("pi", 'π'), ("rho", 'ρ'), ("sigmaf", 'ς'), ("sigma", 'σ'), ("tau", 'τ'),
    ("upsilon", 'υ'), ("phi", 'φ'), ("chi", 'χ'), ("psi", 'ψ'), ("omega", 'ω'),
    ("thetasym", 'ϑ'), ("upsih", 'ϒ'), ("piv", 'ϖ'),
];

/// Names decoded even when the semicolon is missing, besides [`LATIN1_NAMES`]
const LEGACY_ASCII: [&str; 10] = [
    "amp", "AMP", "lt", "LT", "gt", "GT", "quot", "QUOT", "COPY", "REG",
];

static ENTITIES: LazyLock<HashMap<&'static str, char>> = LazyLock::new(|| {
    let latin1 = LATIN1_NAMES
        .iter()
        .zip('\u{a0}'..='\u{ff}')
        .map(|(name, c)| (*name, c));
    latin1.chain(NAMED.iter().copied()).collect()
});

/// Decodes HTML character references
///
/// Numeric references decode in full, with invalid code points becoming
/// U+FFFD. Named references cover the HTML 4 set plus the ASCII punctuation
/// names. Without a semicolon, the longest legacy name prefixing the reference
/// is decoded and the rest kept, so `&copy2024` reads `©2024`. Unknown names
/// are left untouched.
pub fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let body = &caps[1];
            let terminator = &caps[2];
            match decode_reference(body, terminator) {
                Some(decoded) => decoded,
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn decode_reference(body: &str, terminator: &str) -> Option<String> {
    if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
        return u32::from_str_radix(hex, 16).ok().map(numeric_char).map(String::from);
    }
    if let Some(dec) = body.strip_prefix('#') {
        return dec.parse::<u32>().ok().map(numeric_char).map(String::from);
    }

    if !terminator.is_empty() {
        if let Some(c) = ENTITIES.get(body) {
            return Some(c.to_string());
        }
    }

    (2..=body.len()).rev().find_map(|len| {
        let name = body.get(..len)?;
        if !is_legacy(name) {
            return None;
        }
        let c = ENTITIES.get(name)?;
        Some(format!("{}{}{}", c, &body[len..], terminator))
    })
}

fn numeric_char(code: u32) -> char {
    match code {
        0 => '\u{fffd}',
        code => char::from_u32(code).unwrap_or('\u{fffd}'),
    }
}

fn is_legacy(name: &str) -> bool {
    LATIN1_NAMES.contains(&name) || LEGACY_ASCII.contains(&name)
}

/// Collapses every whitespace run to a single space and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decodes entities, collapses whitespace and trims
///
/// # Example
///
/// ```
/// use fin_doc_crawler::normalizer::clean_text;
///
/// assert_eq!(clean_text("  股票 &gt;\n  日线  "), "股票 > 日线");
/// ```
pub fn clean_text(text: &str) -> String {
    collapse_whitespace(&decode_entities(text))
}

/// Strips tag markup, then cleans the remaining text like [`clean_text`]
///
/// Tags are replaced by a space so adjacent cells never run together.
pub fn clean_html(html: &str) -> String {
    let stripped = TAG_RE.replace_all(html, " ");
    collapse_whitespace(&decode_entities(&stripped))
}

/// Best-effort cosmetic repair of the Python example snippet
///
/// The rendered code blocks lose some spaces: `import` glued to the module
/// name and the `url`/`data` assignments of the sample client.
pub fn clean_python_example(code: &str) -> String {
    let code = code.trim();
    if code.is_empty() {
        return String::new();
    }

    let code = IMPORT_RE.replace_all(code, "${1}import ${2}");
    let code = ASSIGN_RE.replace_all(&code, "$1 = $2");
    code.into_owned()
}
