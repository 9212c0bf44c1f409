//! Text normalization applied before keyword matching and extraction.

use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::Options;

lazy_static! {
    static ref SPACE_RUNS: Regex = Regex::new(r" +").unwrap();
}

/// Apply a template's normalization options to raw text.
///
/// Steps run in a fixed order: space removal, accent transliteration,
/// lowercasing, then the declared literal replacements. No pattern
/// matching happens here; `replace` entries are plain substrings.
pub fn normalize(text: &str, options: &Options) -> String {
    let mut normalized = if options.remove_whitespace {
        // Only the space character; newlines and tabs stay, they carry
        // the line structure the patterns rely on.
        SPACE_RUNS.replace_all(text, "").into_owned()
    } else {
        text.to_string()
    };

    if options.remove_accents {
        normalized = strip_accents(&normalized);
    }

    if options.lowercase {
        normalized = normalized.to_lowercase();
    }

    for (from, to) in &options.replace {
        normalized = normalized.replace(from.as_str(), to.as_str());
    }

    normalized
}

/// Transliterate accented characters to their ASCII base form.
///
/// NFKD decomposition followed by dropping combining marks; characters
/// without a decomposition pass through unchanged.
fn strip_accents(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_space_runs_only() {
        let options = Options {
            remove_whitespace: true,
            ..Options::default()
        };

        assert_eq!(normalize("a b  c", &options), "abc");
        assert_eq!(normalize("a\nb\tc", &options), "a\nb\tc");
    }

    #[test]
    fn strips_accents() {
        let options = Options {
            remove_accents: true,
            ..Options::default()
        };

        assert_eq!(normalize("Café Zürich déjà", &options), "Cafe Zurich deja");
    }

    #[test]
    fn lowercases() {
        let options = Options {
            lowercase: true,
            ..Options::default()
        };

        assert_eq!(normalize("ACME Corp", &options), "acme corp");
    }

    #[test]
    fn applies_replacements_in_order() {
        let options = Options {
            replace: vec![
                ("GmbH".to_string(), "Ltd".to_string()),
                ("Ltd".to_string(), "Limited".to_string()),
            ],
            ..Options::default()
        };

        assert_eq!(normalize("ACME GmbH", &options), "ACME Limited");
    }

    #[test]
    fn normalization_is_idempotent() {
        let options = Options {
            remove_whitespace: true,
            remove_accents: true,
            lowercase: true,
            ..Options::default()
        };

        let once = normalize("ACME Café  Corp", &options);
        let twice = normalize(&once, &options);
        assert_eq!(once, twice);
    }
}
