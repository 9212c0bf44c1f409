//! Numeric and date coercion for captured field values.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::error::ExtractionError;
use crate::models::FieldValue;
use crate::template::Options;

lazy_static! {
    // Thousands-separator candidates stripped out of numeric fragments.
    static ref SEPARATORS: Regex = Regex::new(r"[.,\s]").unwrap();
}

/// Numeric formats tried after month-name folding.
const FOLDED_DATE_FORMATS: [&str; 2] = ["%d %m %Y", "%m %d %Y"];

/// Formats tried when a template's declared formats do not match.
const DEFAULT_DATE_FORMATS: [&str; 8] = [
    "%Y-%m-%d",
    "%d.%m.%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %B %Y",
    "%B %d, %Y",
];

/// Coercion target declared in a plugin `types` map.
///
/// Load-time validation of the declared spelling means an unknown target
/// cannot reach the coercion code at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoerceKind {
    /// Whole number; parsed like a float, then truncated.
    Int,
    /// Floating-point number.
    Float,
    /// Calendar date.
    Date,
}

impl CoerceKind {
    /// Resolve a declared coercion type name, `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(CoerceKind::Int),
            "float" => Some(CoerceKind::Float),
            "date" => Some(CoerceKind::Date),
            _ => None,
        }
    }
}

/// Parse a numeric fragment using the template's decimal separator.
///
/// The decimal separator is protected with a sentinel while every other
/// candidate separator (period, comma, whitespace) is stripped as a
/// thousands separator, then restored as the canonical decimal point.
/// A fragment containing the decimal separator more than once is
/// rejected.
pub fn parse_number(value: &str, decimal_separator: char) -> Result<f64, ExtractionError> {
    if value.matches(decimal_separator).count() > 1 {
        return Err(ExtractionError::NumberParse {
            value: value.to_string(),
        });
    }

    let protected = value.replace(decimal_separator, "|");
    let stripped = SEPARATORS.replace_all(&protected, "");
    let canonical = stripped.replace('|', ".");

    canonical.parse::<f64>().map_err(|_| ExtractionError::NumberParse {
        value: value.to_string(),
    })
}

/// Parse a date fragment against the template's declared formats and
/// languages.
///
/// Declared formats are tried first, then month names in the declared
/// languages are folded to numbers and re-tried, then the built-in
/// default formats. Returns `None` when nothing matches; the caller
/// decides whether that is fatal for the document.
pub fn parse_date(value: &str, options: &Options) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    for format in &options.date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    for language in &options.languages {
        if let Some(folded) = fold_month_names(value, language) {
            for format in FOLDED_DATE_FORMATS {
                if let Ok(date) = NaiveDate::parse_from_str(&folded, format) {
                    return Some(date);
                }
            }
        }
    }

    for format in DEFAULT_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    debug!("no date format matched {value:?}");
    None
}

/// Coerce a captured fragment to a declared target type.
///
/// Empty or whitespace-only fragments coerce to zero for the numeric
/// targets instead of failing; an unparsable date is an error because
/// the caller asked for a date and has no fallback.
pub fn coerce(
    field: &str,
    value: &str,
    kind: CoerceKind,
    options: &Options,
) -> Result<FieldValue, ExtractionError> {
    match kind {
        CoerceKind::Int => {
            if value.trim().is_empty() {
                return Ok(FieldValue::Number(0.0));
            }
            let number = parse_number(value, options.decimal_separator)?;
            Ok(FieldValue::Number(number.trunc()))
        }
        CoerceKind::Float => {
            if value.trim().is_empty() {
                return Ok(FieldValue::Number(0.0));
            }
            Ok(FieldValue::Number(parse_number(value, options.decimal_separator)?))
        }
        CoerceKind::Date => parse_date(value, options)
            .map(FieldValue::Date)
            .ok_or_else(|| ExtractionError::DateParse {
                field: field.to_string(),
                value: value.to_string(),
            }),
    }
}

/// Replace a month name of `language` with its number and reduce the
/// fragment to digits and spaces, so the numeric folded formats apply.
/// `None` when the fragment contains no month name of that language.
fn fold_month_names(value: &str, language: &str) -> Option<String> {
    let months = month_names(language)?;
    let lowered = value.to_lowercase();

    for (index, name) in months.iter().enumerate() {
        if lowered.contains(name) {
            let substituted = lowered.replace(name, &(index + 1).to_string());
            let folded: String = substituted
                .chars()
                .map(|c| if c.is_ascii_digit() { c } else { ' ' })
                .collect();
            return Some(folded);
        }
    }
    None
}

/// Full month names per supported 2-letter language code.
fn month_names(language: &str) -> Option<&'static [&'static str; 12]> {
    match language {
        "en" => Some(&[
            "january", "february", "march", "april", "may", "june", "july", "august",
            "september", "october", "november", "december",
        ]),
        "de" => Some(&[
            "januar", "februar", "märz", "april", "mai", "juni", "juli", "august",
            "september", "oktober", "november", "dezember",
        ]),
        "fr" => Some(&[
            "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août",
            "septembre", "octobre", "novembre", "décembre",
        ]),
        "es" => Some(&[
            "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto",
            "septiembre", "octubre", "noviembre", "diciembre",
        ]),
        "it" => Some(&[
            "gennaio", "febbraio", "marzo", "aprile", "maggio", "giugno", "luglio",
            "agosto", "settembre", "ottobre", "novembre", "dicembre",
        ]),
        "nl" => Some(&[
            "januari", "februari", "maart", "april", "mei", "juni", "juli", "augustus",
            "september", "oktober", "november", "december",
        ]),
        "pl" => Some(&[
            "stycznia", "lutego", "marca", "kwietnia", "maja", "czerwca", "lipca",
            "sierpnia", "września", "października", "listopada", "grudnia",
        ]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options_with_separator(separator: char) -> Options {
        Options {
            decimal_separator: separator,
            ..Options::default()
        }
    }

    #[test]
    fn parses_comma_decimal_with_period_thousands() {
        assert_eq!(parse_number("1.234,56", ',').unwrap(), 1234.56);
    }

    #[test]
    fn parses_period_decimal_with_comma_thousands() {
        assert_eq!(parse_number("1,234.56", '.').unwrap(), 1234.56);
    }

    #[test]
    fn parses_space_thousands() {
        assert_eq!(parse_number("12 345 678,90", ',').unwrap(), 12345678.90);
    }

    #[test]
    fn rejects_repeated_decimal_separator() {
        assert!(parse_number("1.2.3", '.').is_err());
    }

    #[test]
    fn rejects_non_numeric_fragment() {
        assert!(parse_number("n/a", '.').is_err());
    }

    #[test]
    fn parses_iso_date_by_default() {
        let options = Options::default();
        assert_eq!(
            parse_date("2020-01-15", &options),
            NaiveDate::from_ymd_opt(2020, 1, 15)
        );
    }

    #[test]
    fn declared_formats_take_precedence() {
        let options = Options {
            date_formats: vec!["%m/%d/%Y".to_string()],
            ..Options::default()
        };
        // The default list would read this day-first.
        assert_eq!(
            parse_date("01/02/2020", &options),
            NaiveDate::from_ymd_opt(2020, 1, 2)
        );
    }

    #[test]
    fn parses_month_names_in_declared_languages() {
        let options = Options {
            languages: vec!["de".to_string()],
            ..Options::default()
        };
        assert_eq!(
            parse_date("15. März 2024", &options),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );

        let options = Options {
            languages: vec!["pl".to_string()],
            ..Options::default()
        };
        assert_eq!(
            parse_date("15 stycznia 2024", &options),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }

    #[test]
    fn unparsable_date_yields_none() {
        assert_eq!(parse_date("not a date", &Options::default()), None);
        assert_eq!(parse_date("   ", &Options::default()), None);
    }

    #[test]
    fn empty_fragments_coerce_to_zero() {
        let options = options_with_separator('.');
        assert_eq!(
            coerce("qty", "", CoerceKind::Int, &options).unwrap(),
            FieldValue::Number(0.0)
        );
        assert_eq!(
            coerce("price", "  ", CoerceKind::Float, &options).unwrap(),
            FieldValue::Number(0.0)
        );
    }

    #[test]
    fn int_coercion_truncates() {
        let options = options_with_separator('.');
        assert_eq!(
            coerce("qty", "3.99", CoerceKind::Int, &options).unwrap(),
            FieldValue::Number(3.0)
        );
    }

    #[test]
    fn date_coercion_failure_is_an_error() {
        let err = coerce("date", "tomorrow", CoerceKind::Date, &Options::default()).unwrap_err();
        assert!(matches!(err, ExtractionError::DateParse { .. }));
    }
}
