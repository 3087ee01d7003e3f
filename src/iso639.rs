//! ISO 639-1 two-letter language codes
//!
//! A fixed, complete enumeration consulted by language membership checks as
//! a secondary source, so they do not depend on the controlled dataset
//! carrying every standard code.

use std::collections::HashSet;
use std::sync::OnceLock;

/// Complete ISO 639-1 code list.
/// Source: https://www.loc.gov/standards/iso639-2/php/code_list.php
pub const ISO_639_1_CODES: [&str; 184] = [
    "aa", "ab", "ae", "af", "ak", "am", "an", "ar", "as", "av", "ay", "az",
    "ba", "be", "bg", "bh", "bi", "bm", "bn", "bo", "br", "bs", "ca", "ce",
    "ch", "co", "cr", "cs", "cu", "cv", "cy", "da", "de", "dv", "dz", "ee",
    "el", "en", "eo", "es", "et", "eu", "fa", "ff", "fi", "fj", "fo", "fr",
    "fy", "ga", "gd", "gl", "gn", "gu", "gv", "ha", "he", "hi", "ho", "hr",
    "ht", "hu", "hy", "hz", "ia", "id", "ie", "ig", "ii", "ik", "io", "is",
    "it", "iu", "ja", "jv", "ka", "kg", "ki", "kj", "kk", "kl", "km", "kn",
    "ko", "kr", "ks", "ku", "kv", "kw", "ky", "la", "lb", "lg", "li", "ln",
    "lo", "lt", "lu", "lv", "mg", "mh", "mi", "mk", "ml", "mn", "mr", "ms",
    "mt", "my", "na", "nb", "nd", "ne", "ng", "nl", "nn", "no", "nr", "nv",
    "ny", "oc", "oj", "om", "or", "os", "pa", "pi", "pl", "ps", "pt", "qu",
    "rm", "rn", "ro", "ru", "rw", "sa", "sc", "sd", "se", "sg", "si", "sk",
    "sl", "sm", "sn", "so", "sq", "sr", "ss", "st", "su", "sv", "sw", "ta",
    "te", "tg", "th", "ti", "tk", "tl", "tn", "to", "tr", "ts", "tt", "tw",
    "ty", "ug", "uk", "ur", "uz", "ve", "vi", "vo", "wa", "wo", "xh", "yi",
    "yo", "za", "zh", "zu",
];

fn code_set() -> &'static HashSet<&'static str> {
    static CODES: OnceLock<HashSet<&'static str>> = OnceLock::new();
    CODES.get_or_init(|| ISO_639_1_CODES.iter().copied().collect())
}

/// Check whether `code` is an ISO 639-1 two-letter code. Case-insensitive.
pub fn is_iso639_1(code: &str) -> bool {
    if code.len() != 2 {
        return false;
    }
    code_set().contains(code.to_ascii_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_codes_are_valid() {
        for code in ["de", "fr", "es", "la", "en", "it"] {
            assert!(is_iso639_1(code), "{code} should be valid");
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(is_iso639_1("EN"));
        assert!(is_iso639_1("De"));
    }

    #[test]
    fn test_invalid_codes_rejected() {
        assert!(!is_iso639_1(""));
        assert!(!is_iso639_1("d"));
        assert!(!is_iso639_1("deu"));
        assert!(!is_iso639_1("xx"));
        assert!(!is_iso639_1("zz"));
    }

    #[test]
    fn test_enumeration_is_complete() {
        assert_eq!(ISO_639_1_CODES.len(), 184);
        // No duplicates in the table.
        let unique: HashSet<_> = ISO_639_1_CODES.iter().collect();
        assert_eq!(unique.len(), ISO_639_1_CODES.len());
    }
}
