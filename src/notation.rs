//! Classification notation parsing and structural validation
//!
//! Iconographic classification notations are hierarchical alphanumeric codes
//! (e.g. `25F23(DOG)`): a digit prefix, optional uppercase letter groups and
//! further digits, parenthesized qualifiers, and `(+N)` suffix keys. This
//! module decomposes a notation into its cumulative hierarchy of parts and
//! enforces the character-set and balancing rules, independent of any
//! vocabulary lookup, so it can also judge candidate notations that are not
//! in a controlled list.

use crate::error::{FormatError, MalformedNotationError};

/// A structurally valid classification notation together with its
/// hierarchical decomposition.
///
/// `parts` is monotonically prefix-extending: each element equals the
/// previous one with exactly one more hierarchical unit appended (a digit, a
/// letter group, a qualifier, or a suffix key). The final element is the
/// canonical form of the whole notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationNotation {
    raw: String,
    parts: Vec<String>,
}

impl ClassificationNotation {
    /// Validate a raw notation string and decompose it into parts.
    ///
    /// Rejects empty input, disallowed characters and unbalanced qualifiers
    /// before parsing; parser failures surface as [`FormatError::Malformed`].
    /// Deterministic and idempotent.
    pub fn validate(raw: &str) -> Result<Self, FormatError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FormatError::Empty);
        }

        let mut depth: i32 = 0;
        for (position, character) in trimmed.chars().enumerate() {
            if !is_allowed_char(character) {
                return Err(FormatError::DisallowedCharacter {
                    position,
                    character,
                });
            }
            match character {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(FormatError::UnbalancedQualifier);
                    }
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(FormatError::UnbalancedQualifier);
        }

        let parts = decompose(trimmed)?;
        Ok(Self {
            raw: trimmed.to_string(),
            parts,
        })
    }

    /// The trimmed original notation string.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The cumulative hierarchical parts, root first.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Canonical form of the notation: the deepest part, or the raw string
    /// when the decomposition is degenerate.
    pub fn canonical(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or(&self.raw)
    }
}

/// Characters permitted in a notation: digits, uppercase letters, the `q`
/// qualifier, parentheses, `+`, space and dot.
fn is_allowed_char(c: char) -> bool {
    c.is_ascii_digit() || c.is_ascii_uppercase() || matches!(c, 'q' | '(' | ')' | '+' | ' ' | '.')
}

/// Decompose a notation string into its cumulative hierarchy of parts.
///
/// Grouping rules, left to right:
/// - digits extend the hierarchy one character at a time;
/// - a maximal run of uppercase letters is appended as a single part;
/// - `q`, space and dot each extend the previous part by one character;
/// - a parenthesized qualifier contributes a `(...)` placeholder part
///   followed by the full literal qualifier;
/// - a `(+N...)` suffix key expands one part per suffix character;
/// - a bare `+` suffix run is appended as one final part.
///
/// Purely structural; the caller is expected to have checked the character
/// set. Fails only on empty input or when a qualifier never closes.
pub fn decompose(notation: &str) -> Result<Vec<String>, MalformedNotationError> {
    if notation.is_empty() {
        return Err(MalformedNotationError::EmptyInput);
    }

    let chars: Vec<char> = notation.chars().collect();
    let mut parts: Vec<String> = Vec::new();
    let mut last = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '(' {
            let end = match matching_paren(&chars, i) {
                Some(end) => end,
                None => return Err(MalformedNotationError::TrailingInput { position: i }),
            };
            let group: String = chars[i..=end].iter().collect();
            if let Some(suffix) = group.strip_prefix("(+") {
                // (+31) expands incrementally: 11H(+3), then 11H(+31)
                let mut stem = format!("{last}(+");
                for key in suffix.chars() {
                    if key == ')' {
                        continue;
                    }
                    parts.push(format!("{stem}{key})"));
                    stem.push(key);
                }
                if let Some(p) = parts.last() {
                    last = p.clone();
                }
            } else {
                if group != "(...)" {
                    parts.push(format!("{last}(...)"));
                }
                parts.push(format!("{last}{group}"));
                last = parts[parts.len() - 1].clone();
            }
            i = end + 1;
        } else if c.is_ascii_uppercase() {
            // One part for the whole letter group, not one per letter.
            let mut j = i;
            while j < chars.len() && chars[j].is_ascii_uppercase() {
                j += 1;
            }
            last.extend(&chars[i..j]);
            parts.push(last.clone());
            i = j;
        } else if c == '+' {
            // Bare suffix run outside parentheses: one final part.
            let mut j = i;
            while j < chars.len() && chars[j] != '(' {
                j += 1;
            }
            last.extend(&chars[i..j]);
            parts.push(last.clone());
            i = j;
        } else {
            last.push(c);
            parts.push(last.clone());
            i += 1;
        }
    }

    Ok(parts)
}

/// Index of the parenthesis closing the group opened at `open`, honoring
/// nesting. `None` when the group never closes.
fn matching_paren(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0;
    for (offset, c) in chars[open..].iter().enumerate() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts_of(notation: &str) -> Vec<String> {
        ClassificationNotation::validate(notation)
            .expect("notation should be valid")
            .parts()
            .to_vec()
    }

    #[test]
    fn test_digits_only_decomposes_digit_by_digit() {
        assert_eq!(parts_of("257"), vec!["2", "25", "257"]);
        assert_eq!(parts_of("25"), vec!["2", "25"]);
        assert_eq!(parts_of("1"), vec!["1"]);
    }

    #[test]
    fn test_letter_run_is_one_part() {
        assert_eq!(parts_of("11H"), vec!["1", "11", "11H"]);
        // Whole run "KL" is a single hierarchical unit.
        assert_eq!(parts_of("11KL"), vec!["1", "11", "11KL"]);
    }

    #[test]
    fn test_digits_after_letters_extend_one_at_a_time() {
        assert_eq!(parts_of("25F23"), vec!["2", "25", "25F", "25F2", "25F23"]);
    }

    #[test]
    fn test_letter_digit_alternation() {
        // Alternation past letters-then-digits keeps the same two rules.
        assert_eq!(
            parts_of("25FF1"),
            vec!["2", "25", "25FF", "25FF1"],
        );
    }

    #[test]
    fn test_qualifier_yields_placeholder_then_literal() {
        assert_eq!(
            parts_of("25F23(DOG)"),
            vec!["2", "25", "25F", "25F2", "25F23", "25F23(...)", "25F23(DOG)"]
        );

        let notation = ClassificationNotation::validate("11H(JEROME)").unwrap();
        let parts = notation.parts();
        assert_eq!(parts[parts.len() - 2], "11H(...)");
        assert_eq!(parts[parts.len() - 1], "11H(JEROME)");
        assert_eq!(notation.canonical(), "11H(JEROME)");
    }

    #[test]
    fn test_literal_placeholder_qualifier_not_duplicated() {
        assert_eq!(parts_of("11H(...)"), vec!["1", "11", "11H", "11H(...)"]);
    }

    #[test]
    fn test_plus_key_expands_incrementally() {
        assert_eq!(
            parts_of("11H(+3)"),
            vec!["1", "11", "11H", "11H(+3)"]
        );
        assert_eq!(
            parts_of("11H(+31)"),
            vec!["1", "11", "11H", "11H(+3)", "11H(+31)"]
        );
    }

    #[test]
    fn test_multiple_qualifiers() {
        assert_eq!(
            parts_of("11H(JEROME)(+3)"),
            vec![
                "1",
                "11",
                "11H",
                "11H(...)",
                "11H(JEROME)",
                "11H(JEROME)(+3)"
            ]
        );
    }

    #[test]
    fn test_q_space_and_dot_extend_by_one_character() {
        assert_eq!(parts_of("11Hq"), vec!["1", "11", "11H", "11Hq"]);
        assert_eq!(parts_of("11 H"), vec!["1", "11", "11 ", "11 H"]);
        assert_eq!(parts_of("11.H"), vec!["1", "11", "11.", "11.H"]);
    }

    #[test]
    fn test_bare_plus_suffix_is_one_final_part() {
        assert_eq!(parts_of("11H+3"), vec!["1", "11", "11H", "11H+3"]);
    }

    #[test]
    fn test_raw_is_trimmed_and_canonical_matches() {
        let notation = ClassificationNotation::validate("  25F23 ").unwrap();
        assert_eq!(notation.raw(), "25F23");
        assert_eq!(notation.canonical(), "25F23");
    }

    #[test]
    fn test_parts_are_prefix_extending() {
        for input in ["25F23(DOG)", "11H(JEROME)(+31)", "41A12", "11Hq(...)"] {
            let parts = parts_of(input);
            for pair in parts.windows(2) {
                // A "(...)" placeholder stands in for the qualifier that
                // follows it, so compare against the part without it.
                let prev = pair[0].strip_suffix("(...)").unwrap_or(&pair[0]);
                assert!(
                    pair[1].starts_with(prev),
                    "{:?} does not extend {:?} in {input}",
                    pair[1],
                    pair[0]
                );
            }
            assert_eq!(parts.last().unwrap(), input);
        }
    }

    #[test]
    fn test_empty_input_rejected() {
        assert_eq!(
            ClassificationNotation::validate("").unwrap_err(),
            FormatError::Empty
        );
        assert_eq!(
            ClassificationNotation::validate("   ").unwrap_err(),
            FormatError::Empty
        );
    }

    #[test]
    fn test_disallowed_character_reports_position() {
        assert_eq!(
            ClassificationNotation::validate("11H@").unwrap_err(),
            FormatError::DisallowedCharacter {
                position: 3,
                character: '@'
            }
        );
        assert_eq!(
            ClassificationNotation::validate("11h").unwrap_err(),
            FormatError::DisallowedCharacter {
                position: 2,
                character: 'h'
            }
        );
        assert!(matches!(
            ClassificationNotation::validate("11H$").unwrap_err(),
            FormatError::DisallowedCharacter { character: '$', .. }
        ));
    }

    #[test]
    fn test_unbalanced_qualifier_rejected() {
        assert_eq!(
            ClassificationNotation::validate("11H(JEROME").unwrap_err(),
            FormatError::UnbalancedQualifier
        );
        assert_eq!(
            ClassificationNotation::validate("11H)JEROME(").unwrap_err(),
            FormatError::UnbalancedQualifier
        );
        assert_eq!(
            ClassificationNotation::validate("11H((A)").unwrap_err(),
            FormatError::UnbalancedQualifier
        );
    }

    #[test]
    fn test_nested_qualifier_collapses_to_one_group() {
        assert_eq!(
            parts_of("11H((A))"),
            vec!["1", "11", "11H", "11H(...)", "11H((A))"]
        );
    }

    #[test]
    fn test_validate_is_idempotent() {
        let first = ClassificationNotation::validate("25F23(DOG)").unwrap();
        let second = ClassificationNotation::validate("25F23(DOG)").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_decompose_rejects_empty() {
        assert_eq!(
            decompose("").unwrap_err(),
            MalformedNotationError::EmptyInput
        );
    }
}
