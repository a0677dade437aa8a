// 🔑 Key Normalizer - Canonical join keys
// Identifiers arrive from two systems with different encodings:
// Excel round-trips integers through floats ("1234" → "1234.0"),
// CSV exports drop leading zeros, and humans add whitespace.
// Normalization makes all of them compare equal.

/// Fixed canonical key width. Ternium product keys are zero-padded
/// to 10 digits; this is a system constant, not configuration.
pub const KEY_WIDTH: usize = 10;

/// Normalize a join key or display identifier to canonical form.
///
/// Applied in order:
/// 1. Trim surrounding whitespace
/// 2. Strip one trailing literal ".0" (float round-trip artifact)
/// 3. Left-pad with '0' to KEY_WIDTH
///
/// Must be applied identically to BOTH sides of a join key,
/// otherwise matches silently fail.
///
/// # Examples
/// ```
/// use price_sync::normalize::normalize_key;
/// assert_eq!(normalize_key("123"), "0000000123");
/// assert_eq!(normalize_key(" 123.0 "), "0000000123");
/// assert_eq!(normalize_key("0000000123"), "0000000123");
/// ```
pub fn normalize_key(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = strip_float_suffix(trimmed);
    zero_pad(stripped)
}

/// Clean a display identifier (external id or internal reference).
/// Same repair as a join key minus the zero-padding: reference codes
/// like "PROD-45" must round-trip into the update file byte-exact,
/// so they only get the trim and the float-artifact strip.
pub fn clean_identifier(raw: &str) -> String {
    strip_float_suffix(raw.trim()).to_string()
}

/// Strip one trailing ".0" if present.
/// "1234.0" → "1234", but "1234.05" stays untouched.
fn strip_float_suffix(value: &str) -> &str {
    value.strip_suffix(".0").unwrap_or(value)
}

/// Left-pad with '0' to KEY_WIDTH. Values already at or beyond
/// the width pass through unchanged.
fn zero_pad(value: &str) -> String {
    let len = value.chars().count();
    if len >= KEY_WIDTH {
        value.to_string()
    } else {
        let mut padded = String::with_capacity(KEY_WIDTH);
        for _ in 0..(KEY_WIDTH - len) {
            padded.push('0');
        }
        padded.push_str(value);
        padded
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_short_key_zero_pads() {
        assert_eq!(normalize_key("123"), "0000000123");
        assert_eq!(normalize_key("1"), "0000000001");
    }

    #[test]
    fn test_normalize_strips_float_artifact() {
        assert_eq!(normalize_key("1234.0"), "0000001234");
        // Only the literal ".0" artifact, not real decimals
        assert_eq!(normalize_key("1234.05"), "0001234.05");
    }

    #[test]
    fn test_normalize_trims_whitespace() {
        assert_eq!(normalize_key("  123  "), "0000000123");
        assert_eq!(normalize_key("\t45.0\n"), "0000000045");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_key("987.0");
        let twice = normalize_key(&once);
        assert_eq!(once, twice);

        let already = normalize_key("0000000123");
        assert_eq!(already, "0000000123");
    }

    #[test]
    fn test_equivalent_encodings_converge() {
        // Same logical id, three encodings
        assert_eq!(normalize_key("123"), normalize_key("123.0"));
        assert_eq!(normalize_key("123"), normalize_key(" 0000000123 "));
        assert_eq!(normalize_key("123.0"), normalize_key("0000000123"));
    }

    #[test]
    fn test_long_keys_pass_through() {
        assert_eq!(normalize_key("12345678901"), "12345678901");
        assert_eq!(normalize_key("ABCDEFGHIJK"), "ABCDEFGHIJK");
    }

    #[test]
    fn test_clean_identifier_no_padding() {
        assert_eq!(clean_identifier(" 0000123 "), "0000123");
        assert_eq!(clean_identifier("45.0"), "45");
        assert_eq!(clean_identifier("PROD-45"), "PROD-45");
    }

    #[test]
    fn test_empty_key_pads_to_zeros() {
        assert_eq!(normalize_key(""), "0000000000");
        assert_eq!(normalize_key("   "), "0000000000");
    }
}
