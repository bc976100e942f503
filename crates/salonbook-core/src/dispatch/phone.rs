//! Recipient number normalization.
//!
//! The customer base is Italian: bare 10-digit mobile numbers (they start
//! with `3`) gain a `+39` country prefix before hitting the carrier.
//! Numbers that already carry an international prefix (`+` or `00`) pass
//! through untouched.

/// Normalize a raw phone number for sending.
///
/// Formatting inside the number (spaces, dots) is preserved -- only the
/// prefix is added.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('+') || trimmed.starts_with("00") {
        return trimmed.to_string();
    }

    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 && digits.starts_with('3') {
        format!("+39 {trimmed}")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_mobile_gains_country_prefix() {
        assert_eq!(normalize_phone("333 1234567"), "+39 333 1234567");
        assert_eq!(normalize_phone("3331234567"), "+39 3331234567");
    }

    #[test]
    fn existing_plus_prefix_is_preserved() {
        assert_eq!(normalize_phone("+39 333 1234567"), "+39 333 1234567");
        assert_eq!(normalize_phone("+41 79 123 45 67"), "+41 79 123 45 67");
    }

    #[test]
    fn double_zero_prefix_is_preserved() {
        assert_eq!(normalize_phone("0039 333 1234567"), "0039 333 1234567");
    }

    #[test]
    fn landlines_pass_through() {
        // Rome landline: 10 digits but starts with 0, not a mobile.
        assert_eq!(normalize_phone("06 1234 5678"), "06 1234 5678");
    }

    #[test]
    fn short_or_odd_numbers_pass_through() {
        assert_eq!(normalize_phone("12345"), "12345");
        assert_eq!(normalize_phone(""), "");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(normalize_phone("  333 1234567  "), "+39 333 1234567");
    }
}
