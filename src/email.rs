use lazy_static::lazy_static;
use regex::Regex;

/// Syntactic email check: dot-separated atoms in the local part, at
/// least one dot in the domain, alphabetic TLD of two or more chars.
/// Deliberately rejects consecutive or leading/trailing dots.
pub fn is_valid(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(
            r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$"
        )
        .unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_addresses() {
        for email in [
            "alice@example.com",
            "me@example.co.uk",
            "first.last@sub.domain.org",
            "user+tag@gmail.com",
            "a_b-c@ex-ample.net",
            "1234@numbers.io",
        ] {
            assert!(is_valid(email), "expected valid: {email}");
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for email in [
            "1234",
            "me",
            "1234@",
            "me@",
            "me@.com.my",
            "me@%*.com",
            "me..2002@gmail.com",
            "me.@gmail.com",
            ".me@gmail.com",
            "me@gmail",
            "me@-bad.com",
            "",
            "@example.com",
            "a@b@c.com",
            "me @example.com",
        ] {
            assert!(!is_valid(email), "expected invalid: {email}");
        }
    }
}
