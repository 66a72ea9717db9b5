//! Extraction engine: pure text classifiers, no state, no I/O.

use std::sync::OnceLock;

use regex::Regex;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid regex")
    })
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:\+7|8)[\s\-()]*(\d{3})[\s\-()]*(\d{3})[\s\-]?(\d{2})[\s\-]?(\d{2})")
            .expect("valid regex")
    })
}

/// All email-looking tokens in `text`, in order of first appearance.
/// Repeated occurrences are repeated in the result; callers may dedupe.
pub fn extract_emails(text: &str) -> Vec<String> {
    email_re()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Russian-style phone numbers (`+7`/`8` prefix, 3+3+2+2 digit groups with
/// optional space/hyphen/parenthesis separators), each normalized to the
/// canonical `+7XXXXXXXXXX` display form.
pub fn extract_phones(text: &str) -> Vec<String> {
    phone_re()
        .captures_iter(text)
        .map(|c| format!("+7{}{}{}{}", &c[1], &c[2], &c[3], &c[4]))
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strength {
    Strong,
    Weak,
}

const PASSWORD_SYMBOLS: &str = "!@#$%^&*()";

/// Strong iff length >= 8 and the password carries an uppercase letter, a
/// lowercase letter, a digit and one of `!@#$%^&*()`. Pure and total.
pub fn password_strength(pwd: &str) -> Strength {
    let long_enough = pwd.chars().count() >= 8;
    let has_upper = pwd.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = pwd.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = pwd.chars().any(|c| c.is_ascii_digit());
    let has_symbol = pwd.chars().any(|c| PASSWORD_SYMBOLS.contains(c));

    if long_enough && has_upper && has_lower && has_digit && has_symbol {
        Strength::Strong
    } else {
        Strength::Weak
    }
}
