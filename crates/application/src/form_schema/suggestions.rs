//! Best-effort input helpers shown to applicants. Not part of validation.

const DOMAIN_TYPOS: &[(&str, &str)] = &[
    ("gmial.com", "gmail.com"),
    ("gmai.com", "gmail.com"),
    ("gmail.co", "gmail.com"),
    ("gmail.fr", "gmail.com"),
    ("gnail.com", "gmail.com"),
    ("hotmial.com", "hotmail.com"),
    ("hotmal.com", "hotmail.com"),
    ("hotmail.co", "hotmail.com"),
    ("yaho.com", "yahoo.com"),
    ("yahooo.com", "yahoo.com"),
    ("outlok.com", "outlook.com"),
    ("outlook.co", "outlook.com"),
];

/// Suggests a corrected address when the domain is a known typo.
#[must_use]
pub fn suggest_email_correction(email: &str) -> Option<String> {
    let (local, domain) = email.trim().rsplit_once('@')?;
    if local.is_empty() {
        return None;
    }

    let domain = domain.to_ascii_lowercase();
    DOMAIN_TYPOS
        .iter()
        .find(|(typo, _)| *typo == domain)
        .map(|(_, corrected)| format!("{local}@{corrected}"))
}

/// Strips common phone separators, keeping a leading `+`.
#[must_use]
pub fn normalize_phone(phone: &str) -> String {
    phone
        .trim()
        .chars()
        .enumerate()
        .filter(|(index, character)| {
            character.is_ascii_digit() || (*index == 0 && *character == '+')
        })
        .map(|(_, character)| character)
        .collect()
}
