use url::Url;

/// What a decoded payload looks like.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde_support", serde(rename_all = "lowercase"))]
pub enum PayloadKind {
    Empty,
    Url,
    Email,
    Phone,
    Wifi,
    VCard,
    Text,
}

/// Result of [classify].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Classification {
    /// `false` only for blank payloads
    pub valid: bool,
    pub kind: PayloadKind,
    /// Trimmed payload; URLs are normalised
    pub sanitized: String,
}

/// Sniff the kind of a scanned payload.
///
/// Checks run in order and the first match wins: http(s) URL, email address, phone number,
/// WiFi network, vCard, and finally plain text.
///
/// ```rust
/// use qr_studio::{classify, PayloadKind};
///
/// assert_eq!(classify("https://example.com").kind, PayloadKind::Url);
/// assert_eq!(classify("+1 (555) 010-9999").kind, PayloadKind::Phone);
/// assert_eq!(classify("  hello ").sanitized, "hello");
/// ```
pub fn classify(payload: &str) -> Classification {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Classification {
            valid: false,
            kind: PayloadKind::Empty,
            sanitized: String::new(),
        };
    }

    if let Ok(url) = Url::parse(trimmed) {
        if matches!(url.scheme(), "http" | "https") {
            return Classification {
                valid: true,
                kind: PayloadKind::Url,
                sanitized: url.to_string(),
            };
        }
    }

    let kind = if is_email(trimmed) {
        PayloadKind::Email
    } else if is_phone(trimmed) {
        PayloadKind::Phone
    } else if trimmed.starts_with("WIFI:") {
        PayloadKind::Wifi
    } else if trimmed.starts_with("BEGIN:VCARD") && trimmed.ends_with("END:VCARD") {
        PayloadKind::VCard
    } else {
        PayloadKind::Text
    };
    Classification {
        valid: true,
        kind,
        sanitized: trimmed.to_string(),
    }
}

fn is_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // a dot with something on both sides
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

fn is_phone(s: &str) -> bool {
    let digits: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect();
    let digits = digits.strip_prefix('+').unwrap_or(&digits);
    match digits.as_bytes() {
        [first, rest @ ..] => {
            (b'1'..=b'9').contains(first) && rest.len() <= 15 && rest.iter().all(u8::is_ascii_digit)
        }
        [] => false,
    }
}
