/// Validate a username: 3-50 chars, alphanumeric, dot and underscore only.
pub fn validate_username(username: &str) -> Option<String> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Some("Username is required".to_string());
    }
    if trimmed.len() < 3 {
        return Some("Username must be at least 3 characters".to_string());
    }
    if trimmed.len() > 50 {
        return Some("Username must be at most 50 characters".to_string());
    }
    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
        return Some("Username may only contain letters, numbers, dots and underscores".to_string());
    }
    None
}

/// Validate an email: one '@' with a dotted domain, max 254 chars.
pub fn validate_email(email: &str) -> Option<String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Some("Email is required".to_string());
    }
    if trimmed.len() > 254 {
        return Some("Email must be at most 254 characters".to_string());
    }
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Some("Email must be a valid address".to_string());
    }
    None
}

/// Validate a password: min 8 chars.
pub fn validate_password(password: &str) -> Option<String> {
    if password.is_empty() {
        return Some("Password is required".to_string());
    }
    if password.len() < 8 {
        return Some("Password must be at least 8 characters".to_string());
    }
    None
}

/// Validate a required text field with a max length.
pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    if trimmed.chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Validate a required text field that must fall in `min..=max` characters.
pub fn validate_length(value: &str, field_name: &str, min: usize, max: usize) -> Option<String> {
    let len = value.trim().chars().count();
    if len < min {
        return Some(format!("{field_name} must be at least {min} characters"));
    }
    if len > max {
        return Some(format!("{field_name} must be at most {max} characters"));
    }
    None
}

/// Validate an optional text field with a max length (empty is OK).
pub fn validate_optional(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if !trimmed.is_empty() && trimmed.chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Validate an optional phone number: digits with an optional leading '+', 7-15 digits.
pub fn validate_phone(phone: &str) -> Option<String> {
    let trimmed = phone.trim();
    if trimmed.is_empty() {
        return None;
    }
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if !digits.chars().all(|c| c.is_ascii_digit()) || !(7..=15).contains(&digits.len()) {
        return Some("Phone number must contain 7 to 15 digits".to_string());
    }
    None
}

/// Validate a `#rrggbb` colour.
pub fn validate_hex_color(color: &str) -> Option<String> {
    let c = color.trim();
    let ok = c.len() == 7
        && c.starts_with('#')
        && c[1..].chars().all(|ch| ch.is_ascii_hexdigit());
    if ok {
        None
    } else {
        Some("Colour must be in #rrggbb form".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames() {
        assert!(validate_username("jane_doe.2").is_none());
        assert!(validate_username("ab").is_some());
        assert!(validate_username("jane doe").is_some());
        assert!(validate_username("   ").is_some());
    }

    #[test]
    fn emails() {
        assert!(validate_email("jane@x.com").is_none());
        assert!(validate_email("jane@x").is_some());
        assert!(validate_email("@x.com").is_some());
        assert!(validate_email("a@b@c.com").is_some());
        assert!(validate_email("jane@.com").is_some());
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        assert!(validate_length("éééééééééé", "Message", 10, 20).is_none());
        assert!(validate_length("short", "Message", 10, 20).is_some());
    }

    #[test]
    fn phones() {
        assert!(validate_phone("").is_none());
        assert!(validate_phone("+233201234567").is_none());
        assert!(validate_phone("12-34").is_some());
    }

    #[test]
    fn colours() {
        assert!(validate_hex_color("#1d4ed8").is_none());
        assert!(validate_hex_color("1d4ed8").is_some());
        assert!(validate_hex_color("#zzzzzz").is_some());
    }
}
