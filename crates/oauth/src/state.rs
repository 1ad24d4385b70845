use {
    base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD},
    rand::RngCore,
};

/// Generate a fresh anti-CSRF state value (16 random bytes, URL-safe base64).
pub fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Use the caller's state when given, otherwise generate one.
pub fn state_or_generate(state: Option<&str>) -> String {
    match state {
        Some(state) if !state.is_empty() => state.to_string(),
        _ => generate_state(),
    }
}

/// Compare two state values without short-circuiting on the first mismatch.
pub fn states_match(expected: &str, received: &str) -> bool {
    let (a, b) = (expected.as_bytes(), received.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_state_shape() {
        let state = generate_state();
        assert_eq!(state.len(), 22);
        assert!(
            state
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(state, generate_state());
    }

    #[test]
    fn test_state_or_generate() {
        assert_eq!(state_or_generate(Some("mine")), "mine");
        assert_eq!(state_or_generate(None).len(), 22);
        assert_eq!(state_or_generate(Some("")).len(), 22);
    }

    #[test]
    fn test_states_match() {
        assert!(states_match("abc", "abc"));
        assert!(!states_match("abc", "abd"));
        assert!(!states_match("abc", "abcd"));
        assert!(!states_match("abc", ""));
    }
}
