use rand::{distributions::Alphanumeric, Rng};

/// Generates a `confirmation_code` for a `PAID → CONFIRMED` transition
/// (spec.md §4.4).
pub fn generate_confirmation_code() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();

    format!("TRN-{}", suffix.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_has_the_expected_shape() {
        let code = generate_confirmation_code();
        assert!(code.starts_with("TRN-"));
        assert_eq!(code.len(), "TRN-".len() + 8);
        assert!(code["TRN-".len()..].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn codes_are_not_trivially_repeated() {
        let a = generate_confirmation_code();
        let b = generate_confirmation_code();
        assert_ne!(a, b);
    }
}
