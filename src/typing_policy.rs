use crate::session::SessionConfig;

/// What a raw input value means for the word being typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// the last word, typed exactly
    Finish,
    /// a non-final word followed by exactly one space
    Advance,
    /// anything else, right or wrong
    Partial,
}

pub fn classify_input(target: Option<&str>, is_final: bool, raw: &str) -> InputKind {
    let Some(target) = target else {
        return InputKind::Partial;
    };

    if is_final {
        if raw == target {
            return InputKind::Finish;
        }
    } else if raw.strip_suffix(' ') == Some(target) {
        return InputKind::Advance;
    }

    InputKind::Partial
}

/// Hard mode forbids any wrong character in the input box.
pub fn violates_hard_mode(config: &SessionConfig, mismatch_len: usize) -> bool {
    config.hard_mode && mismatch_len > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_final_word_needs_one_trailing_space() {
        assert_eq!(
            classify_input(Some("the"), false, "the "),
            InputKind::Advance
        );
        assert_eq!(classify_input(Some("the"), false, "the"), InputKind::Partial);
        assert_eq!(
            classify_input(Some("the"), false, "the  "),
            InputKind::Partial
        );
        assert_eq!(
            classify_input(Some("the"), false, "thx "),
            InputKind::Partial
        );
    }

    #[test]
    fn final_word_has_no_separator() {
        assert_eq!(classify_input(Some("b"), true, "b"), InputKind::Finish);
        assert_eq!(classify_input(Some("b"), true, "b "), InputKind::Partial);
    }

    #[test]
    fn missing_target_is_always_partial() {
        assert_eq!(classify_input(None, true, ""), InputKind::Partial);
        assert_eq!(classify_input(None, false, "x "), InputKind::Partial);
    }

    #[test]
    fn hard_mode_only_fires_when_enabled() {
        let soft = SessionConfig { hard_mode: false };
        let hard = SessionConfig { hard_mode: true };
        assert!(!violates_hard_mode(&soft, 2));
        assert!(!violates_hard_mode(&hard, 0));
        assert!(violates_hard_mode(&hard, 1));
    }
}
