/// Body the wallet returns when the user declines on-device
pub const REJECTED: &str = "Rejected";

/// Classified outcome of a resolved request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Success(String),
    Rejected,
}

pub fn classify(outcome: &str) -> Verdict {
    if outcome == REJECTED {
        Verdict::Rejected
    } else {
        Verdict::Success(outcome.to_string())
    }
}

impl Verdict {
    /// User-facing notice, `label` being "signature" or "hash"
    pub fn notice(&self, label: &str) -> String {
        match self {
            Self::Success(value) => format!("Success, {}: {}", label, value),
            Self::Rejected => REJECTED.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rejected() {
        assert_eq!(classify("Rejected"), Verdict::Rejected);
    }

    #[test]
    fn test_classify_passes_anything_else_through() {
        assert_eq!(classify("0xHASH"), Verdict::Success("0xHASH".to_string()));
        assert_eq!(classify("rejected"), Verdict::Success("rejected".to_string()));
        assert_eq!(classify(""), Verdict::Success(String::new()));
    }

    #[test]
    fn test_notice() {
        assert_eq!(
            classify("0xSIG").notice("signature"),
            "Success, signature: 0xSIG"
        );
        assert_eq!(classify("Rejected").notice("hash"), "Rejected");
    }
}
