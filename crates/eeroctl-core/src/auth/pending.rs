use chrono::{DateTime, Duration, Utc};

/// Verification codes are only useful for a short while after being sent.
const CODE_VALIDITY_MINUTES: i64 = 15;

/// A login that has been started but not yet verified.
///
/// Kept in memory only; dropped once verification succeeds or the process exits.
#[derive(Debug, Clone)]
pub struct PendingLogin {
    pub identifier: String,
    pub started_at: DateTime<Utc>,
}

impl PendingLogin {
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            started_at: Utc::now(),
        }
    }

    /// Whether the code sent for this login has likely expired
    pub fn is_stale(&self) -> bool {
        Utc::now() > self.started_at + Duration::minutes(CODE_VALIDITY_MINUTES)
    }

    /// Identifier with all but the last four characters masked, for logs
    pub fn masked_identifier(&self) -> String {
        let chars: Vec<char> = self.identifier.chars().collect();
        let keep = chars.len().min(4);
        let masked = chars.len() - keep;
        let tail: String = chars[masked..].iter().collect();
        format!("{}{}", "*".repeat(masked), tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_identifier() {
        assert_eq!(PendingLogin::new("+15551234567").masked_identifier(), "********4567");
        assert_eq!(PendingLogin::new("123").masked_identifier(), "123");
    }

    #[test]
    fn test_is_stale() {
        let fresh = PendingLogin::new("+15551234567");
        assert!(!fresh.is_stale());

        let mut old = PendingLogin::new("+15551234567");
        old.started_at = Utc::now() - Duration::minutes(16);
        assert!(old.is_stale());
    }
}
