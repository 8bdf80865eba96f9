//! Error handling utilities.
//!
//! Error enums are declared with `#[tally_error]`, which adds the derives, a
//! `Generic { message }` variant and `From<anyhow::Error>`. Code that parses untrusted
//! persisted data uses `anyhow` contexts internally and flattens the chain for logging
//! with [`AnyhowErrorExt`].

pub use tally_macros::tally_error;

/// Re-export anyhow for convenience
pub use anyhow;

/// Flattens an `anyhow` error chain into a single line.
pub trait AnyhowErrorExt {
    /// Convert an anyhow error to a string, preserving the error chain
    fn to_generic_message(&self) -> String;

    /// Same as [`AnyhowErrorExt::to_generic_message`] with `prefix: ` in front
    fn to_generic_message_with_prefix(&self, prefix: &str) -> String;
}

impl AnyhowErrorExt for anyhow::Error {
    fn to_generic_message(&self) -> String {
        let mut message = self.to_string();

        let chain: Vec<String> = self.chain().skip(1).map(ToString::to_string).collect();
        if !chain.is_empty() {
            message.push_str(" (caused by: ");
            message.push_str(&chain.join(" -> "));
            message.push(')');
        }

        message
    }

    fn to_generic_message_with_prefix(&self, prefix: &str) -> String {
        format!("{prefix}: {}", self.to_generic_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_message_keeps_chain_order() {
        use anyhow::Context;

        let error = Err::<(), _>(anyhow::anyhow!("expected value at line 1 column 1"))
            .context("legacy blob is not JSON")
            .context("remote config migration")
            .unwrap_err();

        assert_eq!(
            error.to_generic_message(),
            "remote config migration (caused by: legacy blob is not JSON -> expected value at line 1 column 1)"
        );
    }

    #[test]
    fn test_generic_message_without_chain() {
        let error = anyhow::anyhow!("queue is not a JSON array");
        assert_eq!(
            error.to_generic_message_with_prefix("storage.queue"),
            "storage.queue: queue is not a JSON array"
        );
    }
}
