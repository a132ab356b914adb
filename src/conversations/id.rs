//! Conversation id generation.
//!
//! Ids embed the creation time plus a process-wide sequence number and a
//! random suffix, so ids stay pairwise distinct even for rapid successive
//! calls inside the same millisecond.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use rand::Rng;

/// Length of the random suffix.
const SUFFIX_LEN: usize = 6;

/// Alphabet for the random suffix.
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generate a fresh conversation id: `conv_<millis>_<seq><suffix>`.
#[must_use]
pub fn next_conversation_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..SUFFIX_ALPHABET.len());
            SUFFIX_ALPHABET[idx] as char
        })
        .collect();
    format!("conv_{millis}_{seq:x}{suffix}")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_ids_have_the_expected_prefix() {
        let id = next_conversation_id();
        assert!(id.starts_with("conv_"));
    }

    #[test]
    fn test_rapid_ids_are_pairwise_distinct() {
        // Far more calls than fit in one millisecond tick.
        let ids: HashSet<String> = (0..10_000).map(|_| next_conversation_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }
}
