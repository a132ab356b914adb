//! Aggregate statistics over a conversation list.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDateTime, NaiveTime};
use serde::Serialize;

use super::types::Conversation;

/// Aggregate counts computed over the live conversation list on demand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationStats {
    /// Total conversations.
    pub total: usize,
    /// Conversations created since local midnight.
    pub today: usize,
    /// Conversations created since the start of the current week
    /// (Sunday-based, local midnight).
    pub this_week: usize,
    /// Conversations created since the first of the current month.
    pub this_month: usize,
    /// Rounded mean message count; 0 for an empty list.
    pub avg_messages_per_conversation: u64,
    /// Conversations flagged as favorites.
    pub favorite_count: usize,
}

impl ConversationStats {
    /// Compute stats for `conversations` as of `now` in local time.
    ///
    /// Date boundaries are local: midnight today, midnight of the most
    /// recent Sunday, and midnight of the first of the month.
    #[must_use]
    pub fn calculate(conversations: &[Conversation], now: DateTime<Local>) -> Self {
        let now_local = now.naive_local();
        let today_start = now_local.date().and_time(NaiveTime::MIN);
        let week_start = today_start
            - Duration::days(i64::from(now_local.weekday().num_days_from_sunday()));
        let month_start = now_local
            .date()
            .with_day(1)
            .map_or(today_start, |d| d.and_time(NaiveTime::MIN));

        let created_local = |c: &Conversation| -> NaiveDateTime {
            c.created_at.with_timezone(&Local).naive_local()
        };

        let total = conversations.len();
        let today = conversations
            .iter()
            .filter(|c| created_local(c) >= today_start)
            .count();
        let this_week = conversations
            .iter()
            .filter(|c| created_local(c) >= week_start)
            .count();
        let this_month = conversations
            .iter()
            .filter(|c| created_local(c) >= month_start)
            .count();
        let favorite_count = conversations.iter().filter(|c| c.is_favorite).count();

        let avg_messages_per_conversation = if total == 0 {
            0
        } else {
            let sum: u64 = conversations.iter().map(|c| c.message_count as u64).sum();
            // Round half up, like the UI always displayed it.
            (2 * sum + total as u64) / (2 * total as u64)
        };

        Self {
            total,
            today,
            this_week,
            this_month,
            avg_messages_per_conversation,
            favorite_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::conversations::types::Message;

    fn conversation_created_at(id: &str, created: DateTime<Local>) -> Conversation {
        let mut conversation = Conversation::new(
            id.to_string(),
            None,
            vec![Message::user("hỏi"), Message::assistant("đáp")],
            created.with_timezone(&Utc),
        );
        conversation.created_at = created.with_timezone(&Utc);
        conversation
    }

    // 2025-06-18 is a Wednesday; noon keeps every offset inside one local day.
    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 18, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_list_is_all_zero() {
        let stats = ConversationStats::calculate(&[], fixed_now());
        assert_eq!(stats, ConversationStats::default());
    }

    #[test]
    fn test_date_buckets_follow_local_boundaries() {
        let now = fixed_now();
        let conversations = vec![
            // Two hours ago: today, this week, this month.
            conversation_created_at("a", now - Duration::hours(2)),
            // Three days ago (Sunday noon): inside the Sunday-based week.
            conversation_created_at("b", now - Duration::days(3)),
            // Ten days ago: this month only.
            conversation_created_at("c", now - Duration::days(10)),
            // Forty days ago: total only.
            conversation_created_at("d", now - Duration::days(40)),
        ];

        let stats = ConversationStats::calculate(&conversations, now);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.today, 1);
        assert_eq!(stats.this_week, 2);
        assert_eq!(stats.this_month, 3);
    }

    #[test]
    fn test_average_rounds_half_up() {
        let now = fixed_now();
        let mut one = conversation_created_at("a", now);
        one.messages.truncate(1);
        one.refresh_derived();
        let two = conversation_created_at("b", now);

        // Counts 1 and 2 average to 1.5, displayed as 2.
        let stats = ConversationStats::calculate(&[one, two], now);
        assert_eq!(stats.avg_messages_per_conversation, 2);
    }

    #[test]
    fn test_favorites_are_counted() {
        let now = fixed_now();
        let mut favorite = conversation_created_at("a", now);
        favorite.is_favorite = true;
        let plain = conversation_created_at("b", now);

        let stats = ConversationStats::calculate(&[favorite, plain], now);
        assert_eq!(stats.favorite_count, 1);
    }
}
