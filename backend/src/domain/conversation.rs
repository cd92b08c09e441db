//! Conversation identifiers.
//!
//! Direct conversations are keyed `user{min}-user{max}`. Conversations about a
//! record use a `ticket-{id}`, `demande-{id}` or `client-{id}` prefix.

/// What a conversation identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationScope {
    /// Two users talking directly.
    Direct { low: i32, high: i32 },
    Ticket(i32),
    Demande(i32),
    Client(i32),
    /// Free-form identifiers carry no derivable context.
    Other,
}

impl ConversationScope {
    /// Interpret a conversation identifier.
    ///
    /// # Examples
    /// ```
    /// use fieldops::domain::ConversationScope;
    ///
    /// assert_eq!(
    ///     ConversationScope::parse("user7-user3"),
    ///     ConversationScope::Direct { low: 3, high: 7 }
    /// );
    /// assert_eq!(ConversationScope::parse("ticket-12"), ConversationScope::Ticket(12));
    /// ```
    pub fn parse(conversation_id: &str) -> Self {
        let trimmed = conversation_id.trim();
        if let Some((a, b)) = parse_direct(trimmed) {
            return Self::Direct {
                low: a.min(b),
                high: a.max(b),
            };
        }
        let prefixed = |prefix: &str| {
            trimmed
                .strip_prefix(prefix)
                .and_then(|rest| rest.parse::<i32>().ok())
        };
        if let Some(id) = prefixed("ticket-") {
            Self::Ticket(id)
        } else if let Some(id) = prefixed("demande-") {
            Self::Demande(id)
        } else if let Some(id) = prefixed("client-") {
            Self::Client(id)
        } else {
            Self::Other
        }
    }

    /// The other participant of a direct conversation, seen from `sender`.
    pub fn counterpart(self, sender: i32) -> Option<i32> {
        match self {
            Self::Direct { low, high } if low == sender => Some(high),
            Self::Direct { low, high } if high == sender => Some(low),
            _ => None,
        }
    }

    /// Whether `user_id` is one of the two direct participants.
    pub fn involves(self, user_id: i32) -> bool {
        matches!(self, Self::Direct { low, high } if low == user_id || high == user_id)
    }
}

fn parse_direct(raw: &str) -> Option<(i32, i32)> {
    let (left, right) = raw.split_once('-')?;
    let a = left.strip_prefix("user")?.parse().ok()?;
    let b = right.strip_prefix("user")?.parse().ok()?;
    Some((a, b))
}

/// Canonical identifier of the direct conversation between two users.
///
/// The key is order independent.
pub fn direct_conversation_id(a: i32, b: i32) -> String {
    format!("user{}-user{}", a.min(b), a.max(b))
}
