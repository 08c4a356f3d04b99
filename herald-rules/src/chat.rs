//! Chat identifier normalization.

use herald_common::ChatId;

const CHANNEL_PREFIX: &str = "-100";

/// Minimum number of digits for a bare id to be treated as a channel id.
const CHANNEL_ID_DIGITS: usize = 10;

/// Restore the `-100` marker on channel and supergroup ids.
///
/// Ids copied out of other clients often lose the marker, leaving either a
/// negative or a positive bare channel id. Any id with at least ten digits
/// that does not already start with `-100` gets the prefix; shorter ids
/// (private chats, basic groups) are returned unchanged.
#[must_use]
pub fn normalize_chat_id(chat_id: ChatId) -> ChatId {
    if chat_id.to_string().starts_with(CHANNEL_PREFIX) {
        return chat_id;
    }

    let digits = chat_id.unsigned_abs().to_string();
    if digits.len() < CHANNEL_ID_DIGITS {
        return chat_id;
    }

    format!("{CHANNEL_PREFIX}{digits}")
        .parse()
        .unwrap_or(chat_id)
}
