use std::collections::HashSet;

use crate::platform::Message;

/// Messages whose text contains `marker` verbatim (case-sensitive), in input order.
/// An empty marker matches everything.
pub fn tagged<'a>(messages: &'a [Message], marker: &str) -> Vec<&'a Message> {
    messages
        .iter()
        .filter(|msg| msg.body().contains(marker))
        .collect()
}

/// Everyone who left any reaction on `message`
pub fn reacted_users(message: &Message) -> HashSet<&str> {
    message
        .reactions
        .iter()
        .flat_map(|reaction| reaction.users.iter().map(String::as_str))
        .collect()
}
