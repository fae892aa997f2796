use std::collections::HashMap;

use super::format::PendingItem;

/// Pending items per member, remembering the order members first appeared in.
#[derive(Debug, Default, Clone)]
pub struct PendingDigests {
    order: Vec<String>,
    items: HashMap<String, Vec<PendingItem>>,
}

impl PendingDigests {
    pub fn push(&mut self, member_id: &str, item: PendingItem) {
        match self.items.get_mut(member_id) {
            Some(list) => list.push(item),
            None => {
                self.order.push(member_id.to_string());
                self.items.insert(member_id.to_string(), vec![item]);
            }
        }
    }

    #[allow(dead_code)]
    pub fn get(&self, member_id: &str) -> Option<&[PendingItem]> {
        self.items.get(member_id).map(Vec::as_slice)
    }

    /// Members in first-appearance order with their items
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PendingItem])> {
        self.order.iter().filter_map(|member_id| {
            self.items
                .get(member_id)
                .map(|list| (member_id.as_str(), list.as_slice()))
        })
    }

    /// Number of members with at least one item
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn total_items(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }
}

/// The message a member receives: the greeting, then every item, blank-line separated
pub fn compose(base_message: &str, items: &[PendingItem]) -> String {
    let body = items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{}\n\n{}", base_message, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(channel: &str, text: &str) -> PendingItem {
        PendingItem {
            channel_name: channel.to_string(),
            preview: text.to_string(),
            permalink: Some(format!("https://x/{channel}")),
        }
    }

    #[test]
    fn test_first_appearance_order_is_kept() {
        let mut digests = PendingDigests::default();
        digests.push("U2", item("a", "1"));
        digests.push("U1", item("a", "1"));
        digests.push("U2", item("b", "2"));
        digests.push("U3", item("b", "2"));

        let members: Vec<&str> = digests.iter().map(|(id, _)| id).collect();
        assert_eq!(members, vec!["U2", "U1", "U3"]);
        assert_eq!(digests.len(), 3);
        assert_eq!(digests.total_items(), 4);

        let u2: Vec<&str> = digests
            .get("U2")
            .unwrap()
            .iter()
            .map(|i| i.channel_name.as_str())
            .collect();
        assert_eq!(u2, vec!["a", "b"]);
    }

    #[test]
    fn test_compose_joins_with_blank_lines() {
        let text = compose("Hi!", &[item("a", "one"), item("b", "two")]);
        assert_eq!(
            text,
            "Hi!\n\n• [#a] *one*\n   👉 https://x/a\n\n• [#b] *two*\n   👉 https://x/b"
        );
    }

    #[test]
    fn test_empty() {
        let digests = PendingDigests::default();
        assert!(digests.is_empty());
        assert!(digests.get("U1").is_none());
        assert_eq!(digests.iter().count(), 0);
    }
}
