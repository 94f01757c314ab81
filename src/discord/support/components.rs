// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::model::DEFAULT_SUPPORT_EMOJI;
use twilight_model::channel::message::EmojiReactionType;
use twilight_model::channel::message::component::{ActionRow, Button, ButtonStyle, Component};
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, MessageMarker};

pub const OPEN_TICKET_BUTTON: &str = "ticket";
pub const CLOSE_TICKET_BUTTON: &str = "close";
pub const REOPEN_TICKET_BUTTON: &str = "reopen";

/// Parses a unicode emoji or a custom emoji in Discord's `<:name:id>` / `<a:name:id>` format.
pub fn parse_emoji(input: &str) -> Option<EmojiReactionType> {
	let input = input.trim();
	if let Some(inner) = input.strip_prefix('<').and_then(|inner| inner.strip_suffix('>')) {
		let (animated, rest) = match inner.strip_prefix("a:") {
			Some(rest) => (true, rest),
			None => (false, inner.strip_prefix(':')?),
		};
		let (name, id) = rest.split_once(':')?;
		if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
			return None;
		}
		let id = id.parse::<u64>().ok().and_then(Id::new_checked)?;
		return Some(EmojiReactionType::Custom {
			animated,
			id,
			name: Some(name.to_string()),
		});
	}

	emojis::get(input).map(|_| EmojiReactionType::Unicode {
		name: input.to_string(),
	})
}

/// The row under the support message. A stored emoji that no longer parses falls back to the default.
pub fn new_ticket_row(emoji: &str) -> Component {
	let emoji = parse_emoji(emoji).or_else(|| parse_emoji(DEFAULT_SUPPORT_EMOJI));
	button_row(Button {
		custom_id: Some(String::from(OPEN_TICKET_BUTTON)),
		disabled: false,
		emoji,
		label: Some(String::from("Open Ticket")),
		style: ButtonStyle::Primary,
		url: None,
		sku_id: None,
	})
}

pub fn open_ticket_row() -> Component {
	button_row(Button {
		custom_id: Some(String::from(CLOSE_TICKET_BUTTON)),
		disabled: false,
		emoji: parse_emoji("🔒"),
		label: Some(String::from("Close Ticket")),
		style: ButtonStyle::Danger,
		url: None,
		sku_id: None,
	})
}

pub fn closed_ticket_row() -> Component {
	button_row(Button {
		custom_id: Some(String::from(REOPEN_TICKET_BUTTON)),
		disabled: false,
		emoji: parse_emoji("🔓"),
		label: Some(String::from("Reopen Ticket")),
		style: ButtonStyle::Secondary,
		url: None,
		sku_id: None,
	})
}

/// A link to a message posted somewhere other than where the command was used.
pub fn message_link_row(
	guild_id: Id<GuildMarker>,
	channel_id: Id<ChannelMarker>,
	message_id: Id<MessageMarker>,
) -> Component {
	button_row(Button {
		custom_id: None,
		disabled: false,
		emoji: None,
		label: Some(String::from("Go to Message")),
		style: ButtonStyle::Link,
		url: Some(format!(
			"https://discord.com/channels/{}/{}/{}",
			guild_id, channel_id, message_id
		)),
		sku_id: None,
	})
}

fn button_row(button: Button) -> Component {
	Component::ActionRow(ActionRow {
		components: vec![Component::Button(button)],
	})
}

/// Gets the custom IDs of every button in a message's component rows.
pub fn button_custom_ids(components: &[Component]) -> impl Iterator<Item = &str> {
	components
		.iter()
		.filter_map(|component| match component {
			Component::ActionRow(row) => Some(row.components.iter()),
			_ => None,
		})
		.flatten()
		.filter_map(|component| match component {
			Component::Button(button) => button.custom_id.as_deref(),
			_ => None,
		})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_unicode_emoji() {
		assert_eq!(
			parse_emoji("🎫"),
			Some(EmojiReactionType::Unicode {
				name: String::from("🎫")
			})
		);
		assert_eq!(
			parse_emoji(" 🛠️ "),
			Some(EmojiReactionType::Unicode {
				name: String::from("🛠️")
			})
		);
		assert!(parse_emoji("1️⃣").is_some());
		assert!(parse_emoji("🇳🇿").is_some());
		assert!(parse_emoji("👨‍👩‍👧").is_some());
	}

	#[test]
	fn parses_custom_emoji() {
		assert_eq!(
			parse_emoji("<:ticket:123456789012345678>"),
			Some(EmojiReactionType::Custom {
				animated: false,
				id: Id::new(123456789012345678),
				name: Some(String::from("ticket")),
			})
		);
		assert_eq!(
			parse_emoji("<a:spin_ticket:42>"),
			Some(EmojiReactionType::Custom {
				animated: true,
				id: Id::new(42),
				name: Some(String::from("spin_ticket")),
			})
		);
	}

	#[test]
	fn rejects_non_emoji() {
		let inputs = [
			"",
			"ticket",
			":ticket:",
			"<:ticket:abc>",
			"<:ticket:0>",
			"<ticket:1>",
			"é",
			"🎫 🎫",
			"<::1>",
			"→",
			"★",
			"✓",
		];
		for input in inputs {
			assert_eq!(parse_emoji(input), None, "{:?} should not parse", input);
		}
	}

	#[test]
	fn rows_carry_their_custom_ids() {
		let rows = [new_ticket_row("not an emoji"), open_ticket_row()];
		let ids: Vec<&str> = button_custom_ids(&rows).collect();
		assert_eq!(ids, vec![OPEN_TICKET_BUTTON, CLOSE_TICKET_BUTTON]);

		let link = [message_link_row(Id::new(1), Id::new(2), Id::new(3))];
		assert_eq!(button_custom_ids(&link).count(), 0);
	}
}
