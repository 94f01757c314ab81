// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use miette::bail;
use twilight_model::application::interaction::modal::ModalInteractionData;
use twilight_model::channel::message::component::{ActionRow, Component, TextInput, TextInputStyle};

pub const TICKET_MODAL: &str = "ticket";
pub const EMBED_MODAL: &str = "embed";

pub const MAX_SUBJECT_LENGTH: u16 = 256;
pub const MAX_BODY_LENGTH: u16 = 512;
pub const MAX_EMBED_TITLE_LENGTH: u16 = 256;
pub const MAX_EMBED_DESCRIPTION_LENGTH: u16 = 2048;

/// Discord's limit on thread names
const MAX_THREAD_NAME_CHARS: usize = 100;

/// What a user typed into the ticket modal
#[derive(Debug, Eq, PartialEq)]
pub struct TicketSubmission {
	pub subject: String,
	pub body: String,
}

impl TicketSubmission {
	pub fn from_modal(modal_data: &ModalInteractionData) -> miette::Result<Self> {
		let (Some(subject), Some(body)) = (modal_value(modal_data, "subject"), modal_value(modal_data, "body")) else {
			bail!("Ticket modal submitted without its fields: {:?}", modal_data);
		};
		Ok(Self {
			subject: subject.to_string(),
			body: body.to_string(),
		})
	}

	/// The subject, cut down to fit a thread name.
	pub fn thread_name(&self) -> String {
		self.subject.trim().chars().take(MAX_THREAD_NAME_CHARS).collect()
	}
}

/// New text for the support message embed
#[derive(Debug, Eq, PartialEq)]
pub struct EmbedSubmission {
	pub title: String,
	pub description: String,
}

impl EmbedSubmission {
	pub fn from_modal(modal_data: &ModalInteractionData) -> miette::Result<Self> {
		let (Some(title), Some(description)) =
			(modal_value(modal_data, "title"), modal_value(modal_data, "description"))
		else {
			bail!("Embed modal submitted without its fields: {:?}", modal_data);
		};
		Ok(Self {
			title: title.to_string(),
			description: description.to_string(),
		})
	}
}

fn modal_value<'a>(modal_data: &'a ModalInteractionData, custom_id: &str) -> Option<&'a str> {
	modal_data
		.components
		.iter()
		.flat_map(|row| row.components.iter())
		.find(|component| component.custom_id == custom_id)
		.and_then(|component| component.value.as_deref())
}

pub fn ticket_modal_components() -> Vec<Component> {
	let subject = TextInput {
		custom_id: String::from("subject"),
		label: String::from("Subject"),
		max_length: Some(MAX_SUBJECT_LENGTH),
		min_length: None,
		placeholder: Some(String::from("What can we help you with?")),
		required: Some(true),
		style: TextInputStyle::Short,
		value: None,
	};
	let body = TextInput {
		custom_id: String::from("body"),
		label: String::from("Details"),
		max_length: Some(MAX_BODY_LENGTH),
		min_length: None,
		placeholder: Some(String::from("Describe your question")),
		required: Some(true),
		style: TextInputStyle::Paragraph,
		value: None,
	};
	vec![text_input_row(subject), text_input_row(body)]
}

/// The embed editing form, pre-filled with the current text.
pub fn embed_modal_components(title: &str, description: &str) -> Vec<Component> {
	let title = TextInput {
		custom_id: String::from("title"),
		label: String::from("Embed Title"),
		max_length: Some(MAX_EMBED_TITLE_LENGTH),
		min_length: None,
		placeholder: Some(String::from("Title for the support embed")),
		required: Some(true),
		style: TextInputStyle::Short,
		value: Some(title.to_string()),
	};
	let description = TextInput {
		custom_id: String::from("description"),
		label: String::from("Embed Description"),
		max_length: Some(MAX_EMBED_DESCRIPTION_LENGTH),
		min_length: None,
		placeholder: Some(String::from("Description for the support embed")),
		required: Some(true),
		style: TextInputStyle::Paragraph,
		value: Some(description.to_string()),
	};
	vec![text_input_row(title), text_input_row(description)]
}

fn text_input_row(input: TextInput) -> Component {
	Component::ActionRow(ActionRow {
		components: vec![Component::TextInput(input)],
	})
}
