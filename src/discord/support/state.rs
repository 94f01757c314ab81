// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::components::{
	CLOSE_TICKET_BUTTON, REOPEN_TICKET_BUTTON, button_custom_ids, closed_ticket_row, open_ticket_row,
};
use crate::discord::errors::UserError;
use crate::discord::registry::CustomIdRouting;
use twilight_model::channel::message::component::Component;

/// Whether a ticket is open, read from the buttons on its ticket message.
///
/// Tickets aren't stored anywhere, so the message is the source of truth: open tickets carry a close button and
/// closed tickets carry a reopen button.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TicketState {
	Open,
	Closed,
}

impl TicketState {
	/// Reads the state from a message's components. Returns `None` for messages that aren't ticket messages.
	pub fn from_components(components: &[Component], routing: &CustomIdRouting) -> Option<Self> {
		button_custom_ids(components).find_map(|custom_id| match routing.route_key(custom_id) {
			CLOSE_TICKET_BUTTON => Some(Self::Open),
			REOPEN_TICKET_BUTTON => Some(Self::Closed),
			_ => None,
		})
	}

	pub fn close(self) -> Result<Self, UserError> {
		match self {
			Self::Open => Ok(Self::Closed),
			Self::Closed => Err(UserError::TicketAlreadyClosed),
		}
	}

	pub fn reopen(self) -> Result<Self, UserError> {
		match self {
			Self::Closed => Ok(Self::Open),
			Self::Open => Err(UserError::TicketAlreadyOpen),
		}
	}

	/// The component rows a ticket message shows in this state.
	pub fn components(self) -> Vec<Component> {
		match self {
			Self::Open => vec![open_ticket_row()],
			Self::Closed => vec![closed_ticket_row()],
		}
	}
}
