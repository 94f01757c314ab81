// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use twilight_model::guild::PartialMember;
use twilight_model::user::User;

/// Gets the name a user shows up as in a guild: the server nickname, then the global display name, then the username.
pub fn member_display_name(member: Option<&PartialMember>, user: &User) -> String {
	display_name(member.and_then(|member| member.nick.as_deref()), user)
}

fn display_name(nick: Option<&str>, user: &User) -> String {
	nick.or(user.global_name.as_deref()).unwrap_or(&user.name).to_string()
}
