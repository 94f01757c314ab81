// © 2024-2025 ElementalAlchemist and the Dainsleif Mains Development Team
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use twilight_model::util::datetime::{Timestamp, TimestampParseError};
use twilight_util::snowflake::Snowflake;

/// Gets a [Timestamp] object from the ID snowflake.
pub fn timestamp_from_id(id: impl Snowflake) -> Result<Timestamp, TimestampParseError> {
	Timestamp::from_micros(id.timestamp() * 1000)
}
