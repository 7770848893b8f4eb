//! Serde helpers for snapshot timestamps: RFC 3339 instants and `YYYY-MM-DD` dates.

use serde::{Deserialize, Deserializer, Serializer};
use time::{
	Date, OffsetDateTime,
	format_description::{BorrowedFormatItem, well_known::Rfc3339},
	macros::format_description,
};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_str(&value.format(&Rfc3339).map_err(serde::ser::Error::custom)?)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
	D: Deserializer<'de>,
{
	OffsetDateTime::parse(&String::deserialize(deserializer)?, &Rfc3339)
		.map_err(serde::de::Error::custom)
}

pub mod date {
	use super::*;

	pub fn serialize<S>(value: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let Some(value) = value else {
			return serializer.serialize_none();
		};

		serializer.serialize_str(&value.format(DATE_FORMAT).map_err(serde::ser::Error::custom)?)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
	where
		D: Deserializer<'de>,
	{
		Option::<String>::deserialize(deserializer)?
			.map(|raw| Date::parse(&raw, DATE_FORMAT).map_err(serde::de::Error::custom))
			.transpose()
	}
}
