use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

// Fixed-width UTC so stored timestamps sort lexically in time order.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
);

pub fn now_rfc3339() -> String {
    format_timestamp(OffsetDateTime::now_utc())
}

pub fn format_timestamp(at: OffsetDateTime) -> String {
    let at = at.to_offset(time::UtcOffset::UTC);
    at.format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// Reads an SQLite integer column used as a boolean flag.
pub fn flag(value: i64) -> bool {
    value != 0
}

/// Nullable TEXT column.
pub fn optional_text(value: libsql::Value) -> Option<String> {
    match value {
        libsql::Value::Text(text) => Some(text),
        _ => None,
    }
}
