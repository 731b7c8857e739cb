//! String formatting utilities.

/// Shortens a hex string for log output: `0x12345678..`.
pub fn short_hex(hex_str: &str) -> String {
	if hex_str.len() <= 10 {
		hex_str.to_string()
	} else {
		format!("{}..", &hex_str[..10])
	}
}

/// Adds "0x" prefix to a hex string if it doesn't already have one.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.to_lowercase().starts_with("0x") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Removes "0x" or "0X" prefix from a hex string if present.
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}
