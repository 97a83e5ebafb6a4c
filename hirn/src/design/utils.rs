use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
	static ref VALID_ID_REGEX: Regex = Regex::new(r"^[a-zA-Z_][0-9a-zA-Z_]*$").unwrap();
}

/// Checks if given name is a plain identifier
pub fn is_name_valid(name: &str) -> bool {
	VALID_ID_REGEX.is_match(name)
}

/// Returns the name unchanged if it is a plain identifier,
/// otherwise as an escaped identifier
pub fn escape_name(name: &str) -> String {
	if is_name_valid(name) {
		name.into()
	}
	else {
		format!("\\{} ", name)
	}
}

/// Strips module path and generic arguments from a type name
pub fn short_type_name(full: &str) -> &str {
	let base = full.split('<').next().unwrap_or(full);
	base.rsplit("::").next().unwrap_or(base)
}
