pub mod embedding;

use color_eyre::{Result, eyre};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName};
use serde_json::{Map, Value};

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	if !api_key.is_empty() {
		headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
	}

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(eyre::eyre!("Default header values must be strings."));
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_api_key_sends_no_authorization() {
		let mut defaults = Map::new();

		defaults.insert("x-tenant".to_string(), Value::from("atelier"));

		let headers = auth_headers("", &defaults).expect("headers failed");

		assert!(headers.get(AUTHORIZATION).is_none());
		assert_eq!(headers.get("x-tenant").and_then(|v| v.to_str().ok()), Some("atelier"));
	}

	#[test]
	fn non_string_default_headers_are_rejected() {
		let mut defaults = Map::new();

		defaults.insert("x-retries".to_string(), Value::from(3));

		assert!(auth_headers("key", &defaults).is_err());
	}
}
