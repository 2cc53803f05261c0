pub use anyhow::{Context, Error, Result, anyhow, bail};
pub use reqwest;
pub use serde_json::Value;

pub mod json {
    pub use serde_json::{from_slice, from_str, from_value, json, to_string, to_value, to_vec};
}

/// Collision-resistant, url-safe identifier used as the primary key for
/// every record this service creates.
pub fn create_id() -> String {
    cuid2::create_id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_url_safe() {
        let a = create_id();
        let b = create_id();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
