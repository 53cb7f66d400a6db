//! Serde helpers shared by partial-update bodies.

use serde::{Deserialize, Deserializer};

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
///
/// Pair with `#[serde(default)]` so absent fields fall back to `None`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Patch {
        #[serde(deserialize_with = "nullable")]
        value: Option<Option<i64>>,
    }

    #[test]
    fn test_absent_null_and_present() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.value, None);

        let null: Patch = serde_json::from_str(r#"{"value": null}"#).unwrap();
        assert_eq!(null.value, Some(None));

        let present: Patch = serde_json::from_str(r#"{"value": 4}"#).unwrap();
        assert_eq!(present.value, Some(Some(4)));
    }
}
