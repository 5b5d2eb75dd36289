use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical address string at lot-number granularity.
///
/// Two listings with equal keys are treated as the same building for
/// clustering and geocode caching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParcelKey(String);

impl ParcelKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ParcelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParcelKey {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Derives the parcel key from a free-text address.
///
/// Takes the address up to and including the first lot-number token (a run of
/// digits, optionally `digits-digits`) and trims surrounding whitespace. When
/// no such token exists the trimmed whole string is the key. Pure and total:
/// every input maps to exactly one key, empty input to an empty key.
#[must_use]
pub fn parcel_key(address: &str) -> ParcelKey {
    let trimmed = address.trim();
    let bytes = trimmed.as_bytes();

    let mut index = 0;
    while index < bytes.len() {
        if bytes[index].is_ascii_digit() {
            let mut end = index;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            if end < bytes.len()
                && bytes[end] == b'-'
                && bytes.get(end + 1).is_some_and(u8::is_ascii_digit)
            {
                end += 1;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
            }
            // `end` sits after an ASCII digit, so the slice is a char boundary.
            return ParcelKey(trimmed[..end].trim_end().to_owned());
        }
        index += 1;
    }

    ParcelKey(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::parcel_key;

    #[test]
    fn truncates_at_first_lot_number() {
        assert_eq!(parcel_key("천호동 166-82").as_str(), "천호동 166-82");
        assert_eq!(
            parcel_key("천호동 166-82 현대빌라 201호").as_str(),
            "천호동 166-82"
        );
        assert_eq!(parcel_key("성내동 55-3 2층").as_str(), "성내동 55-3");
    }

    #[test]
    fn plain_lot_number_without_dash() {
        assert_eq!(parcel_key("둔촌동 530 주공아파트").as_str(), "둔촌동 530");
    }

    #[test]
    fn dash_without_following_digit_is_not_extended() {
        assert_eq!(parcel_key("암사동 12- 상가").as_str(), "암사동 12");
    }

    #[test]
    fn no_digits_falls_back_to_trimmed_whole_string() {
        assert_eq!(parcel_key("  길동 능골마을  ").as_str(), "길동 능골마을");
    }

    #[test]
    fn empty_and_blank_inputs_yield_empty_key() {
        assert!(parcel_key("").is_empty());
        assert!(parcel_key("   ").is_empty());
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(parcel_key("  천호동 166-82  ").as_str(), "천호동 166-82");
    }
}
