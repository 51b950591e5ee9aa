use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

/// Serializes Duration as whole seconds
pub fn serialize_secs<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    duration.as_secs().serialize(serializer)
}

/// Deserializes Duration from whole seconds
pub fn deserialize_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    Ok(crate::util::secs_to_duration(secs))
}

/// Serializes Duration as whole milliseconds
pub fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    crate::util::duration_to_millis(*duration).serialize(serializer)
}

/// Deserializes Duration from whole milliseconds
pub fn deserialize_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = u64::deserialize(deserializer)?;
    Ok(Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Test {
        #[serde(serialize_with = "serialize_secs")]
        #[serde(deserialize_with = "deserialize_secs")]
        timeout: Duration,
        #[serde(serialize_with = "serialize_millis")]
        #[serde(deserialize_with = "deserialize_millis")]
        poll: Duration,
    }

    #[test]
    fn test_duration_serialization() {
        let original = Test {
            timeout: Duration::from_secs(5),
            poll: Duration::from_millis(50),
        };

        let serialized = serde_json::to_string(&original).unwrap();
        assert_eq!(serialized, r#"{"timeout":5,"poll":50}"#);

        let deserialized: Test = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized.timeout, original.timeout);
        assert_eq!(deserialized.poll, original.poll);
    }

    #[test]
    fn test_fractional_seconds_rejected() {
        let result: std::result::Result<Test, _> = serde_json::from_str(r#"{"timeout":1.5,"poll":50}"#);
        assert!(result.is_err());
    }
}
