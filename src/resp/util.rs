/// Serializes `DateTime<Utc>` as integer unix seconds, the representation
/// JWT `iat`/`exp` claims require.
pub mod date_time_as_unix_seconds {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(date.timestamp())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = i64::deserialize(deserializer)?;
        Utc.timestamp_opt(seconds, 0)
            .single()
            .ok_or_else(|| serde::de::Error::custom("timestamp out of range"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{SubsecRound, Utc};

    #[derive(Serialize, Deserialize)]
    struct Stamp {
        #[serde(with = "super::date_time_as_unix_seconds")]
        at: chrono::DateTime<Utc>,
    }

    #[test]
    fn round_trips_whole_seconds() {
        let now = Utc::now().round_subsecs(0);
        let json = serde_json::to_string(&Stamp { at: now }).unwrap();
        let back: Stamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back.at, now);
    }
}
