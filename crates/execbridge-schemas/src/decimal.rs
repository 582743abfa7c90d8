//! Wire representation for fixed-point amounts.
//!
//! Every decimal field on the wire (HTTP bodies, the message-bus value) is a
//! string at scale 8, never a JSON number — avoids the float round-trip loss
//! the upstream trade service and the FIX engine would otherwise disagree on.

use rust_decimal::Decimal;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

pub const SCALE: u32 = 8;

pub fn serialize<S: Serializer>(value: &Decimal, ser: S) -> Result<S::Ok, S::Error> {
    ser.serialize_str(&value.round_dp(SCALE).to_string())
}

pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Decimal, D::Error> {
    let s = String::deserialize(de)?;
    s.parse::<Decimal>()
        .map(|d| d.round_dp(SCALE))
        .map_err(D::Error::custom)
}

pub mod option {
    use super::SCALE;
    use rust_decimal::Decimal;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Decimal>, ser: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => ser.serialize_str(&d.round_dp(SCALE).to_string()),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Decimal>, D::Error> {
        let s: Option<String> = Option::deserialize(de)?;
        match s {
            Some(s) => s
                .parse::<Decimal>()
                .map(|d| Some(d.round_dp(SCALE)))
                .map_err(D::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Wrapper(#[serde(with = "super")] Decimal);

    #[test]
    fn round_trips_at_scale_8() {
        let w = Wrapper(dec!(12.5));
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, "\"12.50000000\"");
        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.0, dec!(12.5));
    }
}
