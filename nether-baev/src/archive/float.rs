//! Bit-exact f32 in the tree form
//!
//! Finite values are plain JSON numbers. NaN and the infinities have no JSON
//! number, so they are written as the `0x`-prefixed hex of their bits, which
//! keeps NaN payloads intact. Hex is accepted for any value on input.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

pub(crate) fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f32(*value)
    } else {
        serializer.serialize_str(&format!("{:#010x}", value.to_bits()))
    }
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    match Repr::deserialize(deserializer)? {
        Repr::Number(value) => Ok(value),
        Repr::Bits(text) => {
            let digits = text
                .strip_prefix("0x")
                .or_else(|| text.strip_prefix("0X"))
                .unwrap_or(&text);
            u32::from_str_radix(digits, 16)
                .map(f32::from_bits)
                .map_err(|e| de::Error::custom(format!("invalid float bits {text:?}: {e}")))
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Number(f32),
    Bits(String),
}

#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct Float(#[serde(serialize_with = "serialize", deserialize_with = "deserialize")] f32);

/// `[x, y, z]`, each component in the same form
pub(crate) mod vec3 {
    use super::Float;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(crate) fn serialize<S: Serializer>(
        value: &[f32; 3],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(Float).serialize(serializer)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<[f32; 3], D::Error> {
        let [x, y, z] = <[Float; 3]>::deserialize(deserializer)?;
        Ok([x.0, y.0, z.0])
    }
}
