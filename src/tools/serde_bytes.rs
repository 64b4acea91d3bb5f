//! Serde helpers for opaque byte chunks.

pub(crate) mod as_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<T, S>(data: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: AsRef<[u8]>,
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&STANDARD.encode(data.as_ref()))
        } else {
            serializer.serialize_bytes(data.as_ref())
        }
    }

    pub(crate) fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        for<'a> T: TryFrom<&'a [u8]>,
        for<'a> <T as TryFrom<&'a [u8]>>::Error: core::fmt::Display,
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let encoded = alloc_string(deserializer)?;
            let bytes = STANDARD
                .decode(encoded.as_bytes())
                .map_err(de::Error::custom)?;
            T::try_from(&bytes).map_err(de::Error::custom)
        } else {
            let bytes = <&[u8]>::deserialize(deserializer)?;
            T::try_from(bytes).map_err(de::Error::custom)
        }
    }

    fn alloc_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        String::deserialize(deserializer)
    }
}
