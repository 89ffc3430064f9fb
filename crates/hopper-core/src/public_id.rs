use hopper_codec::Codec;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::Display;

/// The public identifier of a link, as minted by a [`Codec`].
///
/// A `PublicId` is never stored on its own; it is always derived from the
/// record key so the two cannot drift apart.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PublicId(SmolStr);

impl PublicId {
    /// Derives the public id of `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hopper_core::{Codec, CodecSettings, PublicId};
    ///
    /// let codec = Codec::new(CodecSettings::builder().salt("pepper").build()).unwrap();
    /// let id = PublicId::from_key(&codec, 7);
    /// assert_eq!(codec.decode(id.as_str()), Ok(7));
    /// ```
    pub fn from_key(codec: &Codec, key: u64) -> Self {
        Self(SmolStr::new(codec.encode(key)))
    }

    /// Returns the public id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Renders the full short URL under `base_url`.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }
}

impl std::fmt::Debug for PublicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PublicId").field(&self.0).finish()
    }
}

impl Display for PublicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PublicId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for PublicId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Not validated here: only a codec can tell whether the id decodes.
        let s = SmolStr::deserialize(deserializer)?;
        Ok(Self(s))
    }
}
