use crate::aggregate::{self, BucketWidth};
use crate::error::ShortenerError;
use crate::public_id::PublicId;
use hopper_codec::Codec;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// The 3xx status used when redirecting to a link's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RedirectCode {
    MovedPermanently,
    #[default]
    Found,
    TemporaryRedirect,
    PermanentRedirect,
}

impl RedirectCode {
    pub const fn as_u16(self) -> u16 {
        match self {
            RedirectCode::MovedPermanently => 301,
            RedirectCode::Found => 302,
            RedirectCode::TemporaryRedirect => 307,
            RedirectCode::PermanentRedirect => 308,
        }
    }
}

impl TryFrom<u16> for RedirectCode {
    type Error = ShortenerError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            301 => Ok(RedirectCode::MovedPermanently),
            302 => Ok(RedirectCode::Found),
            307 => Ok(RedirectCode::TemporaryRedirect),
            308 => Ok(RedirectCode::PermanentRedirect),
            other => Err(ShortenerError::InvalidRedirect(other)),
        }
    }
}

impl From<RedirectCode> for u16 {
    fn from(code: RedirectCode) -> Self {
        code.as_u16()
    }
}

impl Display for RedirectCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

impl Serialize for RedirectCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u16(self.as_u16())
    }
}

impl<'de> Deserialize<'de> for RedirectCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let code = u16::deserialize(deserializer)?;
        RedirectCode::try_from(code).map_err(serde::de::Error::custom)
    }
}

/// A validated link that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    /// Absolute URL the short link redirects to.
    pub target: String,
    pub redirect: RedirectCode,
}

/// A persisted link.
///
/// The public id is derived from the key when the value is built, so a
/// `Link` always satisfies `decode(public_id) == key` for the codec that
/// built it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    #[serde(skip)]
    key: u64,
    #[serde(rename = "id")]
    public_id: PublicId,
    target: String,
    redirect: RedirectCode,
    visits: Vec<Timestamp>,
}

impl Link {
    /// Assembles a link from its stored parts.
    pub fn from_parts(
        codec: &Codec,
        key: u64,
        target: String,
        redirect: RedirectCode,
        visits: Vec<Timestamp>,
    ) -> Self {
        Self {
            key,
            public_id: PublicId::from_key(codec, key),
            target,
            redirect,
            visits,
        }
    }

    /// Assembles a freshly created link, which has no visits yet.
    pub fn created(codec: &Codec, key: u64, link: NewLink) -> Self {
        Self::from_parts(codec, key, link.target, link.redirect, Vec::new())
    }

    pub fn key(&self) -> u64 {
        self.key
    }

    pub fn public_id(&self) -> &PublicId {
        &self.public_id
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn redirect(&self) -> RedirectCode {
        self.redirect
    }

    /// Visit timestamps in the order they were recorded.
    pub fn visits(&self) -> &[Timestamp] {
        &self.visits
    }

    /// Counts visits per `width`-sized bucket.
    ///
    /// Keys are UTC truncations of the visit time, so keys produced with the
    /// same width sort chronologically and compare across links.
    pub fn visits_per(&self, width: BucketWidth) -> BTreeMap<String, usize> {
        aggregate::visits_per(&self.visits, width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopper_codec::CodecSettings;

    fn codec() -> Codec {
        Codec::new(CodecSettings::builder().salt("pepper").build()).unwrap()
    }

    #[test]
    fn redirect_codes_round_trip() {
        for code in [301_u16, 302, 307, 308] {
            assert_eq!(RedirectCode::try_from(code).unwrap().as_u16(), code);
        }
    }

    #[test]
    fn redirect_code_rejects_other_statuses() {
        for code in [0_u16, 200, 300, 303, 304, 404] {
            let err = RedirectCode::try_from(code).unwrap_err();
            assert!(matches!(err, ShortenerError::InvalidRedirect(c) if c == code));
        }
    }

    #[test]
    fn redirect_code_defaults_to_found() {
        assert_eq!(RedirectCode::default().as_u16(), 302);
    }

    #[test]
    fn redirect_code_deserialize_validates() {
        let ok: RedirectCode = serde_json::from_str("308").unwrap();
        assert_eq!(ok, RedirectCode::PermanentRedirect);
        assert!(serde_json::from_str::<RedirectCode>("303").is_err());
    }

    #[test]
    fn public_id_always_matches_key() {
        let codec = codec();
        let link = Link::created(
            &codec,
            17,
            NewLink {
                target: "https://example.com".to_string(),
                redirect: RedirectCode::Found,
            },
        );
        assert_eq!(codec.decode(link.public_id().as_str()), Ok(17));
        assert!(link.visits().is_empty());
    }

    #[test]
    fn serializes_public_shape() {
        let link = Link::from_parts(
            &codec(),
            3,
            "https://example.com".to_string(),
            RedirectCode::TemporaryRedirect,
            vec!["2024-03-10T14:00:00Z".parse().unwrap()],
        );
        let value = serde_json::to_value(&link).unwrap();
        assert_eq!(value["id"], link.public_id().as_str());
        assert_eq!(value["redirect"], 307);
        assert_eq!(value["visits"][0], "2024-03-10T14:00:00Z");
        assert!(value.get("key").is_none());
    }
}
