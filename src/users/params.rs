use serde::{de, Deserialize, Deserializer};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Attributes accepted by create and update.
///
/// String attributes are kept verbatim so that `""` can be told apart from
/// a missing key. Timestamps treat `null`, `""` and a missing key alike.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserParams {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "blank_timestamp")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "blank_timestamp")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "blank_timestamp")]
    pub reset_password_sent_at: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "blank_timestamp")]
    pub remember_created_at: Option<OffsetDateTime>,
}

impl UserParams {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
            ..Default::default()
        }
    }
}

fn blank_timestamp<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => OffsetDateTime::parse(s, &Rfc3339)
            .map(Some)
            .map_err(|e| de::Error::custom(format!("invalid RFC 3339 timestamp {s:?}: {e}"))),
    }
}
