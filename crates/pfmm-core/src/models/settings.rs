use serde::{Deserialize, Serialize};

/// Placeholder handle carried by the default settings.
/// A handle equal to this is never turned into a social link.
pub const DEFAULT_TWITTER_HANDLE: &str = "@pfmm";

const DEFAULT_SITE_NAME: &str = "Preaching Fingers Music Ministry";
const DEFAULT_SITE_URL: &str = "https://pfmm.com";
const DEFAULT_SITE_DESCRIPTION: &str =
    "Professional music ministry, media production, and creative empowerment services";
const DEFAULT_LOGO_URL: &str = "/logo.png";

const TWITTER_BASE_URL: &str = "https://twitter.com";

/// Site-wide configuration shown in page headers, footers and structured data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub site_name: String,
    pub site_url: String,
    pub site_description: String,
    pub logo_url: String,
    pub og_image_url: String,
    pub twitter_handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            id: None,
            site_name: DEFAULT_SITE_NAME.to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            site_description: DEFAULT_SITE_DESCRIPTION.to_string(),
            logo_url: DEFAULT_LOGO_URL.to_string(),
            og_image_url: DEFAULT_LOGO_URL.to_string(),
            twitter_handle: DEFAULT_TWITTER_HANDLE.to_string(),
            facebook_url: None,
            instagram_url: None,
            youtube_url: None,
            linkedin_url: None,
            contact_email: None,
            contact_phone: None,
            address: None,
        }
    }
}

impl SiteSettings {
    /// Profile URL for the twitter handle, unless the handle is empty or the placeholder
    pub fn twitter_url(&self) -> Option<String> {
        if self.twitter_handle.is_empty() || self.twitter_handle == DEFAULT_TWITTER_HANDLE {
            return None;
        }
        Some(format!(
            "{}/{}",
            TWITTER_BASE_URL,
            self.twitter_handle.replacen('@', "", 1)
        ))
    }

    /// Social profile URLs for structured data, in a fixed order:
    /// facebook, twitter, instagram, youtube, linkedin.
    pub fn social_links(&self) -> Vec<String> {
        let mut urls = Vec::new();
        if let Some(ref url) = self.facebook_url {
            urls.push(url.clone());
        }
        if let Some(url) = self.twitter_url() {
            urls.push(url);
        }
        for url in [&self.instagram_url, &self.youtube_url, &self.linkedin_url]
            .into_iter()
            .flatten()
        {
            urls.push(url.clone());
        }
        urls
    }
}

/// A `site_settings` record as returned by the backend.
///
/// Text fields come back as empty strings when unset; `null` and missing
/// keys are accepted too. A field of the wrong JSON type fails decoding.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteSettingsRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(default)]
    pub site_url: Option<String>,
    #[serde(default)]
    pub site_description: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub og_image_url: Option<String>,
    #[serde(default)]
    pub twitter_handle: Option<String>,
    #[serde(default)]
    pub facebook_url: Option<String>,
    #[serde(default)]
    pub instagram_url: Option<String>,
    #[serde(default)]
    pub youtube_url: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl SiteSettingsRecord {
    /// Merge this record over the default settings.
    ///
    /// Required fields keep the default when the record leaves them empty;
    /// optional fields are taken from the record only.
    pub fn to_settings(self) -> SiteSettings {
        let defaults = SiteSettings::default();
        SiteSettings {
            id: non_empty(self.id),
            site_name: non_empty(self.site_name).unwrap_or(defaults.site_name),
            site_url: non_empty(self.site_url).unwrap_or(defaults.site_url),
            site_description: non_empty(self.site_description)
                .unwrap_or(defaults.site_description),
            logo_url: non_empty(self.logo_url).unwrap_or(defaults.logo_url),
            og_image_url: non_empty(self.og_image_url).unwrap_or(defaults.og_image_url),
            twitter_handle: non_empty(self.twitter_handle).unwrap_or(defaults.twitter_handle),
            facebook_url: non_empty(self.facebook_url),
            instagram_url: non_empty(self.instagram_url),
            youtube_url: non_empty(self.youtube_url),
            linkedin_url: non_empty(self.linkedin_url),
            contact_email: non_empty(self.contact_email),
            contact_phone: non_empty(self.contact_phone),
            address: non_empty(self.address),
        }
    }
}
