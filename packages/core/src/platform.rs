use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailProviderType {
    Smtp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SmtpSettings {
    pub host_env: String,
    pub port_env: String,
    pub username_env: String,
    pub password_env: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MailConfig {
    pub provider: MailProviderType,
    pub from_email: String,
    pub from_name: String,
    pub smtp: Option<SmtpSettings>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Production,
    Staging,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpenIdConfig {
    /// Path to the identity provider's JWKS document on disk. Fetched and
    /// refreshed out-of-band by the deployment, never at build time.
    pub jwks_path: Option<String>,
    pub jwks_url: Option<String>,
    pub user_info_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Authentication {
    pub variant: String,
    pub openid: Option<OpenIdConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Features {
    /// Checkout + payment webhook handling. Off means a catalog-only hub.
    #[serde(default)]
    pub payments: bool,
    /// AI-assisted outline generation for educators.
    #[serde(default)]
    pub ai_outlines: bool,
    /// Thumbnail uploads through the configured asset host.
    #[serde(default)]
    pub assets: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
}

fn default_secure() -> bool {
    true
}

fn default_currency() -> String {
    "usd".to_string()
}

/// Deployment-wide configuration, loaded from a JSON document at startup.
/// Secrets stay in the environment; this file only carries topology and
/// feature switches and is safe to serve back on the info endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Platform {
    pub name: String,
    pub description: String,
    pub domain: String,
    #[serde(default = "default_secure")]
    pub secure: bool,
    pub environment: Environment,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub frontend_url: Option<String>,
    pub authentication: Option<Authentication>,
    pub features: Features,
    pub mail: Option<MailConfig>,
    pub contact: Contact,
}

impl Platform {
    pub fn from_json(raw: &str) -> lectern_types::Result<Self> {
        let platform: Platform = lectern_types::json::from_str(raw)?;
        Ok(platform)
    }

    pub fn frontend_url(&self) -> String {
        self.frontend_url.clone().unwrap_or_else(|| {
            let scheme = if self.secure { "https" } else { "http" };
            format!("{}://{}", scheme, self.domain)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let raw = r#"{
            "name": "Lectern",
            "description": "Course marketplace",
            "domain": "lectern.example.com",
            "environment": "Production",
            "features": { "payments": true },
            "contact": { "email": "ops@lectern.example.com" }
        }"#;
        let platform = Platform::from_json(raw).unwrap();
        assert!(platform.secure);
        assert_eq!(platform.currency, "usd");
        assert!(platform.features.payments);
        assert!(!platform.features.ai_outlines);
        assert_eq!(platform.frontend_url(), "https://lectern.example.com");
    }
}
