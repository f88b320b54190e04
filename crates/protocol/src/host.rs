//! Service hosts, endpoints and the fixed request headers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// `Origin` and `Referer` value sent with every request.
pub const ORIGIN: &str = "https://novelai.net";

/// User agent sent with every request.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Content type of every request body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Host variant serving the generation endpoint.
///
/// Both hosts decode identically; they differ only in the content type of the
/// archive they return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Host {
    /// `api.novelai.net`, answers with `application/x-zip-compressed`
    #[default]
    Api,
    /// `image.novelai.net`, answers with `binary/octet-stream`
    Web,
}

impl Host {
    /// All hosts, in declaration order.
    pub const ALL: [Host; 2] = [Host::Api, Host::Web];

    /// Production base URL (no trailing slash).
    pub fn default_url(self) -> &'static str {
        match self {
            Host::Api => "https://api.novelai.net",
            Host::Web => "https://image.novelai.net",
        }
    }

    /// Content type the host accepts and returns for generated archives.
    pub fn accept(self) -> &'static str {
        match self {
            Host::Api => "application/x-zip-compressed",
            Host::Web => "binary/octet-stream",
        }
    }

    /// Short identifier used in generated filenames.
    pub fn id(self) -> &'static str {
        match self {
            Host::Api => "api",
            Host::Web => "web",
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for Host {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "api" => Ok(Host::Api),
            "web" => Ok(Host::Web),
            _ => Err(format!("unknown host: {s}")),
        }
    }
}

/// API endpoint paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `POST /user/login`
    Login,
    /// `POST /ai/generate-image`
    GenerateImage,
}

impl Endpoint {
    /// Path component, starting with `/`.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Login => "/user/login",
            Endpoint::GenerateImage => "/ai/generate-image",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosts_carry_distinct_content_types() {
        assert_eq!(Host::Api.accept(), "application/x-zip-compressed");
        assert_eq!(Host::Web.accept(), "binary/octet-stream");
        assert_ne!(Host::Api.default_url(), Host::Web.default_url());
    }

    #[test]
    fn host_parses_case_insensitively() {
        assert_eq!("WEB".parse::<Host>().unwrap(), Host::Web);
        assert_eq!("api".parse::<Host>().unwrap(), Host::Api);
        assert!("ftp".parse::<Host>().is_err());
    }

    #[test]
    fn endpoint_paths() {
        assert_eq!(Endpoint::Login.path(), "/user/login");
        assert_eq!(Endpoint::GenerateImage.path(), "/ai/generate-image");
    }
}
