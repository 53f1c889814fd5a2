use crate::error::CopyFactoryError;

use url::Url;

/// Domain the hosted service runs under.
pub const DEFAULT_DOMAIN: &str = "agiliumtrade.agiliumtrade.ai";

/// Base domain from which every service origin is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFactoryEnvironment {
    pub domain: String,
}

impl Default for CopyFactoryEnvironment {
    fn default() -> Self {
        Self::production()
    }
}

impl CopyFactoryEnvironment {
    pub fn production() -> Self {
        Self::with_domain(DEFAULT_DOMAIN)
    }

    pub fn with_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    /// `https://copyfactory-api-v1.<domain>`
    pub fn copyfactory_origin(&self) -> Result<Url, CopyFactoryError> {
        Ok(Url::parse(&format!("https://copyfactory-api-v1.{}", self.domain))?)
    }

    /// `https://copyfactory-api-v1.<region>.<domain>`
    pub fn regional_copyfactory_origin(&self, region: &str) -> Result<Url, CopyFactoryError> {
        Ok(Url::parse(&format!(
            "https://copyfactory-api-v1.{region}.{}",
            self.domain
        ))?)
    }

    /// `https://mt-provisioning-api-v1.<domain>`
    pub fn provisioning_origin(&self) -> Result<Url, CopyFactoryError> {
        Ok(Url::parse(&format!(
            "https://mt-provisioning-api-v1.{}",
            self.domain
        ))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_derive_from_domain() {
        let env = CopyFactoryEnvironment::with_domain("example.com");
        assert_eq!(
            env.copyfactory_origin().unwrap().as_str(),
            "https://copyfactory-api-v1.example.com/"
        );
        assert_eq!(
            env.regional_copyfactory_origin("vint-hill").unwrap().as_str(),
            "https://copyfactory-api-v1.vint-hill.example.com/"
        );
        assert_eq!(
            env.provisioning_origin().unwrap().as_str(),
            "https://mt-provisioning-api-v1.example.com/"
        );
    }

    #[test]
    fn default_is_production_domain() {
        assert_eq!(CopyFactoryEnvironment::default().domain, DEFAULT_DOMAIN);
    }
}
