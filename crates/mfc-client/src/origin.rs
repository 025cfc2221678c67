//! Origin resolution for file locators.
//!
//! Stored locators may point at an origin the files are not actually served
//! from (a stale port, the wrong scheme behind a proxy). Every locator goes
//! through one [`OriginResolver`] before it is probed: relative locators are
//! joined onto the file base URL, then the first matching rewrite replaces
//! the origin. Path, query and fragment are preserved.

use url::{Origin, Position, Url};

use crate::config::ConfigError;

/// Replace one origin (scheme, host, effective port) with another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginRewrite {
    from: Url,
    to: Url,
}

impl OriginRewrite {
    pub fn new(from: Url, to: Url) -> Self {
        Self { from, to }
    }

    /// Parse a `from=to` pair, e.g. `http://localhost:8081=http://localhost:8080`.
    pub fn parse(rule: &str) -> Result<Self, ConfigError> {
        let (from, to) = rule
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidRewrite(rule.to_string(), "expected from=to".into()))?;
        let parse = |raw: &str| {
            Url::parse(raw.trim())
                .map_err(|e| ConfigError::InvalidRewrite(rule.to_string(), e.to_string()))
        };
        Ok(Self::new(parse(from)?, parse(to)?))
    }

    fn matches(&self, origin: &Origin) -> bool {
        self.from.origin() == *origin
    }
}

/// Resolves raw locators into the URL that is actually probed.
#[derive(Debug, Clone, Default)]
pub struct OriginResolver {
    base: Option<Url>,
    rules: Vec<OriginRewrite>,
}

impl OriginResolver {
    pub fn new(base: Option<Url>, rules: Vec<OriginRewrite>) -> Self {
        Self { base, rules }
    }

    pub fn resolve(&self, locator: &str) -> Result<Url, url::ParseError> {
        let url = match Url::parse(locator) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base {
                Some(base) => base.join(locator)?,
                None => return Err(url::ParseError::RelativeUrlWithoutBase),
            },
            Err(e) => return Err(e),
        };

        let origin = url.origin();
        let Some(rule) = self.rules.iter().find(|r| r.matches(&origin)) else {
            return Ok(url);
        };

        let rewritten = Url::parse(&format!(
            "{}{}",
            rule.to.origin().ascii_serialization(),
            &url[Position::BeforePath..]
        ))?;
        tracing::debug!(original = %url, rewritten = %rewritten, "rewrote file locator origin");
        Ok(rewritten)
    }
}
