
use core::fmt;
use std::{str::FromStr, sync::LazyLock};

use regex::Regex;

use crate::manifest::Str;

// algorithm:encoded, see the OCI image spec descriptor digests
static DIGEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<algorithm>[a-z0-9]+(?:[+._-][a-z0-9]+)*):(?P<encoded>[a-f0-9]+)$")
        .expect("digest regex")
});

/// A container image reference of the form `name[:tag][@digest]`.
///
/// At most one of `tag` and `digest` is set. The registry host (including any port) is part of
/// `name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    pub name: Str,
    pub tag: Option<Str>,
    pub digest: Option<Str>,
}

impl ImageRef {
    pub fn bare(name: impl Into<Str>) -> Self {
        Self {
            name: name.into(),
            tag: None,
            digest: None,
        }
    }

    /// Parses an image reference, never failing.
    ///
    /// Anything [`ImageRef::parse_strict`] rejects is kept whole as a bare name, so a malformed
    /// reference is never split into a tag or digest it did not clearly contain.
    pub fn parse(raw: &str) -> Self {
        Self::parse_strict(raw).unwrap_or_else(|err| {
            tracing::debug!("{err}, treating it as a bare name");
            Self::bare(raw)
        })
    }

    pub fn parse_strict(raw: &str) -> Result<Self, MalformedImageRef> {
        let malformed = |reason| MalformedImageRef {
            image: raw.into(),
            reason,
        };

        if raw.is_empty() {
            return Err(malformed("empty reference"));
        }

        match raw.split_once('@') {
            Some((_, digest)) if digest.contains('@') => Err(malformed("more than one `@`")),
            Some((name, digest)) => {
                if !is_digest(digest) {
                    return Err(malformed("invalid digest"));
                }

                // The digest pins the content, so a tag next to it carries no information.
                let (name, _) = split_tag(name).map_err(malformed)?;
                Ok(Self {
                    name: name.into(),
                    tag: None,
                    digest: Some(digest.into()),
                })
            }
            None => {
                let (name, tag) = split_tag(raw).map_err(malformed)?;
                Ok(Self {
                    name: name.into(),
                    tag: tag.map(Into::into),
                    digest: None,
                })
            }
        }
    }
}

impl FromStr for ImageRef {
    type Err = MalformedImageRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_strict(s)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

fn is_digest(s: &str) -> bool {
    let Some(captures) = DIGEST.captures(s) else {
        return false;
    };

    let encoded = captures["encoded"].len();
    match &captures["algorithm"] {
        "sha256" => encoded == 64,
        "sha512" => encoded == 128,
        _ => encoded >= 32,
    }
}

/// Splits `name[:tag]` at the last `:` after the last `/`, so `host:port/app` keeps its port.
fn split_tag(s: &str) -> Result<(&str, Option<&str>), &'static str> {
    let start = s.rfind('/').map_or(0, |i| i + 1);
    let (name, tag) = match s[start..].rfind(':') {
        Some(i) => (&s[..start + i], Some(&s[start + i + 1..])),
        None => (s, None),
    };

    if name.is_empty() {
        return Err("empty name");
    }

    if tag.is_some_and(str::is_empty) {
        return Err("empty tag");
    }

    Ok((name, tag))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedImageRef {
    pub image: Str,
    pub reason: &'static str,
}

impl fmt::Display for MalformedImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "malformed image reference `{}`: {}",
            self.image, self.reason
        )
    }
}

impl std::error::Error for MalformedImageRef {}
