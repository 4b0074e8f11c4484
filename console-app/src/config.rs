use reqwest::Url;

use crate::{auth::Session, error::Error};

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";

/// Where the collections live and which token to present to them.
#[derive(Debug, Clone)]
pub struct Config {
    server: Url,
    token: Option<String>,
}

impl Config {
    /// Builds a config from the server address and an optional bearer token.
    ///
    /// # Errors
    ///
    /// This function will return an error if the server address is not an absolute http(s) URL.
    pub fn new(server: &str, token: Option<String>) -> Result<Self, Error> {
        let server = Url::parse(server)
            .map_err(|err| Error::InvalidConfig(format!("'{server}' is not a valid URL: {err}")))?;

        if !matches!(server.scheme(), "http" | "https") || server.cannot_be_a_base() {
            Err(Error::InvalidConfig(format!(
                "'{server}' has to be an http or https address"
            )))?;
        }

        Ok(Self {
            server,
            token: token.filter(|token| !token.is_empty()),
        })
    }

    #[must_use]
    pub fn server(&self) -> &Url {
        &self.server
    }

    /// Returns the session for the configured token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoggedIn`] if no token was configured.
    pub fn session(&self) -> Result<Session, Error> {
        self.token
            .as_deref()
            .map(Session::new)
            .ok_or(Error::NotLoggedIn)
    }
}

/// Appends path segments to the server address. An empty last segment produces a trailing slash.
pub(crate) fn endpoint(server: &Url, segments: &[&str]) -> Result<Url, Error> {
    let mut url = server.clone();
    url.path_segments_mut()
        .map_err(|()| Error::InvalidConfig(format!("'{server}' can not take a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
