use std::fmt;

use log::{debug, info};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::{
    api::{read_detail, rejection},
    config::{endpoint, Config},
    error::Error,
};

/// The bearer credential attached to every collection request.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("token", &"<redacted>").finish()
    }
}

/// A new account as submitted to the register endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Talks to the `/auth` endpoints, which are the only ones that do not need a session.
#[derive(Debug, Clone)]
pub struct Authenticator {
    http: Client,
    server: Url,
}

impl Authenticator {
    /// # Errors
    ///
    /// This function will return an error if the HTTP client could not be built.
    pub fn new(config: &Config) -> Result<Self, Error> {
        Ok(Self {
            http: Client::builder().build()?,
            server: config.server().clone(),
        })
    }

    /// Exchanges an email and password for a [`Session`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::LoginFailed`] if the server refuses the credentials, or any other error
    /// that occured whilst talking to the server.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, Error> {
        let url = endpoint(&self.server, &["auth", "login"])?;
        debug!("POST {}", url.path());

        let response = self
            .http
            .post(url)
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let body = response.bytes().await?;
                let token: TokenResponse = serde_json::from_slice(&body)?;
                info!("Logged in as {email}");
                Ok(Session::new(token.access_token))
            }
            StatusCode::UNAUTHORIZED => {
                let (_, detail) = read_detail(response).await;
                Err(Error::LoginFailed(detail))
            }
            _ => Err(rejection(response).await),
        }
    }

    /// Creates a new account. The password confirmation is checked before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PasswordMismatch`] if the passwords differ, or the server's rejection.
    pub async fn register(&self, user: &NewUser) -> Result<(), Error> {
        if user.password != user.confirm_password {
            Err(Error::PasswordMismatch)?;
        }

        let url = endpoint(&self.server, &["auth", "register"])?;
        debug!("POST {}", url.path());

        let response = self.http.post(url).json(user).send().await?;
        if response.status().is_success() {
            info!("Registered {}", user.email);
            Ok(())
        } else {
            Err(rejection(response).await)
        }
    }
}
