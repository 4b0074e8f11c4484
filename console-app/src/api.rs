//! Typed access to the car and registration collections.
//!
//! The client never caches: every call is a fresh round trip, and it never retries. Whatever the
//! server answers is turned into either a typed value or an [`Error`] for the caller to act on.

use std::marker::PhantomData;

use log::{debug, warn};
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use shared::data::{Car, CarUpdate, Record, Registration, RegistrationUpdate};

use crate::{
    auth::Session,
    config::{endpoint, Config},
    error::Error,
};

/// Describes where a record type lives on the server.
pub trait Resource: Record + Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The partial record accepted by the update endpoint.
    type Update: Serialize + Send + Sync;

    /// Singular name used in log lines.
    const NAME: &'static str;
    /// First path segment shared by every endpoint of this collection.
    const SCOPE: &'static str;
    /// Key of the array in list and search responses.
    const LISTING_KEY: &'static str;
    const LIST: &'static str;
    const SEARCH: &'static str;
    const ADD: &'static str;
    const UPDATE: &'static str;
    const DELETE: &'static str;
}

impl Resource for Car {
    type Update = CarUpdate;

    const NAME: &'static str = "car";
    const SCOPE: &'static str = "carsdb";
    const LISTING_KEY: &'static str = "cars";
    const LIST: &'static str = "get_cars";
    const SEARCH: &'static str = "search_cars";
    const ADD: &'static str = "add_car";
    const UPDATE: &'static str = "update_car";
    const DELETE: &'static str = "delete_car";
}

impl Resource for Registration {
    type Update = RegistrationUpdate;

    const NAME: &'static str = "registration";
    const SCOPE: &'static str = "regdb";
    const LISTING_KEY: &'static str = "registrations";
    const LIST: &'static str = "get_registrations";
    const SEARCH: &'static str = "search_registrations";
    const ADD: &'static str = "add_registration";
    const UPDATE: &'static str = "update_registration";
    const DELETE: &'static str = "delete_registration";
}

/// An authorized connection to the server. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Api {
    http: Client,
    server: Url,
    session: Session,
}

impl Api {
    /// # Errors
    ///
    /// Returns [`Error::NotLoggedIn`] if the config carries no token, or an error if the HTTP
    /// client could not be built.
    pub fn new(config: &Config) -> Result<Self, Error> {
        Ok(Self {
            http: Client::builder().build()?,
            server: config.server().clone(),
            session: config.session()?,
        })
    }

    #[must_use]
    pub fn cars(&self) -> CollectionClient<Car> {
        CollectionClient::new(self.clone())
    }

    #[must_use]
    pub fn registrations(&self) -> CollectionClient<Registration> {
        CollectionClient::new(self.clone())
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("{method} {}", url.path());
        self.http
            .request(method, url)
            .bearer_auth(self.session.token())
            .header(header::CONTENT_TYPE, "application/json")
    }

    /// Sends a request and turns any non-2xx answer into an error.
    async fn send(&self, request: RequestBuilder) -> Result<Response, Error> {
        let response = request.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(rejection(response).await)
        }
    }
}

/// Reads the status and the server's `detail` message from a failed response.
///
/// Falls back to the status' reason phrase if the body carries no detail.
pub(crate) async fn read_detail(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let detail = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|mut body| body.get_mut("detail").map(Value::take))
        .map(|detail| match detail {
            Value::String(message) => message,
            other => other.to_string(),
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        });
    (status, detail)
}

/// Converts a non-2xx response into the matching error. A 401 always means the session expired.
pub(crate) async fn rejection(response: Response) -> Error {
    if response.status() == StatusCode::UNAUTHORIZED {
        warn!("The server rejected the session token");
        return Error::AuthExpired;
    }

    let (status, detail) = read_detail(response).await;
    warn!("Request failed with {status}: {detail}");
    Error::RequestFailed { status, detail }
}

/// List, search, create, update and delete for one collection.
#[derive(Debug, Clone)]
pub struct CollectionClient<R> {
    api: Api,
    resource: PhantomData<fn() -> R>,
}

impl<R: Resource> CollectionClient<R> {
    fn new(api: Api) -> Self {
        Self {
            api,
            resource: PhantomData,
        }
    }

    /// Fetches the whole collection. An empty collection is `Ok(vec![])`, never an error.
    ///
    /// # Errors
    ///
    /// This function will return an error if the request failed or the answer was unreadable.
    pub async fn list(&self) -> Result<Vec<R>, Error> {
        let url = endpoint(&self.api.server, &[R::SCOPE, R::LIST, ""])?;
        let response = self.api.send(self.api.request(Method::GET, url)).await?;
        let records = read_listing::<R>(response).await?;
        debug!("Listed {} {} record(s)", records.len(), R::NAME);
        Ok(records)
    }

    /// Searches the collection for records containing `query` in any field, ignoring case.
    ///
    /// The result may contain records that only partially match a plate. Callers looking for one
    /// specific record have to filter for it themselves.
    ///
    /// # Errors
    ///
    /// This function will return an error if the request failed or the answer was unreadable.
    pub async fn search(&self, query: &str) -> Result<Vec<R>, Error> {
        let url = endpoint(&self.api.server, &[R::SCOPE, R::SEARCH, ""])?;
        let request = self
            .api
            .request(Method::GET, url)
            .query(&[("query", query)]);
        let response = self.api.send(request).await?;
        let records = read_listing::<R>(response).await?;
        debug!(
            "Search for '{query}' found {} {} record(s)",
            records.len(),
            R::NAME
        );
        Ok(records)
    }

    /// # Errors
    ///
    /// This function will return an error if the server refused the record.
    pub async fn create(&self, record: &R) -> Result<(), Error> {
        let url = endpoint(&self.api.server, &[R::SCOPE, R::ADD, ""])?;
        let request = self.api.request(Method::POST, url).json(record);
        self.api.send(request).await?;
        debug!("Created {} {}", R::NAME, record.license_plate());
        Ok(())
    }

    /// Applies a partial update to the record with the given plate. The plate itself can not be changed.
    ///
    /// # Errors
    ///
    /// This function will return an error if the server refused the update.
    pub async fn update(&self, license_plate: &str, changes: &R::Update) -> Result<(), Error> {
        let url = endpoint(&self.api.server, &[R::SCOPE, R::UPDATE, license_plate])?;
        let request = self.api.request(Method::PUT, url).json(changes);
        self.api.send(request).await?;
        debug!("Updated {} {license_plate}", R::NAME);
        Ok(())
    }

    /// Deletes the record with the given plate.
    ///
    /// # Errors
    ///
    /// This function will return an error if the server refused the delete. Deleting a plate
    /// that does not exist is reported by the server and satisfies [`Error::is_not_found`].
    pub async fn delete(&self, license_plate: &str) -> Result<(), Error> {
        let url = endpoint(&self.api.server, &[R::SCOPE, R::DELETE, license_plate])?;
        self.api.send(self.api.request(Method::DELETE, url)).await?;
        debug!("Deleted {} {license_plate}", R::NAME);
        Ok(())
    }
}

/// Pulls the record array out of a `{ "<listing key>": [...] }` envelope.
async fn read_listing<R: Resource>(response: Response) -> Result<Vec<R>, Error> {
    let body = response.bytes().await?;
    let mut envelope: Map<String, Value> = serde_json::from_slice(&body)?;
    let Some(records) = envelope.remove(R::LISTING_KEY) else {
        return Err(Error::MissingListing(R::LISTING_KEY));
    };
    Ok(serde_json::from_value(records)?)
}
