//! Metrc API client abstraction.
//!
//! The [`MetrcApi`] trait decouples the evaluation workflow from the HTTP
//! transport. [`HttpMetrc`] talks to a real Metrc deployment; tests use
//! `test_support::StubMetrc`.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::endpoint::{Operation, Resource, request_target};
use crate::models::{Item, ItemPost, Location, LocationPost, Strain};

pub const VENDOR_KEY_ENV: &str = "METRC_VENDOR_KEY";
pub const USER_KEY_ENV: &str = "METRC_USER_KEY";

const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Typed operations per resource, all scoped by a license number.
///
/// Create, update and delete return nothing useful: Metrc answers them with an
/// empty body, which is why callers look new records up by name afterwards.
pub trait MetrcApi {
    fn create_locations(&self, locations: &[LocationPost], license: &str) -> Result<()>;
    fn update_locations(&self, locations: &[LocationPost], license: &str) -> Result<()>;
    fn get_locations_active(&self, license: &str) -> Result<Vec<Location>>;
    fn get_location_by_id(&self, id: i64, license: &str) -> Result<Location>;
    fn delete_location_by_id(&self, id: i64, license: &str) -> Result<()>;

    fn create_strains(&self, strains: &[Strain], license: &str) -> Result<()>;
    fn update_strains(&self, strains: &[Strain], license: &str) -> Result<()>;
    fn get_strains_active(&self, license: &str) -> Result<Vec<Strain>>;
    fn get_strain_by_id(&self, id: i64, license: &str) -> Result<Strain>;
    fn delete_strain_by_id(&self, id: i64, license: &str) -> Result<()>;

    fn create_items(&self, items: &[ItemPost], license: &str) -> Result<()>;
    fn update_items(&self, items: &[ItemPost], license: &str) -> Result<()>;
    fn get_items_active(&self, license: &str) -> Result<Vec<Item>>;
    fn get_item_by_id(&self, id: i64, license: &str) -> Result<Item>;
    fn delete_item_by_id(&self, id: i64, license: &str) -> Result<()>;
}

/// Basic-auth credentials: the integrator's vendor key and the licensee's user key.
#[derive(Clone)]
pub struct Credentials {
    pub vendor_key: String,
    pub user_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("vendor_key", &"<redacted>")
            .field("user_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read `METRC_VENDOR_KEY` and `METRC_USER_KEY`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            vendor_key: read_key(VENDOR_KEY_ENV)?,
            user_key: read_key(USER_KEY_ENV)?,
        })
    }
}

fn read_key(var: &str) -> Result<String> {
    let value = std::env::var(var).with_context(|| format!("read {var}"))?;
    if value.trim().is_empty() {
        bail!("{var} must be non-empty");
    }
    Ok(value)
}

/// Blocking HTTP implementation of [`MetrcApi`].
#[derive(Debug, Clone)]
pub struct HttpMetrc {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl HttpMetrc {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("metrc-eval/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(
        &self,
        method: Method,
        resource: Resource,
        op: Operation,
        license: &str,
    ) -> RequestBuilder {
        let url = request_target(&self.base_url, resource, op, license);
        debug!(%method, %url, "metrc request");
        self.client.request(method, url).basic_auth(
            &self.credentials.vendor_key,
            Some(&self.credentials.user_key),
        )
    }

    #[instrument(skip_all, fields(resource = %resource, op = %op))]
    fn get_json<T: DeserializeOwned>(
        &self,
        resource: Resource,
        op: Operation,
        license: &str,
    ) -> Result<T> {
        let body = send(self.request(Method::GET, resource, op, license))?;
        serde_json::from_str(&body).with_context(|| format!("decode {resource}/{op} response"))
    }

    #[instrument(skip_all, fields(resource = %resource, op = %op))]
    fn post_json<B: Serialize + ?Sized>(
        &self,
        resource: Resource,
        op: Operation,
        license: &str,
        payload: &B,
    ) -> Result<()> {
        send(
            self.request(Method::POST, resource, op, license)
                .json(payload),
        )?;
        Ok(())
    }

    #[instrument(skip_all, fields(resource = %resource, id = id))]
    fn delete(&self, resource: Resource, id: i64, license: &str) -> Result<()> {
        send(self.request(Method::DELETE, resource, Operation::Id(id), license))?;
        Ok(())
    }
}

/// Send a request and return the body text of a successful response.
fn send(request: RequestBuilder) -> Result<String> {
    let response = request.send().context("send metrc request")?;
    let status = response.status();
    let body = response.text().context("read metrc response body")?;
    if !status.is_success() {
        warn!(status = status.as_u16(), "metrc request failed");
        return Err(anyhow!(
            "metrc returned HTTP {} {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown"),
            body.trim()
        ));
    }
    Ok(body)
}

impl MetrcApi for HttpMetrc {
    fn create_locations(&self, locations: &[LocationPost], license: &str) -> Result<()> {
        self.post_json(Resource::Locations, Operation::Create, license, locations)
    }

    fn update_locations(&self, locations: &[LocationPost], license: &str) -> Result<()> {
        self.post_json(Resource::Locations, Operation::Update, license, locations)
    }

    fn get_locations_active(&self, license: &str) -> Result<Vec<Location>> {
        self.get_json(Resource::Locations, Operation::Active, license)
    }

    fn get_location_by_id(&self, id: i64, license: &str) -> Result<Location> {
        self.get_json(Resource::Locations, Operation::Id(id), license)
    }

    fn delete_location_by_id(&self, id: i64, license: &str) -> Result<()> {
        self.delete(Resource::Locations, id, license)
    }

    fn create_strains(&self, strains: &[Strain], license: &str) -> Result<()> {
        self.post_json(Resource::Strains, Operation::Create, license, strains)
    }

    fn update_strains(&self, strains: &[Strain], license: &str) -> Result<()> {
        self.post_json(Resource::Strains, Operation::Update, license, strains)
    }

    fn get_strains_active(&self, license: &str) -> Result<Vec<Strain>> {
        self.get_json(Resource::Strains, Operation::Active, license)
    }

    fn get_strain_by_id(&self, id: i64, license: &str) -> Result<Strain> {
        self.get_json(Resource::Strains, Operation::Id(id), license)
    }

    fn delete_strain_by_id(&self, id: i64, license: &str) -> Result<()> {
        self.delete(Resource::Strains, id, license)
    }

    fn create_items(&self, items: &[ItemPost], license: &str) -> Result<()> {
        self.post_json(Resource::Items, Operation::Create, license, items)
    }

    fn update_items(&self, items: &[ItemPost], license: &str) -> Result<()> {
        self.post_json(Resource::Items, Operation::Update, license, items)
    }

    fn get_items_active(&self, license: &str) -> Result<Vec<Item>> {
        self.get_json(Resource::Items, Operation::Active, license)
    }

    fn get_item_by_id(&self, id: i64, license: &str) -> Result<Item> {
        self.get_json(Resource::Items, Operation::Id(id), license)
    }

    fn delete_item_by_id(&self, id: i64, license: &str) -> Result<()> {
        self.delete(Resource::Items, id, license)
    }
}
