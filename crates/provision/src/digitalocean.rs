//! DigitalOcean droplet API client.
//!
//! Covers the small surface the provisioning workflow needs: list, create,
//! wait for activation, destroy. The base URL is injectable for tests.

use crate::error::{ProvisionError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_BASE_URL: &str = "https://api.digitalocean.com";

/// One droplet as reported by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct Droplet {
    pub id: u64,
    pub name: String,
    /// `new` while booting, `active` once reachable.
    pub status: String,
    #[serde(default)]
    networks: Networks,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Networks {
    #[serde(default)]
    v4: Vec<NetworkV4>,
}

#[derive(Debug, Clone, Deserialize)]
struct NetworkV4 {
    ip_address: String,
    #[serde(rename = "type")]
    kind: String,
}

impl Droplet {
    /// The droplet's public IPv4 address, once assigned.
    #[must_use]
    pub fn public_ip(&self) -> Option<&str> {
        self.networks
            .v4
            .iter()
            .find(|n| n.kind == "public")
            .map(|n| n.ip_address.as_str())
    }
}

/// Parameters for creating a droplet.
#[derive(Debug, Clone, Serialize)]
pub struct CreateDropletRequest {
    pub name: String,
    pub region: String,
    pub size: String,
    pub image: String,
    pub backups: bool,
}

impl CreateDropletRequest {
    /// A request with the defaults the poller host uses.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: "nyc1".to_string(),
            size: "s-1vcpu-512mb-10gb".to_string(),
            image: "ubuntu-22-04-x64".to_string(),
            backups: false,
        }
    }
}

#[derive(Deserialize)]
struct DropletsResponse {
    droplets: Vec<Droplet>,
}

#[derive(Deserialize)]
struct DropletResponse {
    droplet: Droplet,
}

#[derive(Deserialize)]
struct SshKeysResponse {
    ssh_keys: Vec<SshKey>,
}

#[derive(Deserialize)]
struct SshKey {
    id: u64,
}

#[derive(Serialize)]
struct CreateDropletBody<'a> {
    #[serde(flatten)]
    request: &'a CreateDropletRequest,
    ssh_keys: Vec<u64>,
}

/// Minimal DigitalOcean v2 API client.
pub struct DropletClient {
    client: Client,
    base_url: String,
    token: String,
    poll_interval: Duration,
}

impl DropletClient {
    /// Creates a client using the given API token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
            poll_interval: Duration::from_secs(1),
        }
    }

    /// Overrides the API base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the activation poll interval (used by tests).
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Lists all droplets on the account.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success response.
    pub async fn list_droplets(&self) -> Result<Vec<Droplet>> {
        let response = self
            .client
            .get(format!("{}/v2/droplets", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let body: DropletsResponse = check(response).await?.json().await?;
        Ok(body.droplets)
    }

    /// Creates a droplet, registering every SSH key on the account.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a rejected request.
    pub async fn create_droplet(&self, request: &CreateDropletRequest) -> Result<Droplet> {
        let keys = self.list_ssh_key_ids().await?;
        let body = CreateDropletBody {
            request,
            ssh_keys: keys,
        };

        let response = self
            .client
            .post(format!("{}/v2/droplets", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let body: DropletResponse = check(response).await?.json().await?;
        info!(name = %body.droplet.name, id = body.droplet.id, "Droplet created");
        Ok(body.droplet)
    }

    /// Polls until the named droplet reports `active`, then returns it.
    ///
    /// # Errors
    ///
    /// Returns an error if listing fails; keeps polling while the droplet
    /// is missing or still booting.
    pub async fn wait_until_active(&self, name: &str) -> Result<Droplet> {
        loop {
            let droplets = self.list_droplets().await?;
            if let Some(droplet) = droplets.into_iter().find(|d| d.name == name) {
                if droplet.status == "active" {
                    info!(name, id = droplet.id, "Droplet active");
                    return Ok(droplet);
                }
                debug!(name, status = %droplet.status, "Droplet not yet active");
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Destroys a droplet by id.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::DropletNotFound`] on a 404, otherwise an
    /// API or transport error.
    pub async fn destroy_droplet(&self, id: u64) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/v2/droplets/{id}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProvisionError::DropletNotFound {
                selector: id.to_string(),
            });
        }
        check(response).await?;
        info!(id, "Droplet destroyed");
        Ok(())
    }

    async fn list_ssh_key_ids(&self) -> Result<Vec<u64>> {
        let response = self
            .client
            .get(format!("{}/v2/account/keys", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let body: SshKeysResponse = check(response).await?.json().await?;
        Ok(body.ssh_keys.into_iter().map(|k| k.id).collect())
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(ProvisionError::Api {
        status: status.as_u16(),
        message,
    })
}
