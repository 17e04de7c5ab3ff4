//! Canonical facts: the identifiers the inventory service uses to match a host.
//!
//! Every fact is read relative to a root directory so collection can run
//! against a fixture tree. A missing or unreadable source leaves its fact
//! absent; only the subscription query can fail collection.

use std::path::{Path, PathBuf};

use rhc_core::{ConnectorResult, Subsystem, SubscriptionClient, SubsystemError};
use serde::Serialize;
use tokio::fs;
use tracing::debug;

const INSIGHTS_MACHINE_ID: &str = "etc/insights-client/machine-id";
const MACHINE_ID: &str = "etc/machine-id";
const PRODUCT_UUID: &str = "sys/devices/virtual/dmi/id/product_uuid";
const NET_CLASS: &str = "sys/class/net";
const FIB_TRIE: &str = "proc/net/fib_trie";
const ZERO_MAC: &str = "00:00:00:00:00:00";

/// Host identifiers reported by `rhc canonical-facts`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CanonicalFacts {
    /// Identifier assigned by the Insights client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights_id: Option<String>,
    /// systemd machine identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_id: Option<String>,
    /// Firmware product UUID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bios_uuid: Option<String>,
    /// Subscription registration identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_manager_id: Option<String>,
    /// Local IPv4 host addresses, loopback excluded.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ip_addresses: Vec<String>,
    /// Host name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    /// Hardware addresses of non-loopback interfaces.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mac_addresses: Vec<String>,
}

/// Reads [`CanonicalFacts`] from a filesystem root.
#[derive(Debug, Clone)]
pub struct FactCollector {
    root: PathBuf,
}

impl Default for FactCollector {
    fn default() -> Self {
        Self::new("/")
    }
}

impl FactCollector {
    /// Collect relative to `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Gather every fact.
    ///
    /// # Errors
    ///
    /// Returns a subsystem error when the subscription identity query fails.
    pub async fn collect(
        &self,
        subscription: &dyn SubscriptionClient,
    ) -> ConnectorResult<CanonicalFacts> {
        let subscription_id = subscription
            .registration_id()
            .await
            .map_err(|source| SubsystemError::new(Subsystem::Subscription, "query", source))?;

        let facts = CanonicalFacts {
            insights_id: self.read_value(INSIGHTS_MACHINE_ID).await,
            machine_id: self.read_value(MACHINE_ID).await,
            bios_uuid: self.read_value(PRODUCT_UUID).await,
            subscription_manager_id: non_empty(&subscription_id),
            ip_addresses: self.local_addresses().await,
            fqdn: fqdn(),
            mac_addresses: self.mac_addresses().await,
        };
        debug!(
            ip_addresses = facts.ip_addresses.len(),
            mac_addresses = facts.mac_addresses.len(),
            "canonical facts collected"
        );
        Ok(facts)
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    async fn read_value(&self, relative: &str) -> Option<String> {
        let path = self.path(relative);
        read_trimmed(&path).await
    }

    async fn mac_addresses(&self) -> Vec<String> {
        let mut interfaces: Vec<(String, PathBuf)> = Vec::new();
        let Ok(mut entries) = fs::read_dir(self.path(NET_CLASS)).await else {
            return Vec::new();
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name != "lo" {
                interfaces.push((name, entry.path()));
            }
        }
        interfaces.sort();

        let mut addresses: Vec<String> = Vec::new();
        for (_, path) in interfaces {
            if let Some(mac) = read_trimmed(&path.join("address")).await
                && mac != ZERO_MAC
                && !addresses.contains(&mac)
            {
                addresses.push(mac);
            }
        }
        addresses
    }

    async fn local_addresses(&self) -> Vec<String> {
        match fs::read_to_string(self.path(FIB_TRIE)).await {
            Ok(trie) => parse_fib_trie(&trie),
            Err(err) => {
                debug!(error = %err, "fib_trie unavailable");
                Vec::new()
            }
        }
    }
}

async fn read_trimmed(path: &Path) -> Option<String> {
    match fs::read_to_string(path).await {
        Ok(contents) => non_empty(&contents),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "fact source unavailable");
            None
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn fqdn() -> Option<String> {
    hostname::get()
        .ok()
        .and_then(|name| non_empty(&name.to_string_lossy()))
}

/// Host-local IPv4 addresses from a `/proc/net/fib_trie` dump.
///
/// Each `|-- ADDR` leaf is followed by its route lines; a `/32 host LOCAL`
/// route marks an address owned by this host.
fn parse_fib_trie(trie: &str) -> Vec<String> {
    let mut addresses: Vec<String> = Vec::new();
    let mut leaf: Option<&str> = None;
    for line in trie.lines() {
        let line = line.trim();
        if let Some(address) = line.strip_prefix("|--") {
            leaf = Some(address.trim());
        } else if line.starts_with("/32 host LOCAL")
            && let Some(address) = leaf
            && !address.starts_with("127.")
            && !addresses.iter().any(|known| known == address)
        {
            addresses.push(address.to_string());
        }
    }
    addresses
}
