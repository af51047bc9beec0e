//! # Deployment Artifacts
//!
//! `deploy` creates a live auction against the system clock and records it
//! in two JSON files inside the output directory:
//!
//! - `Auction-address.json` maps the contract name to the auction id,
//!   e.g. `{ "Auction": "6f1c…" }`. Front ends read it to find the auction.
//! - `Auction.json` describes the deployment: id, config, resolved window
//!   ends, and the operations and events the auction exposes.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sealed_auction::config::{
    ADDRESS_ARTIFACT_FILE, DEFAULT_BIDDING_DURATION_SECS, DEFAULT_REVEAL_DURATION_SECS,
    DESCRIPTOR_ARTIFACT_FILE,
};
use sealed_auction::{Address, Auction, AuctionConfig, SystemClock, Timestamp};

/// Contract name used as the key of the address artifact.
pub const CONTRACT_NAME: &str = "Auction";

/// Operations a deployed auction accepts.
pub const OPERATIONS: [&str; 4] = ["bid", "reveal", "withdraw", "auction_end"];

/// Events a deployed auction emits.
pub const EVENTS: [&str; 5] = [
    "bid_placed",
    "bid_revealed",
    "highest_bid_increased",
    "withdrawn",
    "auction_ended",
];

/// Contents of `Auction.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionDescriptor {
    pub contract: String,
    pub id: Uuid,
    pub deployed_at: DateTime<Utc>,
    pub config: AuctionConfig,
    pub bidding_end: Timestamp,
    pub reveal_end: Timestamp,
    pub operations: Vec<String>,
    pub events: Vec<String>,
}

/// Where a deployment landed.
#[derive(Debug, Clone)]
pub struct Deployment {
    pub descriptor: AuctionDescriptor,
    pub address_path: PathBuf,
    pub descriptor_path: PathBuf,
}

/// Reads an [`AuctionConfig`] from a JSON file.
pub fn load_config(path: &Path) -> Result<AuctionConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
}

/// Builds the config for a deployment.
///
/// Starts from `file` when given, otherwise from the default windows, then
/// applies whichever flags were passed. A beneficiary must come from one of
/// the two sources.
pub fn resolve_config(
    file: Option<&Path>,
    beneficiary: Option<String>,
    bidding_duration: Option<u64>,
    reveal_duration: Option<u64>,
) -> Result<AuctionConfig> {
    let mut config = match file {
        Some(path) => load_config(path)?,
        None => {
            let beneficiary = beneficiary
                .clone()
                .context("--beneficiary is required when no --config file is given")?;
            AuctionConfig::new(beneficiary)
                .with_durations(DEFAULT_BIDDING_DURATION_SECS, DEFAULT_REVEAL_DURATION_SECS)
        }
    };

    if let Some(beneficiary) = beneficiary {
        config.beneficiary = Address::new(beneficiary);
    }
    if let Some(secs) = bidding_duration {
        config.bidding_duration_secs = secs;
    }
    if let Some(secs) = reveal_duration {
        config.reveal_duration_secs = secs;
    }

    config.validate().context("invalid auction config")?;
    Ok(config)
}

/// Creates the auction and writes both artifacts into `out_dir`.
pub fn deploy(config: AuctionConfig, out_dir: &Path) -> Result<Deployment> {
    let auction =
        Auction::new(config.clone(), SystemClock).context("failed to construct auction")?;
    let id = Uuid::new_v4();

    let descriptor = AuctionDescriptor {
        contract: CONTRACT_NAME.to_string(),
        id,
        deployed_at: Utc::now(),
        config,
        bidding_end: auction.bidding_end(),
        reveal_end: auction.reveal_end(),
        operations: OPERATIONS.iter().map(|s| s.to_string()).collect(),
        events: EVENTS.iter().map(|s| s.to_string()).collect(),
    };

    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let address_path = out_dir.join(ADDRESS_ARTIFACT_FILE);
    let address = BTreeMap::from([(CONTRACT_NAME, id.to_string())]);
    write_json(&address_path, &serde_json::to_string_pretty(&address)?)?;

    let descriptor_path = out_dir.join(DESCRIPTOR_ARTIFACT_FILE);
    write_json(&descriptor_path, &serde_json::to_string_pretty(&descriptor)?)?;

    tracing::info!(
        %id,
        bidding_end = descriptor.bidding_end,
        reveal_end = descriptor.reveal_end,
        out_dir = %out_dir.display(),
        "auction deployed"
    );

    Ok(Deployment {
        descriptor,
        address_path,
        descriptor_path,
    })
}

fn write_json(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deploy_writes_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("deployments");
        let config = AuctionConfig::new("0xbene").with_durations(30, 45);

        let deployment = deploy(config.clone(), &out).unwrap();

        let address: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&deployment.address_path).unwrap()).unwrap();
        assert_eq!(
            address["Auction"].as_str().unwrap(),
            deployment.descriptor.id.to_string()
        );

        let descriptor: AuctionDescriptor =
            serde_json::from_str(&fs::read_to_string(&deployment.descriptor_path).unwrap())
                .unwrap();
        assert_eq!(descriptor, deployment.descriptor);
        assert_eq!(descriptor.config, config);
        assert_eq!(descriptor.reveal_end - descriptor.bidding_end, 45);
        assert!(descriptor.operations.contains(&"auction_end".to_string()));
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auction.json");
        fs::write(&path, r#"{ "beneficiary": "from-file", "reveal_duration_secs": 90 }"#).unwrap();

        let config = resolve_config(Some(&path), None, Some(10), None).unwrap();
        assert_eq!(config.beneficiary, Address::new("from-file"));
        assert_eq!(config.bidding_duration_secs, 10);
        assert_eq!(config.reveal_duration_secs, 90);

        let config = resolve_config(Some(&path), Some("flag".into()), None, None).unwrap();
        assert_eq!(config.beneficiary, Address::new("flag"));
    }

    #[test]
    fn beneficiary_is_required() {
        assert!(resolve_config(None, None, None, None).is_err());
        assert!(resolve_config(None, Some("  ".into()), None, None).is_err());

        let config = resolve_config(None, Some("bene".into()), None, None).unwrap();
        assert_eq!(config.bidding_duration_secs, DEFAULT_BIDDING_DURATION_SECS);
        assert_eq!(config.reveal_duration_secs, DEFAULT_REVEAL_DURATION_SECS);
    }
}
