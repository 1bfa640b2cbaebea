use anyhow::{Context, Result};
use std::path::{Component, Path};
use walkdir::WalkDir;

use super::vars::is_yaml;
use super::{extract_hosts, Inventory};
use crate::models::upsert_host;

/// Directories holding variables rather than inventories.
const RESERVED_DIRS: [&str; 4] = ["vaults", "vars", "group_vars", "host_vars"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode<'a> {
    /// Parse every inventory file.
    All,
    /// Only discover client names.
    ClientsOnly,
    /// Parse the inventory files of one client.
    Client(&'a str),
}

/// Walk the inventory tree under `root` and collect clients and their hosts.
pub fn walk(root: &Path, mode: WalkMode<'_>) -> Result<Inventory> {
    let mut inventory = Inventory::default();

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry
            .with_context(|| format!("Failed to walk inventory directory {}", root.display()))?;
        if !entry.file_type().is_file() || !is_yaml(entry.path()) {
            continue;
        }

        let Some(client) = client_of(root, entry.path()) else {
            tracing::debug!("Skipping {}", entry.path().display());
            continue;
        };

        match mode {
            WalkMode::ClientsOnly => {
                inventory.client_mut(&client);
            }
            WalkMode::Client(target) if target != client => {}
            WalkMode::All | WalkMode::Client(_) => {
                tracing::debug!("Loading {} for client '{}'", entry.path().display(), client);
                let hosts = extract_hosts(entry.path())?;
                let client_hosts = inventory.client_mut(&client);
                for (id, host) in hosts {
                    upsert_host(client_hosts, id, host);
                }
            }
        }
    }

    Ok(inventory)
}

/// Client id of an inventory file: its first directory under `root`, cut at
/// the first `-`. `None` for files directly in `root`, files below a
/// reserved directory, or an empty id.
fn client_of(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let dirs: Vec<&str> = relative
        .parent()?
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect();

    if dirs.iter().any(|dir| RESERVED_DIRS.contains(dir)) {
        return None;
    }

    let client = dirs.first()?.split('-').next()?;
    (!client.is_empty()).then(|| client.to_string())
}
