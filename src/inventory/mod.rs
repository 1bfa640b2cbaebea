mod parser;
mod pattern;
mod vars;
mod walker;

use anyhow::Result;
use serde_yaml::Value;
use std::path::Path;

use crate::models::{find_host, upsert_host, ClientHosts, SshHost};
use parser::InventoryFile;
use vars::{scalar_to_string, Vars};

pub use walker::{walk, WalkMode};

const HOST_VAR: &str = "ansible_host";
const PORT_VAR: &str = "ansible_port";
const SSH_ARGS_VAR: &str = "ansible_ssh_common_args";

/// Clients in discovery order, each with its hosts.
#[derive(Debug, Default)]
pub struct Inventory {
    clients: Vec<(String, ClientHosts)>,
}

impl Inventory {
    pub fn client_ids(&self) -> impl Iterator<Item = &str> {
        self.clients.iter().map(|(id, _)| id.as_str())
    }

    pub fn clients(&self) -> impl Iterator<Item = (&str, &ClientHosts)> {
        self.clients.iter().map(|(id, hosts)| (id.as_str(), hosts))
    }

    pub fn hosts(&self, client: &str) -> Option<&ClientHosts> {
        self.clients
            .iter()
            .find(|(id, _)| id == client)
            .map(|(_, hosts)| hosts)
    }

    /// Host ids of every client, client by client.
    pub fn host_ids(&self) -> impl Iterator<Item = &str> {
        self.clients
            .iter()
            .flat_map(|(_, hosts)| hosts.iter().map(|(id, _)| id.as_str()))
    }

    /// First client (in discovery order) that knows `host`.
    pub fn find_host(&self, host: &str) -> Option<(&ClientHosts, &SshHost)> {
        self.clients
            .iter()
            .find_map(|(_, hosts)| find_host(hosts, host).map(|found| (hosts, found)))
    }

    pub(crate) fn client_mut(&mut self, client: &str) -> &mut ClientHosts {
        let index = match self.clients.iter().position(|(id, _)| id == client) {
            Some(index) => index,
            None => {
                self.clients.push((client.to_string(), ClientHosts::new()));
                self.clients.len() - 1
            }
        };
        &mut self.clients[index].1
    }
}

/// Parse one inventory file into host records.
pub fn extract_hosts(path: &Path) -> Result<ClientHosts> {
    let inventory = InventoryFile::load(path)?;
    let mut hosts = ClientHosts::new();

    for (id, vars) in inventory.resolve()? {
        let host = host_record(&id, &vars);
        tracing::debug!("{}: {} -> {}", path.display(), id, host);
        upsert_host(&mut hosts, id, host);
    }

    Ok(hosts)
}

fn host_record(id: &str, vars: &Vars) -> SshHost {
    let host_name = vars
        .get(HOST_VAR)
        .and_then(scalar_to_string)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| id.to_string());

    let port = vars.get(PORT_VAR).and_then(|value| {
        let port = match value {
            Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            Value::String(s) => s.trim().parse::<u16>().ok(),
            _ => None,
        }
        .filter(|port| *port > 0);
        if port.is_none() {
            tracing::warn!("Ignoring invalid {} {:?} for host '{}'", PORT_VAR, value, id);
        }
        port
    });

    let options = match vars.get(SSH_ARGS_VAR) {
        Some(Value::String(args)) if !args.is_empty() => Some(args.clone()),
        _ => None,
    };

    SshHost::new(host_name, port, options)
}
