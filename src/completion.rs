use clap::ValueEnum;

use crate::inventory::{Inventory, WalkMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CompletionKind {
    Hosts,
    Clients,
    Both,
}

impl CompletionKind {
    /// How much of the inventory the completion needs parsed.
    pub fn walk_mode(self, client: Option<&str>) -> WalkMode<'_> {
        match (self, client) {
            (CompletionKind::Clients, _) => WalkMode::ClientsOnly,
            (CompletionKind::Hosts, Some(client)) => WalkMode::Client(client),
            (CompletionKind::Hosts, None) | (CompletionKind::Both, _) => WalkMode::All,
        }
    }
}

/// Space-separated completion words. `Both` ignores the client scope.
pub fn render(inventory: &Inventory, kind: CompletionKind, client: Option<&str>) -> String {
    let words: Vec<&str> = match (kind, client) {
        (CompletionKind::Clients, _) => inventory.client_ids().collect(),
        (CompletionKind::Hosts, Some(client)) => inventory
            .hosts(client)
            .map(|hosts| hosts.iter().map(|(id, _)| id.as_str()).collect())
            .unwrap_or_default(),
        (CompletionKind::Hosts, None) => inventory.host_ids().collect(),
        (CompletionKind::Both, _) => inventory.client_ids().chain(inventory.host_ids()).collect(),
    };
    words.join(" ")
}
