//! Best-effort rewrite of ProxyCommand jump hosts.
//!
//! Inventories usually name the jump host by its inventory id, e.g.
//! `-o ProxyCommand="ssh -W %h:%p bastion"`. Outside the generated SSH
//! config that alias does not resolve, so the id is replaced by the jump
//! host's address. This is a textual heuristic, not a command-line parser:
//! the first hostname-like token inside the quotes (after dropping `ssh`)
//! is taken as the jump host.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{find_host, ClientHosts};

static PROXY_COMMAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"ProxyCommand=["|'](.*)["|']"#).unwrap());
static HOST_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zA-Z][\w.-]+").unwrap());

pub fn rewrite_proxy_command(hosts: &ClientHosts, options: &str) -> String {
    let Some(command) = PROXY_COMMAND
        .captures(options)
        .and_then(|captures| captures.get(1))
    else {
        return options.to_string();
    };

    let mut tokens: Vec<&str> = HOST_TOKEN
        .find_iter(command.as_str())
        .map(|token| token.as_str())
        .collect();
    if let Some(index) = tokens.iter().position(|token| *token == "ssh") {
        tokens.remove(index);
    }

    match tokens
        .first()
        .and_then(|jump| find_host(hosts, jump).map(|host| (jump, host)))
    {
        Some((jump, host)) => {
            tracing::debug!("Replacing ProxyCommand host '{}' with {}", jump, host.host_name);
            options.replace(jump, &host.host_name)
        }
        None => options.to_string(),
    }
}
