use once_cell::sync::Lazy;
use regex::Regex;

use crate::inventory::Inventory;
use crate::models::{find_host, ClientHosts, SshHost};
use crate::proxy::rewrite_proxy_command;

static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#"("[^"]+")"#).unwrap());

/// Build the `ssh` argument string for `host`: `[-p PORT] [OPTIONS] HOSTNAME`.
///
/// With a client scope only that client is searched; otherwise the first
/// client knowing the host wins. `None` when the host is unknown.
pub fn ssh_string(
    inventory: &Inventory,
    host: &str,
    client: Option<&str>,
    quote_opts_quotes: bool,
) -> Option<String> {
    let (hosts, record) = match client {
        Some(client) => {
            let hosts = inventory.hosts(client)?;
            (hosts, find_host(hosts, host)?)
        }
        None => inventory.find_host(host)?,
    };

    tracing::info!("Building ssh string for {}: {}", host, record);
    Some(build_args(hosts, record, quote_opts_quotes).join(" "))
}

fn build_args(hosts: &ClientHosts, host: &SshHost, quote_opts_quotes: bool) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(port) = host.port {
        args.push(format!("-p {port}"));
    }

    if let Some(options) = host.options.as_deref().filter(|o| !o.is_empty()) {
        let options = rewrite_proxy_command(hosts, options);
        args.push(if quote_opts_quotes {
            quote_quoted(&options)
        } else {
            options
        });
    }

    if !host.host_name.is_empty() {
        args.push(host.host_name.clone());
    }

    args
}

/// Protect quoted option values from one more level of shell parsing:
/// single quotes become double quotes, then every `"..."` is wrapped in
/// single quotes.
fn quote_quoted(options: &str) -> String {
    QUOTED
        .replace_all(&options.replace('\'', "\""), "'${1}'")
        .into_owned()
}
