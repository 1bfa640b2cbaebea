use std::fmt;

/// Hosts of one client, keyed by inventory hostname in discovery order.
pub type ClientHosts = Vec<(String, SshHost)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshHost {
    pub host_name: String,
    pub port: Option<u16>,
    pub options: Option<String>,
}

impl SshHost {
    pub fn new(host_name: String, port: Option<u16>, options: Option<String>) -> Self {
        Self {
            host_name,
            port,
            options,
        }
    }

    /// `(Param, value)` pairs for every non-empty attribute, in config order.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !self.host_name.is_empty() {
            params.push(("HostName", self.host_name.clone()));
        }
        if let Some(port) = self.port {
            params.push(("Port", port.to_string()));
        }
        if let Some(options) = self.options.as_deref().filter(|o| !o.is_empty()) {
            params.push(("Options", options.to_string()));
        }
        params
    }
}

impl fmt::Display for SshHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostName={}", self.host_name)?;
        if let Some(port) = self.port {
            write!(f, " Port={port}")?;
        }
        if let Some(options) = &self.options {
            write!(f, " Options={options}")?;
        }
        Ok(())
    }
}

/// Insert or overwrite `host` in place, keeping the original position.
pub fn upsert_host(hosts: &mut ClientHosts, id: String, host: SshHost) {
    match hosts.iter_mut().find(|(existing, _)| *existing == id) {
        Some((_, slot)) => *slot = host,
        None => hosts.push((id, host)),
    }
}

pub fn find_host<'a>(hosts: &'a ClientHosts, id: &str) -> Option<&'a SshHost> {
    hosts
        .iter()
        .find(|(existing, _)| existing == id)
        .map(|(_, host)| host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_skip_empty_attributes() {
        let host = SshHost::new("10.0.0.5".to_string(), Some(2222), Some(String::new()));
        assert_eq!(
            host.params(),
            vec![
                ("HostName", "10.0.0.5".to_string()),
                ("Port", "2222".to_string())
            ]
        );
    }

    #[test]
    fn test_upsert_keeps_position() {
        let mut hosts = ClientHosts::new();
        upsert_host(&mut hosts, "a".into(), SshHost::new("a".into(), None, None));
        upsert_host(&mut hosts, "b".into(), SshHost::new("b".into(), None, None));
        upsert_host(&mut hosts, "a".into(), SshHost::new("1.1.1.1".into(), Some(22), None));

        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0].0, "a");
        assert_eq!(hosts[0].1.host_name, "1.1.1.1");
        assert_eq!(find_host(&hosts, "b").map(|h| h.host_name.as_str()), Some("b"));
        assert!(find_host(&hosts, "c").is_none());
    }
}
