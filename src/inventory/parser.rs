//! YAML inventory parsing with group inheritance.
//!
//! Variable precedence for a host, lowest first:
//!
//! 1. group vars from the inventory file, groups ordered by depth then name
//! 2. `group_vars/all` next to the inventory file
//! 3. `group_vars/<group>` for the remaining groups, same order
//! 4. host vars from the inventory file
//! 5. `host_vars/<host>` next to the inventory file
//!
//! Merging is a shallow replace: a later layer overwrites whole values.

use anyhow::{Context, Result};
use serde_yaml::Value;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use super::pattern::expand_host_pattern;
use super::vars::{kind_of, load_adjacent_vars, scalar_to_string, vars_from_value, Vars};
use crate::error::Error;

const ALL_GROUP: &str = "all";

#[derive(Debug, Default)]
struct Group {
    vars: Vars,
    parents: Vec<String>,
}

#[derive(Debug)]
struct HostEntry {
    name: String,
    vars: Vars,
    /// Groups listing the host directly.
    groups: BTreeSet<String>,
}

#[derive(Debug)]
pub struct InventoryFile {
    path: PathBuf,
    groups: HashMap<String, Group>,
    hosts: Vec<HostEntry>,
    host_index: HashMap<String, usize>,
}

impl InventoryFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read inventory file {}", path.display()))?;
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let document: Value = serde_yaml::from_str(content)
            .with_context(|| format!("Failed to parse inventory file {}", path.display()))?;

        let mut inventory = Self {
            path: path.to_path_buf(),
            groups: HashMap::new(),
            hosts: Vec::new(),
            host_index: HashMap::new(),
        };
        inventory.groups.insert(ALL_GROUP.to_string(), Group::default());

        match &document {
            Value::Null => {}
            Value::Mapping(top) => {
                for (name, block) in top {
                    let name = inventory.group_name(name)?;
                    let parent = (name != ALL_GROUP).then_some(ALL_GROUP);
                    inventory.add_group(&name, block, parent)?;
                }
            }
            other => {
                return Err(inventory.invalid(format!(
                    "expected a mapping of groups at top level, found {}",
                    kind_of(other)
                )))
            }
        }

        Ok(inventory)
    }

    /// Resolve the variables of every host, in order of first appearance.
    pub fn resolve(&self) -> Result<Vec<(String, Vars)>> {
        let base = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut depths = HashMap::new();
        let mut group_files: HashMap<&str, Vars> = HashMap::new();
        let mut resolved = Vec::with_capacity(self.hosts.len());

        for host in &self.hosts {
            let mut groups = Vec::new();
            for name in self.groups_of(host) {
                groups.push((self.depth(name, &mut depths, &mut Vec::new())?, name));
            }
            groups.sort();

            let mut vars = Vars::new();
            for (_, name) in &groups {
                vars.extend(self.groups[*name].vars.clone());
            }
            for (_, name) in &groups {
                if !group_files.contains_key(name) {
                    group_files.insert(*name, load_adjacent_vars(base, "group_vars", name)?);
                }
            }
            // `all` has depth 0 and therefore already sorts first.
            for (_, name) in &groups {
                vars.extend(group_files[name].clone());
            }
            vars.extend(host.vars.clone());
            vars.extend(load_adjacent_vars(base, "host_vars", &host.name)?);

            resolved.push((host.name.clone(), vars));
        }

        Ok(resolved)
    }

    fn add_group(&mut self, name: &str, block: &Value, parent: Option<&str>) -> Result<()> {
        let group = self.groups.entry(name.to_string()).or_default();
        if let Some(parent) = parent {
            if !group.parents.iter().any(|p| p == parent) {
                group.parents.push(parent.to_string());
            }
        }

        let block = match block {
            Value::Null => return Ok(()),
            Value::Mapping(block) => block,
            other => {
                return Err(self.invalid(format!(
                    "group '{name}' must be a mapping, found {}",
                    kind_of(other)
                )))
            }
        };

        for (key, value) in block {
            match key.as_str() {
                Some("vars") => {
                    let vars = vars_from_value(value, &self.path)?;
                    self.group_mut(name).vars.extend(vars);
                }
                Some("hosts") => self.add_hosts(name, value)?,
                Some("children") => match value {
                    Value::Null => {}
                    Value::Mapping(children) => {
                        for (child, child_block) in children {
                            let child = self.group_name(child)?;
                            self.add_group(&child, child_block, Some(name))?;
                        }
                    }
                    other => {
                        return Err(self.invalid(format!(
                            "children of group '{name}' must be a mapping, found {}",
                            kind_of(other)
                        )))
                    }
                },
                _ => tracing::warn!(
                    "Ignoring unknown key {:?} in group '{}' of {}",
                    key,
                    name,
                    self.path.display()
                ),
            }
        }

        Ok(())
    }

    fn add_hosts(&mut self, group: &str, hosts: &Value) -> Result<()> {
        let hosts = match hosts {
            Value::Null => return Ok(()),
            Value::Mapping(hosts) => hosts,
            other => {
                return Err(self.invalid(format!(
                    "hosts of group '{group}' must be a mapping, found {}",
                    kind_of(other)
                )))
            }
        };

        for (pattern, host_vars) in hosts {
            let pattern = scalar_to_string(pattern)
                .filter(|p| !p.is_empty())
                .ok_or_else(|| self.invalid(format!("invalid host name in group '{group}'")))?;
            let host_vars = vars_from_value(host_vars, &self.path)?;

            for host in expand_host_pattern(&pattern)? {
                let index = match self.host_index.get(&host) {
                    Some(index) => *index,
                    None => {
                        self.host_index.insert(host.clone(), self.hosts.len());
                        self.hosts.push(HostEntry {
                            name: host,
                            vars: Vars::new(),
                            groups: BTreeSet::new(),
                        });
                        self.hosts.len() - 1
                    }
                };
                let entry = &mut self.hosts[index];
                entry.vars.extend(host_vars.clone());
                if !entry.groups.contains(group) {
                    entry.groups.insert(group.to_string());
                }
            }
        }

        Ok(())
    }

    /// Every group `host` belongs to, ancestors and `all` included.
    fn groups_of<'a>(&'a self, host: &'a HostEntry) -> BTreeSet<&'a str> {
        let mut pending: Vec<&str> = host.groups.iter().map(String::as_str).collect();
        pending.push(ALL_GROUP);

        let mut found = BTreeSet::new();
        while let Some(name) = pending.pop() {
            if found.insert(name) {
                if let Some(group) = self.groups.get(name) {
                    pending.extend(group.parents.iter().map(String::as_str));
                }
            }
        }
        found
    }

    fn depth<'a>(
        &'a self,
        name: &'a str,
        cache: &mut HashMap<&'a str, usize>,
        visiting: &mut Vec<&'a str>,
    ) -> Result<usize> {
        if let Some(depth) = cache.get(name) {
            return Ok(*depth);
        }
        if visiting.contains(&name) {
            return Err(self.invalid(format!("group '{name}' is its own ancestor")));
        }

        visiting.push(name);
        let mut depth = 0;
        if let Some(group) = self.groups.get(name) {
            for parent in &group.parents {
                depth = depth.max(self.depth(parent, cache, visiting)? + 1);
            }
        }
        visiting.pop();

        cache.insert(name, depth);
        Ok(depth)
    }

    fn group_mut(&mut self, name: &str) -> &mut Group {
        self.groups.entry(name.to_string()).or_default()
    }

    fn group_name(&self, key: &Value) -> Result<String> {
        scalar_to_string(key)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| self.invalid(format!("invalid group name {key:?}")))
    }

    fn invalid(&self, reason: String) -> anyhow::Error {
        Error::InvalidInventory {
            path: self.path.clone(),
            reason,
        }
        .into()
    }
}
