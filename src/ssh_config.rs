use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;

use crate::config::expand_tilde;
use crate::inventory::Inventory;
use crate::models::ClientHosts;

const CONFIG_DIR_MODE: u32 = 0o700;
const CONFIG_FILE_MODE: u32 = 0o600;

/// Render the `Host` blocks of one client. Hosts without any attribute are
/// left out.
pub fn render_client_config(hosts: &ClientHosts) -> String {
    let mut out = String::new();
    for (id, host) in hosts {
        let params = host.params();
        if params.is_empty() {
            continue;
        }
        out.push_str(&format!("Host {id}\n"));
        for (param, value) in params {
            out.push_str(&format!("  {param} {value}\n"));
        }
        out.push('\n');
    }
    out
}

/// Write one config file per client into `config_dir`.
pub fn write_client_configs(inventory: &Inventory, config_dir: &Path) -> Result<()> {
    ensure_config_dir(config_dir);

    for (client, hosts) in inventory.clients() {
        println!("{}: {} hosts", client, hosts.len());
        for (id, host) in hosts {
            println!("{client}: adding {id} with {host}");
        }

        let path = config_dir.join(client);
        write_atomic(&path, &render_client_config(hosts), CONFIG_FILE_MODE)
            .with_context(|| format!("Failed to write SSH config for client '{client}'"))?;
        tracing::info!("Wrote {} hosts to {}", hosts.len(), path.display());
    }

    Ok(())
}

/// Create `config_dir` (mode 0700) if missing. Failure is reported but not
/// fatal; the following write reports the real error.
pub fn ensure_config_dir(config_dir: &Path) {
    if config_dir.is_dir() {
        return;
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(CONFIG_DIR_MODE);
    }

    if let Err(e) = builder.create(config_dir) {
        println!("Directory creation failed: {}", config_dir.display());
        tracing::warn!("Failed to create {}: {}", config_dir.display(), e);
    }
}

/// Make sure `config_main` includes every file of `config_dir`. Returns
/// whether the main config was changed.
pub fn ensure_include(config_main: &Path, config_dir: &Path) -> Result<bool> {
    let main_dir = absolute(config_main.parent().unwrap_or_else(|| Path::new("")))?;
    let config_dir = absolute(config_dir)?;
    let directive = format!("Include {}/*", relative_path(&main_dir, &config_dir).display());

    // Symlinked configs are rewritten at their target, leaving the link intact.
    let (write_path, existing, mode) = if config_main.exists() {
        let real = fs::canonicalize(config_main)
            .with_context(|| format!("Failed to resolve {}", config_main.display()))?;
        let content = fs::read_to_string(&real)
            .with_context(|| format!("Failed to read {}", config_main.display()))?;
        let mode = current_mode(&real)?;
        (real, content, mode)
    } else {
        (config_main.to_path_buf(), String::new(), CONFIG_FILE_MODE)
    };

    let target = config_dir.join("*");
    if existing
        .lines()
        .any(|line| line.trim_end() == directive || includes(line, &main_dir, &target))
    {
        tracing::debug!("{} already includes {}", config_main.display(), target.display());
        return Ok(false);
    }

    println!("Adding '{}' to {}", directive, config_main.display());
    write_atomic(&write_path, &format!("{directive}\n\n{existing}"), mode)
        .with_context(|| format!("Failed to update {}", config_main.display()))?;
    Ok(true)
}

/// Whether `line` is an `Include` directive naming `target`.
fn includes(line: &str, main_dir: &Path, target: &Path) -> bool {
    let mut words = line.split_whitespace();
    if !words
        .next()
        .is_some_and(|keyword| keyword.eq_ignore_ascii_case("include"))
    {
        return false;
    }

    words.any(|pattern| {
        let pattern = expand_tilde(Path::new(pattern.trim_matches('"')));
        normalize(&main_dir.join(pattern)) == normalize(target)
    })
}

/// Write `content` to a temporary file next to `path`, then rename it over
/// `path`.
fn write_atomic(path: &Path, content: &str, mode: u32) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    file.write_all(content.as_bytes())
        .context("Failed to write temporary file")?;
    set_mode(file.as_file(), mode)?;
    file.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(unix)]
fn set_mode(file: &fs::File, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(mode))
        .context("Failed to set file permissions")
}

#[cfg(not(unix))]
fn set_mode(_file: &fs::File, _mode: u32) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
fn current_mode(path: &Path) -> Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    let metadata =
        fs::metadata(path).with_context(|| format!("Failed to stat {}", path.display()))?;
    Ok(metadata.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn current_mode(_path: &Path) -> Result<u32> {
    Ok(CONFIG_FILE_MODE)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    Ok(normalize(&cwd.join(path)))
}

/// Lexically resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// `to` relative to the directory `from`; both must be absolute and
/// normalized.
fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..from.len() {
        relative.push("..");
    }
    for component in &to[common..] {
        relative.push(component);
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}
