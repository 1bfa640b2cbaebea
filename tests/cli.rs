use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn inventory() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("inventory");
    write(
        &root,
        "prod-web/hosts.yml",
        r#"
all:
  hosts:
    web1:
      ansible_host: 10.0.0.5
      ansible_port: 2222
"#,
    );
    write(
        &root,
        "staging/hosts.yml",
        r#"
all:
  vars:
    ansible_ssh_common_args: -o ProxyCommand="ssh -W %h:%p jump"
  hosts:
    jump:
      ansible_host: 198.51.100.1
      ansible_ssh_common_args: ""
    app[1:2]:
"#,
    );
    write(&root, "staging/group_vars/all.yml", "ansible_port: 2200\n");
    temp
}

fn run(temp: &TempDir, args: &[&str]) -> Output {
    let xdg = temp.path().join("xdg");
    Command::new(env!("CARGO_BIN_EXE_ssh-inventory"))
        .arg("--inventory")
        .arg(temp.path().join("inventory"))
        .args(args)
        .env("XDG_CONFIG_HOME", &xdg)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run ssh-inventory")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn test_completion_clients() {
    let temp = inventory();
    assert_eq!(stdout(&run(&temp, &["--completion", "clients"])), "prod staging\n");
}

#[test]
fn test_completion_hosts_and_both() {
    let temp = inventory();
    assert_eq!(
        stdout(&run(&temp, &["--completion", "hosts"])),
        "web1 jump app1 app2\n"
    );
    assert_eq!(
        stdout(&run(&temp, &["--completion", "hosts", "--client", "staging"])),
        "jump app1 app2\n"
    );
    assert_eq!(
        stdout(&run(&temp, &["--completion", "both"])),
        "prod staging web1 jump app1 app2\n"
    );
}

#[test]
fn test_ssh_string() {
    let temp = inventory();
    assert_eq!(
        stdout(&run(&temp, &["--string", "web1", "--client", "prod"])),
        "-p 2222 10.0.0.5\n"
    );
    assert_eq!(
        stdout(&run(&temp, &["--string", "app1"])),
        "-p 2200 -o ProxyCommand=\"ssh -W %h:%p 198.51.100.1\" app1\n"
    );
    assert_eq!(
        stdout(&run(&temp, &["--string", "app1", "--quote-opts-quotes"])),
        "-p 2200 -o ProxyCommand='\"ssh -W %h:%p 198.51.100.1\"' app1\n"
    );
}

#[test]
fn test_unknown_host_prints_nothing() {
    let temp = inventory();
    assert_eq!(stdout(&run(&temp, &["--string", "nope"])), "");
    assert_eq!(stdout(&run(&temp, &["--string", "web1", "--client", "staging"])), "");
}

#[test]
fn test_config_generation() {
    let temp = inventory();
    let ssh = temp.path().join("ssh");
    let main = ssh.join("config");
    let config_dir = ssh.join("config.d");
    write(&ssh, "config", "Host *\n  ServerAliveInterval 30\n");

    let args = [
        "--config",
        "--config-dir",
        config_dir.to_str().unwrap(),
        "--config-main",
        main.to_str().unwrap(),
    ];
    let first = stdout(&run(&temp, &args));
    assert!(first.contains("prod: 1 hosts"));
    assert!(first.contains("Adding 'Include config.d/*'"));

    let prod = fs::read_to_string(config_dir.join("prod")).unwrap();
    assert_eq!(prod, "Host web1\n  HostName 10.0.0.5\n  Port 2222\n\n");
    let staging = fs::read_to_string(config_dir.join("staging")).unwrap();
    assert!(staging.starts_with("Host jump\n  HostName 198.51.100.1\n  Port 2200\n\n"));
    assert!(staging.contains("Host app2\n  HostName app2\n  Port 2200\n  Options -o ProxyCommand=\"ssh -W %h:%p jump\"\n"));

    let second = stdout(&run(&temp, &args));
    assert!(!second.contains("Adding"));
    assert_eq!(fs::read_to_string(config_dir.join("prod")).unwrap(), prod);
    assert_eq!(
        fs::read_to_string(&main).unwrap(),
        "Include config.d/*\n\nHost *\n  ServerAliveInterval 30\n"
    );
}

#[test]
fn test_config_for_one_client() {
    let temp = inventory();
    let config_dir = temp.path().join("ssh/config.d");
    let main = temp.path().join("ssh/config");

    stdout(&run(
        &temp,
        &[
            "--config",
            "--client",
            "prod",
            "--config-dir",
            config_dir.to_str().unwrap(),
            "--config-main",
            main.to_str().unwrap(),
        ],
    ));
    assert!(config_dir.join("prod").exists());
    assert!(!config_dir.join("staging").exists());
}

#[test]
fn test_missing_inventory_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_ssh-inventory"))
        .args(["--inventory", "/nonexistent/inventory", "--completion", "clients"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn test_mode_is_required() {
    let temp = inventory();
    let output = run(&temp, &[]);
    assert!(!output.status.success());
}

#[test]
fn test_uncreatable_config_dir_is_reported() {
    let temp = inventory();
    let blocker = temp.path().join("file");
    fs::write(&blocker, "not a directory\n").unwrap();
    let config_dir = blocker.join("config.d");
    let main = temp.path().join("ssh_config");

    let output = run(
        &temp,
        &[
            "--config",
            "--config-dir",
            config_dir.to_str().unwrap(),
            "--config-main",
            main.to_str().unwrap(),
        ],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(&format!(
        "Directory creation failed: {}",
        config_dir.display()
    )));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to write SSH config"));
    assert!(!main.exists());
}
