#![allow(dead_code)]

pub mod fake_directory;

use std::fs;
use std::process::{Command, Output};
use std::sync::Arc;
use tempfile::TempDir;

pub use fake_directory::{FakeDirectory, RecordedRequest, TOKEN};

/// Helper struct to run userdeck commands in an isolated temp directory
pub struct UserdeckTest {
    pub temp_dir: TempDir,
    envs: Vec<(String, String)>,
}

impl UserdeckTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        UserdeckTest {
            temp_dir,
            envs: Vec::new(),
        }
    }

    /// Point the CLI at `base_url` with a bearer token already exported.
    pub fn against(base_url: &str) -> Self {
        Self::new()
            .env("USERDECK_BASE_URL", base_url)
            .env("USERDECK_TOKEN", TOKEN)
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn write_config(&self, content: &str) {
        let dir = self.temp_dir.path().join(".userdeck");
        fs::create_dir_all(&dir).expect("Failed to create .userdeck directory");
        fs::write(dir.join("config.yaml"), content).expect("Failed to write config file");
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_userdeck"))
            .args(args)
            .current_dir(self.temp_dir.path())
            .env_remove("USERDECK_BASE_URL")
            .env_remove("USERDECK_API_KEY")
            .env_remove("USERDECK_TOKEN")
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .output()
            .expect("Failed to execute userdeck command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Expected command {:?} to fail, but it succeeded",
            args
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }
}

/// Run the CLI on a blocking thread so an in-process fake server keeps serving.
pub async fn run_async(test: &Arc<UserdeckTest>, args: &[&str]) -> Output {
    let test = Arc::clone(test);
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        test.run(&args)
    })
    .await
    .expect("CLI task panicked")
}

pub fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "command failed\nstdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}
