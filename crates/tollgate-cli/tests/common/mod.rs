use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const PRIVATE_KEY: &str = include_str!("../../../tollgate-core/testdata/private.pem");
const PUBLIC_KEY: &str = include_str!("../../../tollgate-core/testdata/public.pem");

/// An isolated home directory, store, and config file for one test.
pub struct TestEnv {
    _dir: TempDir,
    home: PathBuf,
    config: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_access_ttl(900)
    }

    pub fn with_access_ttl(access_ttl_secs: u64) -> Self {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        std::fs::create_dir_all(&home).unwrap();

        let config = dir.path().join("tollgate.toml");
        let content = format!(
            "data_dir = \"store\"\n\
             \n\
             [auth]\n\
             issuer = \"tollgate\"\n\
             audience = \"tollgate-cli\"\n\
             work_factor = 4\n\
             access_token_ttl_secs = {}\n\
             leeway_secs = 0\n\
             private_key = '''\n{}'''\n\
             public_key = '''\n{}'''\n",
            access_ttl_secs, PRIVATE_KEY, PUBLIC_KEY
        );
        std::fs::write(&config, content).unwrap();

        Self {
            _dir: dir,
            home,
            config,
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn store_dir(&self) -> PathBuf {
        self.config.parent().unwrap().join("store")
    }

    /// Run the CLI with this environment's HOME and config.
    pub fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_tollgate"));
        cmd.args(args);
        cmd.env("HOME", &self.home);
        cmd.env("XDG_DATA_HOME", self.home.join("data"));
        cmd.env("XDG_CONFIG_HOME", self.home.join("config"));
        cmd.env("TOLLGATE_CONFIG", &self.config);
        cmd.env_remove("RUST_LOG");
        cmd.output().expect("Failed to execute CLI")
    }

    /// Run the CLI and expect success.
    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn create_jane(&self) {
        self.run_success(&[
            "create-user",
            "--username",
            "jane",
            "--email",
            "jane@example.com",
            "--password",
            "Password123!",
        ]);
    }

    pub fn login_jane(&self) -> String {
        self.run_success(&[
            "login",
            "--email",
            "jane@example.com",
            "--password",
            "Password123!",
        ])
    }
}
