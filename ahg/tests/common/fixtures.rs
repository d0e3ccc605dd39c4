use std::fs;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// A temp project directory the hook binary runs against.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp project"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_config(&self, body: &str) {
        fs::write(self.path().join(".ahg.toml"), body).expect("failed to write config");
    }

    pub fn write_file(&self, rel: &str, content: &str) {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        fs::write(path, content).expect("failed to write file");
    }

    pub fn read_file(&self, rel: &str) -> String {
        fs::read_to_string(self.path().join(rel)).expect("failed to read file")
    }

    /// Run the hook binary with the project as cwd, feeding `payload` on
    /// stdin.
    pub fn run_hook(&self, subcommand: &str, payload: &str) -> Output {
        let mut child = Command::new(env!("CARGO_BIN_EXE_ahg"))
            .arg(subcommand)
            .current_dir(self.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to start ahg");
        {
            use std::io::Write;
            let stdin = child.stdin.as_mut().expect("failed to open stdin");
            stdin
                .write_all(payload.as_bytes())
                .expect("failed to write hook input");
        }
        child.wait_with_output().expect("failed to read hook output")
    }

    pub fn git(&self, args: &[&str]) {
        let status = Command::new("git")
            .arg("-C")
            .arg(self.path())
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .expect("git should be runnable");
        assert!(status.success(), "git {args:?} failed");
    }

    pub fn init_repo(&self) {
        self.git(&["init", "-q"]);
        self.git(&["config", "user.email", "test@example.com"]);
        self.git(&["config", "user.name", "Test"]);
    }

    pub fn commit_all(&self, message: &str) {
        self.git(&["add", "-A"]);
        self.git(&["commit", "-q", "-m", message]);
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Exit code of a finished hook invocation.
pub fn exit_code(output: &Output) -> i32 {
    output.status.code().expect("hook terminated by signal")
}

pub fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
