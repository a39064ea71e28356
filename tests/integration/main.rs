//! Integration tests for Crossgo

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn crossgo() -> Command {
        let mut cmd = cargo_bin_cmd!("crossgo");
        cmd.env_remove("CROSSGO_CONFIG").env_remove("XGO_IN_XGO");
        cmd
    }

    fn write_config(dir: &Path, body: &str) -> String {
        let path = dir.join("config.toml");
        fs::write(&path, body).unwrap();
        path.display().to_string()
    }

    #[test]
    fn help_displays() {
        crossgo()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Go cross compilation in containers"))
            .stdout(predicate::str::contains("--targets"));
    }

    #[test]
    fn version_displays() {
        crossgo()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("crossgo"));
    }

    #[test]
    fn missing_source_is_usage_error() {
        crossgo()
            .assert()
            .failure()
            .stderr(predicate::str::contains("<SOURCE>"));
    }

    #[test]
    fn invalid_config_is_reported() {
        let dir = TempDir::new().unwrap();
        let config = write_config(dir.path(), "[runtime\nbinary = ");

        crossgo()
            .args(["--config", &config, "./app"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn missing_runtime_prints_hint() {
        let dir = TempDir::new().unwrap();
        let config = write_config(
            dir.path(),
            "[runtime]\nbinary = \"/nonexistent/crossgo-docker\"\n",
        );

        crossgo()
            .env("CROSSGO_CONFIG", &config)
            .arg("./app")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[cfg(unix)]
    #[test]
    fn module_build_with_fake_runtime() {
        let dir = TempDir::new().unwrap();
        let calls = dir.path().join("calls.log");
        let script = dir.path().join("docker.sh");
        fs::write(
            &script,
            format!("echo \"$@\" >> \"{}\"\n", calls.display()),
        )
        .unwrap();
        let config = write_config(
            dir.path(),
            &format!(
                "[runtime]\nbinary = \"sh\"\nargs = [\"{}\"]\n\n[cache]\ndir = \"{}\"\n",
                script.display(),
                dir.path().join("cache").display()
            ),
        );
        let app = dir.path().join("app");
        fs::create_dir(&app).unwrap();
        fs::write(app.join("go.mod"), "module example.com/app\n").unwrap();
        let dest = dir.path().join("dist");

        crossgo()
            .args(["--config", &config, "--targets", "linux/arm64", "--dest"])
            .arg(&dest)
            .arg(&app)
            .assert()
            .success()
            .stderr(predicate::str::contains("Completed!"));

        let log = fs::read_to_string(&calls).unwrap();
        let run = log.lines().last().unwrap();
        assert!(run.starts_with("run --rm"));
        assert!(run.contains(&format!("{}:/build", dest.display())));
        assert!(run.contains("TARGETS=linux/arm64"));
    }
}
