#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

/// Catalog with three published posts over two days, one draft, one
/// category and one author.
#[allow(dead_code)]
pub const CATALOG: &str = r#"{
  "posts": [
    {"id": 1, "url": "https://example.com/2024/07/10/first", "date": "2024-07-10",
     "modified": "2024-07-10T09:00:00Z",
     "images": [{"url": "https://example.com/img/first.jpg", "title": "First"}]},
    {"id": 2, "url": "https://example.com/2024/07/10/second", "date": "2024-07-10",
     "modified": "2024-07-10T10:00:00Z"},
    {"id": 3, "url": "https://example.com/2024/07/11/third", "date": "2024-07-11",
     "modified": "2024-07-11T09:00:00Z"},
    {"id": 4, "url": "https://example.com/2024/07/12/draft", "date": "2024-07-12",
     "modified": "2024-07-12T09:00:00Z", "status": "draft"}
  ],
  "terms": [
    {"id": 10, "taxonomy": "category", "url": "https://example.com/category/news", "count": 3}
  ],
  "authors": [
    {"id": 20, "url": "https://example.com/author/sam", "post_count": 3}
  ]
}"#;

/// An isolated site: config file, data root and content catalog in a tempdir.
#[allow(dead_code)]
pub struct Site {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl Site {
    /// A site with the sample catalog and zero task spacing.
    pub fn new() -> Self {
        Self::with_generation("interval_secs = 0\n")
    }

    /// A site whose `[generation]` table is `generation`.
    pub fn with_generation(generation: &str) -> Self {
        let dir = tempfile::tempdir().expect("failed to create site dir");
        let site = Self { dir };
        fs::create_dir_all(site.data_dir()).unwrap();
        fs::write(site.data_dir().join("catalog.json"), CATALOG).unwrap();
        let config = format!(
            "[site]\nbase_url = \"https://example.com\"\n\n[generation]\n{generation}\n[paths]\nroot = {:?}\n",
            site.data_dir().display().to_string()
        );
        fs::write(site.config_path(), config).unwrap();
        site
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("sitemap.toml")
    }

    pub fn remove_catalog(&self) {
        fs::remove_file(self.data_dir().join("catalog.json")).unwrap();
    }

    /// A `sitemapctl` command bound to this site.
    pub fn cmd(&self) -> Command {
        sitemapctl_cmd(&self.config_path(), &self.data_dir())
    }

    /// Run `args` expecting success and parse stdout as JSON.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let out = self
            .cmd()
            .args(args)
            .arg("--json")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("stdout is not JSON")
    }
}

/// Create a configured `sitemapctl` command suitable for integration tests.
#[allow(dead_code)]
pub fn sitemapctl_cmd(config: &Path, data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sitemapctl"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env("SITEMAP_CONFIG", config);
    cmd.env("SITEMAP_DATA_DIR", data_dir);
    cmd.env_remove("SITEMAP_OUTPUT_FORMAT");
    cmd.env("NO_COLOR", "1");
    cmd
}
