#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

pub struct TestRoot {
    dir: TempDir,
}

impl TestRoot {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store_file(&self) -> PathBuf {
        self.dir.path().join("store.json")
    }

    pub fn config_file(&self) -> PathBuf {
        self.dir.path().join("tdl.toml")
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.config_file();
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// `tdl` pointed at this root through the environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = tdl_cmd();
        cmd.env("TDL_ROOT", self.dir.path());
        cmd
    }

    /// Run a command with `--json` and return the parsed envelope.
    pub fn json(&self, args: &[&str]) -> Result<Value, Box<dyn std::error::Error>> {
        let output = self.cmd().args(args).arg("--json").output()?;
        let value: Value = serde_json::from_slice(&output.stdout)?;
        Ok(value)
    }

    /// Run a command with `--json` and return its `data` payload, requiring success.
    pub fn data(&self, args: &[&str]) -> Result<Value, Box<dyn std::error::Error>> {
        let envelope = self.json(args)?;
        if envelope["status"] != "success" {
            return Err(format!("tdl {args:?} failed: {envelope}").into());
        }
        Ok(envelope["data"].clone())
    }

    pub fn universe(&self, name: &str) -> Result<i64, Box<dyn std::error::Error>> {
        id_of(&self.data(&["universe", "new", name])?)
    }

    pub fn category(&self, universe: i64, name: &str) -> Result<i64, Box<dyn std::error::Error>> {
        id_of(&self.data(&["category", "new", &universe.to_string(), name])?)
    }

    pub fn item(
        &self,
        category: i64,
        content: &str,
        due: Option<&str>,
    ) -> Result<i64, Box<dyn std::error::Error>> {
        let category = category.to_string();
        let mut args = vec!["item", "add", category.as_str(), content];
        if let Some(due) = due {
            args.extend(["--due", due]);
        }
        id_of(&self.data(&args)?)
    }

    pub fn show(&self, id: i64) -> Result<Value, Box<dyn std::error::Error>> {
        self.data(&["item", "show", &id.to_string()])
    }

    /// Item ids of a category in display order.
    pub fn category_order(&self, category: i64) -> Result<Vec<i64>, Box<dyn std::error::Error>> {
        let data = self.data(&["item", "list", "--category", &category.to_string()])?;
        ids_of(&data["items"])
    }
}

pub fn tdl_cmd() -> Command {
    let mut cmd = Command::cargo_bin("tdl").expect("tdl binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

pub fn id_of(value: &Value) -> Result<i64, Box<dyn std::error::Error>> {
    value["id"]
        .as_i64()
        .ok_or_else(|| format!("missing id in {value}").into())
}

pub fn ids_of(items: &Value) -> Result<Vec<i64>, Box<dyn std::error::Error>> {
    items
        .as_array()
        .ok_or("expected an array")?
        .iter()
        .map(id_of)
        .collect()
}
