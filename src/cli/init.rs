//! tdl init command implementation
//!
//! Creates the store root, an empty store and a default `tdl.toml`.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::{load_context, output_options, GlobalOptions};
use crate::config::Config;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

#[derive(Serialize)]
struct InitReport {
    root: PathBuf,
    created: InitCreated,
}

#[derive(Serialize)]
struct InitCreated {
    config: bool,
    store: bool,
}

pub fn run(globals: GlobalOptions) -> Result<()> {
    let ctx = load_context(globals.root.clone())?;
    let created_store = ctx.store.init()?;
    let created_config = ensure_config(&ctx.store.storage().config_file(), &ctx.config)?;
    let root = ctx.store.storage().root().to_path_buf();

    let report = InitReport {
        root: root.clone(),
        created: InitCreated {
            config: created_config,
            store: created_store,
        },
    };

    let mut created_items = Vec::new();
    if created_config {
        created_items.push("tdl.toml");
    }
    if created_store {
        created_items.push("store.json");
    }

    let header = if created_items.is_empty() {
        "tdl already initialized"
    } else {
        "tdl initialized"
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("Root", root.display().to_string());
    human.push_summary(
        "Created",
        if created_items.is_empty() {
            "none".to_string()
        } else {
            created_items.join(", ")
        },
    );
    human.push_next_step("tdl universe new <name>");

    emit_success(output_options(&globals), "init", &report, Some(&human))
}

fn ensure_config(path: &Path, config: &Config) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    config.save(path)?;
    Ok(true)
}
