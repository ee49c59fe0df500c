//! Prints the JSON schema of `config.toml`, or writes it to the path given
//! as the first argument.

use anyhow::{Context, Result};
use std::{env, fs};

fn main() -> Result<()> {
    let schema = serde_json::to_string_pretty(&tilemark::Config::json_schema())?;
    match env::args_os().nth(1) {
        Some(path) => fs::write(&path, schema).with_context(|| {
            format!("Failed to write schema to {}", path.to_string_lossy())
        })?,
        None => println!("{schema}"),
    }
    Ok(())
}
