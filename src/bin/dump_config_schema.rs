//! Prints the JSON schema of the configuration file, or writes it to the
//! path given as the first argument.

use anyhow::{Context, Result};

fn main() -> Result<()> {
    let schema = pulsetouch::Config::json_schema();
    let rendered = serde_json::to_string_pretty(&schema)?;
    match std::env::args_os().nth(1) {
        Some(path) => std::fs::write(&path, rendered + "\n")
            .with_context(|| format!("Failed to write schema to {}", path.to_string_lossy()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}
