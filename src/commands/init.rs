use anyhow::Result;
use std::fs;
use std::path::PathBuf;

pub fn init_config(force: bool) -> Result<()> {
    let config_path = PathBuf::from("scoremap.toml");

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    let default_config = r#"# Scoremap workspace configuration

[collect]
# One command collecting every project at once; leave unset to run each
# project's own command sequentially.
# bulk_command = "npx nx run-many -t scoremap"

[compare]
# Base ref for CI regression comparison; unset disables comparison.
base = "origin/main"
skip_comment = false

[[project]]
name = "app"
root = "."
"#;

    fs::write(&config_path, default_config)?;
    println!("Created scoremap.toml configuration file");

    Ok(())
}
