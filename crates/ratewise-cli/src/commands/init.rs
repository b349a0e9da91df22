//! The `ratewise init` command.

use anyhow::Result;

use ratewise_client::config::SAMPLE_CONFIG;

pub fn execute() -> Result<()> {
    if std::path::Path::new("ratewise.toml").exists() {
        println!("ratewise.toml already exists, skipping.");
    } else {
        std::fs::write("ratewise.toml", SAMPLE_CONFIG)?;
        println!("Created ratewise.toml");
    }

    println!("\nNext steps:");
    println!("  1. Set RATEWISE_API_URL or edit [api] base_url in ratewise.toml");
    println!("  2. Run: ratewise login --username <name>");
    println!("  3. Run: ratewise members");

    Ok(())
}
