//! Configuration display.

use console::style;

use crate::config::Settings;

/// Print the effective settings as TOML. The token is never shown.
pub fn cmd_config_show(settings: &Settings) -> anyhow::Result<()> {
    let rendered = toml::to_string_pretty(settings)?;
    print!("{}", rendered);
    let token = if settings.token.is_some() {
        style("set").green()
    } else {
        style("not set").yellow()
    };
    println!("# token: {}", token);
    Ok(())
}
