//! `inspect` command.

use crate::{
    binder::payload::overlay,
    cli::{RuntimeConfig, args::InspectArgs},
    error::Result,
};

/// Prints the label and entries carried by a produced executable.
///
/// Exits with 1 when the file carries no payload.
pub async fn execute_inspect(args: &InspectArgs, config: &RuntimeConfig) -> Result<i32> {
    let path = args.executable.clone();
    let reader = tokio::task::spawn_blocking(move || overlay::open(&path))
        .await
        .map_err(anyhow::Error::from)??;

    let Some(reader) = reader else {
        config.error(&format!(
            "{} carries no bound files",
            args.executable.display()
        ))?;
        return Ok(1);
    };
    let header = reader.header();

    if args.json {
        config.output().plain(&serde_json::to_string_pretty(header)?)?;
        return Ok(0);
    }

    config.success(&format!(
        "{}: label {:?}, {} files",
        args.executable.display(),
        header.label,
        header.entries.len()
    ))?;
    for entry in &header.entries {
        config.indent(&format!(
            "{} ({} bytes){}{}",
            entry.name,
            entry.size,
            if entry.is_executable { " [exec]" } else { "" },
            if entry.is_administrator { " [admin]" } else { "" },
        ))?;
    }
    if header.requires_elevation() {
        config.verbose_println("Runs elevated when started")?;
    }

    Ok(0)
}
