use std::path::PathBuf;

use clap::Parser;
use tracing::instrument;
use volet::Store;

use super::{terminal::Colorize, OutputFormat};

#[derive(Debug, Parser)]
#[command(about = "Show how many records the workspace holds and their size on disk")]
pub struct Info {
    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,
}

impl Info {
    #[instrument(level = "debug")]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let store = Store::open(root)?;
        let info = store.storage_info()?;

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
            OutputFormat::Table => {
                println!("Workspace: {}", store.root().display().to_string().dim());
                println!("  Projects:  {}", info.project_count);
                println!("  Shutters:  {}", info.shutter_count);
                println!("  Storage:   {}", info.storage_size);
                println!("  History:   {}/{}", store.history().len(), store.history().limit());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Parser)]
#[command(about = "Delete every project, favourite and quick calculation")]
pub struct Clear {
    /// Skip the confirmation prompt
    #[arg(long, short)]
    yes: bool,
}

impl Clear {
    #[instrument(level = "debug")]
    pub fn run(self, root: PathBuf) -> anyhow::Result<()> {
        let mut store = Store::open(root)?;

        if !self.yes {
            let info = store.storage_info()?;
            let confirmed = dialoguer::Confirm::new()
                .with_prompt(format!(
                    "Delete {} projects and {} shutters? This cannot be undone",
                    info.project_count, info.shutter_count
                ))
                .default(false)
                .interact()?;
            if !confirmed {
                println!("Cancelled");
                return Ok(());
            }
        }

        store.clear_all()?;
        println!("{}", "All data deleted".success());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::cli::testing::seed;

    #[test]
    fn info_runs_in_every_format() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        seed(&root);

        for output in [OutputFormat::Table, OutputFormat::Json] {
            Info { output }.run(root.clone()).expect("info should succeed");
        }
    }

    #[test]
    fn clear_with_yes_skips_the_prompt() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        seed(&root);

        Clear { yes: true }.run(root.clone()).unwrap();

        let store = Store::open(root).unwrap();
        assert!(store.projects().is_empty());
        assert!(store.favorites().projects.is_empty());
    }
}
