use clap::{Args, Subcommand};

use grow_core::{MaintenanceLog, PartUsage};

use super::{parse_at, parse_pair};
use crate::config::Config;
use crate::storage::DataStore;

#[derive(Args)]
pub struct MaintenanceCommand {
    #[command(subcommand)]
    pub command: MaintenanceSubcommand,
}

#[derive(Subcommand)]
pub enum MaintenanceSubcommand {
    /// Record a completed maintenance task and the parts it used
    Complete {
        #[arg(long)]
        task_id: String,

        #[arg(long)]
        title: String,

        /// Site or room where the task was done
        #[arg(long)]
        location: String,

        /// Part used, as ITEM=QUANTITY with the unscoped item ID (can be repeated)
        #[arg(long = "part", value_name = "ITEM=QTY")]
        parts: Vec<String>,

        #[arg(long)]
        notes: Option<String>,

        /// Completion time, defaults to now
        #[arg(long)]
        at: Option<String>,
    },
}

fn parse_part(text: &str) -> Result<PartUsage, String> {
    let (item_id, quantity) = parse_pair::<f64>(text)?;
    if !quantity.is_finite() {
        return Err(format!("Invalid number in '{}'", text));
    }
    Ok(PartUsage::new(item_id, quantity))
}

impl MaintenanceCommand {
    pub fn run(
        &self,
        store: &DataStore,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            MaintenanceSubcommand::Complete {
                task_id,
                title,
                location,
                parts,
                notes,
                at,
            } => {
                let parts = parts
                    .iter()
                    .map(|p| parse_part(p))
                    .collect::<Result<Vec<_>, _>>()?;
                let log = MaintenanceLog::new(
                    task_id.as_str(),
                    title.as_str(),
                    config.collaborator.value.as_str(),
                    location.as_str(),
                    parse_at(at)?,
                )
                .with_notes(notes.clone().unwrap_or_default())
                .with_parts(parts);

                let mut data = store.load()?;
                let outcome = data.complete_maintenance(log)?;
                store.save(&data)?;

                println!("Completed '{}'", title);
                for item_id in &outcome.withdrawn {
                    println!("  - withdrew from {}", item_id);
                }
                for unmatched in &outcome.unmatched {
                    println!(
                        "  ! {} x{} not withdrawn: {}",
                        unmatched.part.inventory_item_id,
                        unmatched.part.quantity,
                        unmatched.reason
                    );
                }
                Ok(())
            }
        }
    }
}
