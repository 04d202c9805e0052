use clap::{Args, Subcommand};

use super::parse_finite;
use crate::storage::DataStore;

#[derive(Args)]
pub struct InventoryCommand {
    #[command(subcommand)]
    pub command: InventorySubcommand,
}

#[derive(Subcommand)]
pub enum InventorySubcommand {
    /// Record a purchase (or a negative correction) for an item
    Purchase {
        /// Site-scoped item ID, e.g. inv-yc-loc-mc
        item_id: String,

        /// Quantity in the item's purchase unit
        #[arg(allow_hyphen_values = true, value_parser = parse_finite)]
        quantity: f64,

        /// Total paid
        #[arg(allow_hyphen_values = true, value_parser = parse_finite)]
        total_cost: f64,
    },

    /// Show stock and cost basis of an item
    Show { item_id: String },

    /// List items, optionally for one site
    List {
        #[arg(long)]
        site: Option<String>,
    },
}

impl InventoryCommand {
    pub fn run(&self, store: &DataStore) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            InventorySubcommand::Purchase {
                item_id,
                quantity,
                total_cost,
            } => {
                let mut data = store.load()?;
                let item = data
                    .find_item_mut(item_id)
                    .ok_or_else(|| format!("Inventory item not found: {}", item_id))?;
                let purchase = item.record_purchase(*quantity, *total_cost)?.clone();
                tracing::info!(item = %item_id, quantity = purchase.quantity, "Recorded purchase");

                println!(
                    "Recorded {} {} for {:.2}\n",
                    purchase.quantity, item.unit, purchase.total_cost
                );
                print!("{}", item);
                store.save(&data)?;
                Ok(())
            }

            InventorySubcommand::Show { item_id } => {
                let data = store.load()?;
                let item = data
                    .find_item(item_id)
                    .ok_or_else(|| format!("Inventory item not found: {}", item_id))?;
                print!("{}", item);
                Ok(())
            }

            InventorySubcommand::List { site } => {
                let data = store.load()?;
                let items: Vec<_> = data
                    .inventory
                    .iter()
                    .filter(|i| site.as_ref().map_or(true, |s| &i.location_id == s))
                    .collect();
                if items.is_empty() {
                    println!("No inventory items found.");
                }
                for item in items {
                    println!(
                        "{:<28} {:>12.2} {:<6} @ {:.4}  [{}]",
                        item.id,
                        item.current_stock(),
                        item.unit,
                        item.average_cost_per_unit(),
                        item.kind
                    );
                }
                Ok(())
            }
        }
    }
}
