use clap::{Args, Subcommand};

use grow_core::schedule::scheduled_formula_id;
use grow_core::{resolve_formula, Stage};

use crate::storage::DataStore;

#[derive(Args)]
pub struct FormulaCommand {
    #[command(subcommand)]
    pub command: FormulaSubcommand,
}

#[derive(Subcommand)]
pub enum FormulaSubcommand {
    /// Show the formula scheduled for a week of a stage
    Show {
        /// Stage (cloning, pre-vegetation, vegetation, flowering, ...)
        stage: String,

        /// Week within the stage, starting at 1
        week: u32,
    },

    /// List the formula catalog
    List,
}

impl FormulaCommand {
    pub fn run(&self, store: &DataStore) -> Result<(), Box<dyn std::error::Error>> {
        let data = store.load()?;
        match &self.command {
            FormulaSubcommand::Show { stage, week } => {
                let stage: Stage = stage.parse()?;
                match resolve_formula(stage, *week, &data.formula_schedule, &data.formulas) {
                    Some(formula) => print!("{}", formula),
                    None => match scheduled_formula_id(stage, *week, &data.formula_schedule) {
                        Some(id) => println!("Scheduled formula {} is not in the catalog.", id),
                        None => println!("No formula scheduled for {} week {}.", stage, week),
                    },
                }
                Ok(())
            }

            FormulaSubcommand::List => {
                if data.formulas.is_empty() {
                    println!("No formulas found.");
                }
                for formula in &data.formulas {
                    print!("{}", formula);
                    println!();
                }
                Ok(())
            }
        }
    }
}
