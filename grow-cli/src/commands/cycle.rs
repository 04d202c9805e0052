use clap::{Args, Subcommand};

use grow_core::models::IrrigationKind;
use grow_core::{
    project_calendar, weeks_around, BatchDraw, CostBreakdown, CultivationCycle, Irrigation,
    LogEntry, Stage,
};

use super::{parse_at, parse_finite, parse_pair, OutputFormat};
use crate::storage::DataStore;

/// Widest calendar window, in weeks, on either side of today
const MAX_CALENDAR_WEEKS: i64 = 520;

#[derive(Args)]
pub struct CycleCommand {
    #[command(subcommand)]
    pub command: CycleSubcommand,
}

#[derive(Subcommand)]
pub enum CycleSubcommand {
    /// List cycles with their current stage
    List {
        /// Include archived cycles
        #[arg(long)]
        all: bool,
    },

    /// Start a cycle with plants drawn from batches
    Start {
        /// Genetics ID
        genetics: String,

        /// Room the cycle grows in
        location: String,

        /// Cloning date (RFC 3339 or YYYY-MM-DD), defaults to now
        #[arg(long)]
        cloned_at: Option<String>,

        /// Plants to draw, as BATCH=COUNT (can be repeated)
        #[arg(long = "batch", value_name = "BATCH=COUNT")]
        batches: Vec<String>,
    },

    /// Show the stage of a cycle
    Stage {
        cycle_id: String,

        /// Instant to evaluate at, defaults to now
        #[arg(long)]
        at: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Record that a cycle entered a stage
    Advance {
        cycle_id: String,

        /// Stage entered (pre-vegetation, vegetation, flowering, drying-curing, harvested)
        stage: String,

        /// Transition time, defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// Log an irrigation and price it
    Irrigate {
        cycle_id: String,

        /// Litres applied
        #[arg(long, value_parser = parse_finite)]
        volume: f64,

        #[arg(long, value_parser = parse_finite)]
        ph: f64,

        #[arg(long, value_parser = parse_finite)]
        ppm: f64,

        /// Runoff pH
        #[arg(long, value_parser = parse_finite)]
        ph_out: Option<f64>,

        /// Runoff ppm
        #[arg(long, value_parser = parse_finite)]
        ppm_out: Option<f64>,

        /// Supplement feed rather than the scheduled nutrients
        #[arg(long)]
        supplements: bool,

        #[arg(long)]
        notes: Option<String>,

        /// Entry time, defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// Show the feeding calendar around today
    Calendar {
        cycle_id: String,

        /// Weeks to show before the current one
        #[arg(
            long,
            default_value = "4",
            value_parser = clap::value_parser!(u32).range(0..=MAX_CALENDAR_WEEKS)
        )]
        back: u32,

        /// Weeks to show from the current one on
        #[arg(
            long,
            default_value = "8",
            value_parser = clap::value_parser!(u32).range(0..=MAX_CALENDAR_WEEKS)
        )]
        ahead: u32,
    },
}

impl CycleCommand {
    pub fn run(&self, store: &DataStore) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            CycleSubcommand::List { all } => {
                let data = store.load()?;
                let cycles: Vec<&CultivationCycle> =
                    data.cycles.iter().filter(|c| *all || !c.archived).collect();
                if cycles.is_empty() {
                    println!("No cycles found.");
                    return Ok(());
                }
                for cycle in cycles {
                    let archived = if cycle.archived { " (archived)" } else { "" };
                    println!(
                        "{}  {}  {}{}",
                        cycle.id,
                        cycle.location_id,
                        cycle.stage_now(),
                        archived
                    );
                }
                Ok(())
            }

            CycleSubcommand::Start {
                genetics,
                location,
                cloned_at,
                batches,
            } => {
                let cloned_at = parse_at(cloned_at)?;
                let draws = batches
                    .iter()
                    .map(|b| parse_pair::<u32>(b).map(|(id, n)| BatchDraw::new(id, n)))
                    .collect::<Result<Vec<_>, _>>()?;

                let mut data = store.load()?;
                let cycle = data.start_cycle(
                    CultivationCycle::new(genetics.as_str(), location.as_str(), cloned_at),
                    &draws,
                )?;
                println!("Started cycle:\n");
                print!("{}", cycle);
                store.save(&data)?;
                Ok(())
            }

            CycleSubcommand::Stage {
                cycle_id,
                at,
                format,
            } => {
                let at = parse_at(at)?;
                let data = store.load()?;
                let cycle = data
                    .find_cycle(cycle_id)
                    .ok_or_else(|| format!("Cycle not found: {}", cycle_id))?;
                let info = cycle.stage_at(at);
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
                    OutputFormat::Text => println!("{}", info),
                }
                Ok(())
            }

            CycleSubcommand::Advance {
                cycle_id,
                stage,
                at,
            } => {
                let stage: Stage = stage.parse()?;
                let at = parse_at(at)?;
                let mut data = store.load()?;
                let cycle = data
                    .find_cycle_mut(cycle_id)
                    .ok_or_else(|| format!("Cycle not found: {}", cycle_id))?;
                cycle.advance_to(stage, at)?;
                println!("{} is now {}", cycle_id, cycle.stage_now());
                store.save(&data)?;
                Ok(())
            }

            CycleSubcommand::Irrigate {
                cycle_id,
                volume,
                ph,
                ppm,
                ph_out,
                ppm_out,
                supplements,
                notes,
                at,
            } => {
                let kind = if *supplements {
                    IrrigationKind::Supplements
                } else {
                    IrrigationKind::Nutrients
                };
                let mut entry = LogEntry::new(parse_at(at)?).with_irrigation(
                    Irrigation::new(*volume, *ph, *ppm)
                        .with_kind(kind)
                        .with_runoff(*ph_out, *ppm_out),
                );
                if let Some(notes) = notes {
                    entry = entry.with_notes(notes.as_str());
                }

                let mut data = store.load()?;
                let breakdown = data.record_log_entry(cycle_id, entry)?;
                store.save(&data)?;

                match breakdown {
                    Some(breakdown) => print_breakdown(&breakdown),
                    None => println!("Logged irrigation (not priced: no volume)."),
                }
                Ok(())
            }

            CycleSubcommand::Calendar {
                cycle_id,
                back,
                ahead,
            } => {
                let data = store.load()?;
                let cycle = data
                    .find_cycle(cycle_id)
                    .ok_or_else(|| format!("Cycle not found: {}", cycle_id))?;
                let weeks = weeks_around(chrono::Utc::now().date_naive(), *back, *ahead);
                let calendar =
                    project_calendar(cycle, &weeks, &data.formula_schedule, &data.formulas);

                println!("{:<12} {:<16} {:>4}  FORMULA", "WEEK OF", "STAGE", "WEEK");
                for week in calendar {
                    let (stage, week_in_stage) = match week.stage {
                        Some(info) => (info.stage.to_string(), info.week_in_stage.to_string()),
                        None => ("-".to_string(), "-".to_string()),
                    };
                    println!(
                        "{:<12} {:<16} {:>4}  {}",
                        week.week_start.format("%Y-%m-%d"),
                        stage,
                        week_in_stage,
                        week.formula_id.as_deref().unwrap_or("-")
                    );
                }
                Ok(())
            }
        }
    }
}

fn print_breakdown(breakdown: &CostBreakdown) {
    println!("Logged irrigation at {}", breakdown.stage);
    match &breakdown.formula_id {
        Some(id) => println!("Formula: {}", id),
        None => println!("Formula: none scheduled"),
    }
    for line in &breakdown.lines {
        if line.priced {
            println!(
                "  {:<24} {:>10.2} x {:.4} = {:.2}",
                line.inventory_item_id, line.quantity, line.unit_cost, line.cost
            );
        } else {
            println!("  {:<24} {:>10.2} (no stock item)", line.inventory_item_id, line.quantity);
        }
    }
    println!("Cost: {:.2}", breakdown.total);
}
