use clap::Args;
use questplan_core::{normalize_timestamp, reward_for_allocation, time::floor_to_minute};

#[derive(Args)]
pub struct RewardArgs {
    /// Block start
    #[arg(long)]
    start: String,
    /// Block end
    #[arg(long)]
    end: String,
    /// Deadline (or chore window end)
    #[arg(long)]
    due: String,
    /// Reference time, defaults to the current minute
    #[arg(long)]
    now: Option<String>,
}

pub fn run(args: RewardArgs) -> Result<(), Box<dyn std::error::Error>> {
    let start = normalize_timestamp(&args.start)?;
    let end = normalize_timestamp(&args.end)?;
    let due = normalize_timestamp(&args.due)?;
    let now = match args.now.as_deref() {
        Some(raw) => normalize_timestamp(raw)?,
        None => floor_to_minute(chrono::Utc::now()),
    };

    if end <= start {
        return Err(format!("block end ({end}) must be after start ({start})").into());
    }

    println!("{}", reward_for_allocation(start, end, due, now));
    Ok(())
}
