use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::Args;
use questplan_core::{
    latest_relevant_time, overnight_blackout, AutoScheduler, BlackoutWindow, Config, Schedule,
    ScheduleRequest, ScheduledTask,
};

#[derive(Args)]
pub struct PlanArgs {
    /// Path to a JSON request, or "-" for stdin
    request: PathBuf,
    /// Number of candidate schedules
    #[arg(long)]
    count: Option<usize>,
    /// Spacing jump probability (0.0-1.0)
    #[arg(long)]
    skip_prob: Option<f64>,
    /// Random seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
    /// Overnight blackout window, e.g. 23:00-07:00
    #[arg(long)]
    sleep: Option<String>,
    /// Local time offset from UTC in minutes, applied to --sleep
    #[arg(long, allow_negative_numbers = true)]
    tz_offset: Option<i32>,
    /// Run passes on separate threads
    #[arg(long)]
    parallel: bool,
    /// Print schedules as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();

    let mut scheduler_config = config.scheduler_config();
    if let Some(count) = args.count {
        scheduler_config.num_schedules = count;
    }
    if let Some(skip) = args.skip_prob {
        scheduler_config.skip_probability = skip;
    }
    if args.seed.is_some() {
        scheduler_config.seed = args.seed;
    }
    scheduler_config.parallel |= args.parallel;

    let raw = read_request(&args.request)?;
    let mut inputs = ScheduleRequest::from_json(&raw)?.into_inputs()?;

    let blackout = match args.sleep.as_deref() {
        Some(spec) => {
            let offset = args.tz_offset.unwrap_or(config.blackout.tz_offset_minutes);
            Some(spec.parse::<BlackoutWindow>()?.with_offset(offset))
        }
        None => config.blackout_window()?,
    };
    if let Some(window) = blackout {
        let from = inputs
            .chores
            .iter()
            .map(|c| c.window.start)
            .chain(std::iter::once(inputs.now))
            .min()
            .unwrap_or(inputs.now);
        let to = latest_relevant_time(
            &inputs.commitments,
            &inputs.assignments,
            &inputs.chores,
            inputs.now,
        );
        if from < to {
            tracing::debug!(%from, %to, "adding overnight blackout");
            inputs.commitments.push(overnight_blackout(from, to, &window)?);
        }
    }

    let scheduler = AutoScheduler::with_config(scheduler_config);
    tracing::debug!(config = ?scheduler.config(), now = %inputs.now, "planning");
    let schedules = scheduler.build_schedules(
        &inputs.commitments,
        &inputs.assignments,
        &inputs.chores,
        inputs.now,
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&schedules)?);
    } else {
        for (index, schedule) in schedules.iter().enumerate() {
            print_schedule(index + 1, schedule);
        }
    }
    Ok(())
}

fn read_request(path: &Path) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
    }
}

fn print_schedule(number: usize, schedule: &Schedule) {
    println!(
        "Schedule {number} ({})  potential XP: {}",
        schedule.id, schedule.total_potential_reward
    );
    for task in &schedule.assignments {
        print_task("assignment", task);
    }
    for task in &schedule.chores {
        print_task("chore", task);
    }

    let conflicting: Vec<&str> = schedule
        .conflicting_assignments
        .iter()
        .chain(schedule.conflicting_chores.iter())
        .map(String::as_str)
        .collect();
    let short: Vec<&str> = schedule
        .not_enough_time_assignments
        .iter()
        .chain(schedule.not_enough_time_chores.iter())
        .map(String::as_str)
        .collect();
    if !conflicting.is_empty() {
        println!("  conflicting: {}", conflicting.join(", "));
    }
    if !short.is_empty() {
        println!("  not enough time: {}", short.join(", "));
    }
    println!();
}

fn print_task(kind: &str, task: &ScheduledTask) {
    let outcome = &task.outcome;
    println!(
        "  {kind} {}  {} {}/{} min",
        task.name, outcome.status, outcome.effort_assigned, outcome.effort_required
    );
    for slot in &outcome.slots {
        println!(
            "      {} - {}  +{} XP",
            fmt_time(slot.start),
            fmt_time(slot.end),
            slot.reward_potential
        );
    }
}

fn fmt_time(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}
