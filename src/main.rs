mod api;
mod cli;
mod core;
mod prelude;
mod quantity;
mod scheduler;
mod tables;

use std::time::Duration;

use chrono::Local;
use clap::{Parser, crate_version};
use tokio::{signal::ctrl_c, time::sleep};

use crate::{
    cli::{Args, Command, PlanArgs, RunArgs},
    prelude::*,
    scheduler::{
        Scheduler,
        propose,
        ports::PlanStore,
        store::PlanFile,
        timer::TimerQueue,
    },
    tables::build_plan_table,
};

/// Longest sleep between the timer checks.
const MAX_SLEEP: Duration = Duration::from_secs(60);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();

    match args.command {
        Command::Run(args) => {
            run(*args).await?;
        }
        Command::Plan(args) => {
            plan(&args)?;
        }
        Command::Show(args) => {
            let plan_file = PlanFile::new(args.path);
            match plan_file.load()? {
                Some(plan) => println!("{}", build_plan_table(&plan)),
                None => warn!(path = %plan_file.path().display(), "no plan saved"),
            }
        }
    }

    info!("done!");
    Ok(())
}

#[instrument(skip_all)]
async fn run(args: RunArgs) -> Result {
    let mut scheduler = Scheduler::builder()
        .home(args.home_assistant.connect()?)
        .plan_store(PlanFile::new(args.plan_file.path))
        .timers(TimerQueue::default())
        .settings(args.settings.settings()?)
        .build();
    scheduler.start(Local::now());
    if !scheduler.plan().is_empty() {
        println!("{}", build_plan_table(scheduler.plan()));
    }

    loop {
        scheduler.fire_due(Local::now());
        let duration = scheduler
            .next_due()
            .map_or(MAX_SLEEP, |next_due| {
                (next_due - Local::now()).to_std().unwrap_or_default().min(MAX_SLEEP)
            });
        debug!(?duration, "sleeping…");
        tokio::select! {
            () = sleep(duration) => {}
            result = ctrl_c() => {
                result?;
                info!("interrupted");
                break;
            }
        }
    }

    Ok(())
}

/// Dry run: plan and print without touching the battery, the helpers, or the plan file.
#[instrument(skip_all)]
fn plan(args: &PlanArgs) -> Result {
    let home = args.home_assistant.connect()?;
    let settings = args.settings.settings()?;
    let Some(proposal) = propose(&home, &settings, Local::now())? else {
        warn!("the prices are not available yet");
        return Ok(());
    };
    info!(
        state_of_charge = ?proposal.state_of_charge,
        average_quarter_energy = ?proposal.average_quarter_energy,
    );
    if let Some(target) = &proposal.charge_target {
        info!(
            target_soc = ?target.state_of_charge,
            power = ?target.power,
            high_price = ?target.high_price,
            "charge target",
        );
    }
    println!("{}", build_plan_table(&proposal.plan));
    Ok(())
}
