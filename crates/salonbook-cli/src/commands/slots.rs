use chrono::{Local, NaiveDate};
use clap::Args;
use salonbook_core::AvailabilityEngine;
use salonbook_core::BookingApi;

use crate::common::{self, CliError};

#[derive(Args)]
pub struct SlotsArgs {
    /// Service id or name
    #[arg(long)]
    pub service: String,
    /// Target date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,
    /// Override the configured slot granularity (minutes)
    #[arg(long)]
    pub step: Option<u32>,
    /// Print slots as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: SlotsArgs) -> Result<(), CliError> {
    let config = common::load_config();
    let api = common::api(&config)?;

    let services = api.services().await?;
    let service = services
        .iter()
        .find(|s| s.id == args.service || s.name.eq_ignore_ascii_case(&args.service))
        .ok_or_else(|| format!("unknown service: {}", args.service))?;

    let hours = api.business_hours().await?;
    let vacations = api.vacation_periods().await?;
    let window_days = api.booking_window_days().await?;
    let appointments = api.appointments_on(args.date).await?;
    let staff = api.staff().await?;

    let engine = AvailabilityEngine::new(
        args.step.unwrap_or(config.booking.slot_step_minutes),
        window_days,
    )
    .with_policy(config.conflict_policy());

    let slots = engine.slots_for(
        service,
        args.date,
        Local::now().date_naive(),
        &hours,
        &vacations,
        &appointments,
        &staff,
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&slots)?);
        return Ok(());
    }

    if slots.is_empty() {
        println!("no bookable slots on {} for {}", args.date, service.name);
        return Ok(());
    }

    println!("{} ({} min) on {}:", service.name, service.duration_minutes, args.date);
    for slot in &slots {
        let marker = if slot.available { "available" } else { "booked" };
        println!("  {}  {marker}", slot.time.format("%H:%M"));
    }
    Ok(())
}
