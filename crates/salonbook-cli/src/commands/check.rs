use chrono::{NaiveDate, NaiveTime};
use clap::Args;
use salonbook_core::booking::{check_conflict, BookingRequest};
use salonbook_core::model::Appointment;
use salonbook_core::BookingApi;

use crate::common::{self, CliError};

#[derive(Args)]
pub struct CheckArgs {
    /// Target date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,
    /// Start time (HH:MM)
    #[arg(long)]
    pub start: String,
    /// Duration in minutes
    #[arg(long)]
    pub duration: u32,
    /// Customer id
    #[arg(long)]
    pub customer: String,
    /// Staff id
    #[arg(long)]
    pub staff: String,
    /// Appointment id to exclude (when editing)
    #[arg(long)]
    pub exclude: Option<String>,
}

pub async fn run(args: CheckArgs) -> Result<(), CliError> {
    let start = NaiveTime::parse_from_str(&args.start, "%H:%M")
        .map_err(|e| format!("invalid start time '{}': {e}", args.start))?;
    let end = Appointment::end_for(start, args.duration);
    Appointment::validate_times(start, end)?;

    let config = common::load_config();
    let api = common::api(&config)?;
    let appointments = api.appointments_on(args.date).await?;

    let request = BookingRequest {
        date: args.date,
        start_time: start,
        end_time: end,
        customer_id: &args.customer,
        staff_id: &args.staff,
        exclude_id: args.exclude.as_deref(),
    };
    let check = check_conflict(&appointments, &request, config.conflict_policy());

    if check.has_conflict {
        return Err(check
            .message
            .unwrap_or_else(|| "booking conflict".into())
            .into());
    }
    println!(
        "no conflict: {} {}-{} is free for this customer and staff member",
        args.date,
        start.format("%H:%M"),
        end.format("%H:%M")
    );
    Ok(())
}
