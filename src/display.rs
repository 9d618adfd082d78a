use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::RosterResult;
use crate::schedule::{Doctor, Schedule, ScheduleDay};

/// Formats a doctor as `Name (id)`, or just the id when the name is missing
pub fn format_doctor_name(id: &str, name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() && name != id => format!("{} ({})", name, id),
        _ => id.to_string(),
    }
}

fn names(doctors: &[Doctor]) -> HashMap<&str, &str> {
    doctors.iter().map(|d| (d.id.as_str(), d.name.as_str())).collect()
}

/// One roster line: `YYYY-MM-DD [Holiday] doctor`
pub fn format_day(day: &ScheduleDay, names: &HashMap<&str, &str>) -> String {
    let holiday = day
        .holiday
        .as_deref()
        .map(|h| format!(" [{}]", h))
        .unwrap_or_default();
    let doctor = match &day.doctor {
        Some(id) => format_doctor_name(id, names.get(id.as_str()).copied()),
        None => "[EMPTY]".to_string(),
    };
    format!("{}{} {}", day.date, holiday, doctor)
}

/// Shift and holiday counts per doctor id
pub fn shift_totals(schedule: &Schedule) -> BTreeMap<&str, (usize, usize)> {
    let mut totals: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for day in &schedule.days {
        if let Some(id) = &day.doctor {
            let entry = totals.entry(id.as_str()).or_default();
            entry.0 += 1;
            if day.is_holiday() {
                entry.1 += 1;
            }
        }
    }
    totals
}

/// Writes a schedule to a file, one line per date
pub fn write_schedule_to_file<P: AsRef<Path>>(
    schedule: &Schedule,
    doctors: &[Doctor],
    filename: P,
) -> RosterResult<()> {
    let mut file = File::create(filename)?;
    let names = names(doctors);

    writeln!(file, "** On-call schedule {} **", schedule.year)?;
    for day in &schedule.days {
        writeln!(file, "{}", format_day(day, &names))?;
    }

    Ok(())
}

/// Prints a schedule in a readable format
pub fn print_schedule(schedule: &Schedule, doctors: &[Doctor]) {
    let names = names(doctors);

    println!("\n=== On-call schedule {} ===", schedule.year);
    println!("Days scheduled: {}/{}", schedule.days.len() - schedule.unfilled(), schedule.days.len());
    if !schedule.holidays_assigned.is_empty() {
        let holidays: Vec<&str> = schedule.holidays_assigned.iter().map(String::as_str).collect();
        println!("Holidays covered: {}", holidays.join(", "));
    }

    println!("\nShifts per doctor:");
    for (id, (shifts, holidays)) in shift_totals(schedule) {
        let formatted_name = format_doctor_name(id, names.get(id).copied());
        println!("  - {}: {} shifts, {} holidays", formatted_name, shifts, holidays);
    }

    println!("\nSchedule by date:");
    for day in &schedule.days {
        println!("  {}", format_day(day, &names));
    }
}
