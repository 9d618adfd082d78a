use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

use crate::error::RosterResult;
use crate::schedule::Doctor;

/// Appends one doctor to the roster CSV, writing the header if the file is new
pub fn append_doctor_to_csv(doctor: &Doctor, csv_path: &Path) -> RosterResult<()> {
    let file_exists = csv_path.exists() && std::fs::metadata(csv_path)?.len() > 0;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if !file_exists {
        wtr.write_record(["id", "name", "rank"])?;
    }
    wtr.write_record([doctor.id.as_str(), doctor.name.as_str(), doctor.rank.to_string().as_str()])?;

    wtr.flush()?;
    Ok(())
}

/// Rewrites the roster CSV from scratch
pub fn write_doctors_csv(doctors: &[Doctor], csv_path: &Path) -> RosterResult<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_path(csv_path)?;
    wtr.write_record(["id", "name", "rank"])?;
    for doctor in doctors {
        wtr.write_record([doctor.id.as_str(), doctor.name.as_str(), doctor.rank.to_string().as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}
