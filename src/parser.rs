use csv::Reader;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::warn;

use crate::error::{RosterError, RosterResult};
use crate::schedule::{Doctor, HolidayRecord};

/// Parses a rank, rejecting anything that is not a non-negative integer
fn parse_rank(value: &str) -> Option<u32> {
    value.trim().parse().ok()
}

/// Loads the doctor roster from a CSV file with `id`, `name` and `rank` columns
pub fn load_doctors<P: AsRef<Path>>(csv_path: P) -> RosterResult<Vec<Doctor>> {
    let reader = Reader::from_path(csv_path)?;
    read_doctors(reader)
}

/// Reads doctors from any CSV source. Later rows with the same id replace earlier ones.
pub fn read_doctors<R: Read>(mut reader: Reader<R>) -> RosterResult<Vec<Doctor>> {
    let headers = reader.headers()?.clone();

    // Find column indices, falling back to the documented order
    let find = |needle: &str, fallback: usize| {
        headers
            .iter()
            .position(|h| h.trim().to_lowercase() == needle)
            .unwrap_or(fallback)
    };
    let id_col = find("id", 0);
    let name_col = find("name", 1);
    let rank_col = find("rank", 2);

    let mut order: Vec<String> = Vec::new();
    let mut by_id: HashMap<String, Doctor> = HashMap::new();

    for (line, result) in reader.records().enumerate() {
        let record = result?;

        let id = record.get(id_col).unwrap_or("").trim().to_string();
        let name = record.get(name_col).unwrap_or("").trim().to_string();
        let rank = record.get(rank_col).and_then(parse_rank);

        // Skip rows that are missing essential fields
        let rank = match (id.is_empty(), rank) {
            (false, Some(rank)) => rank,
            _ => {
                warn!(line = line + 2, "Skipping doctor row without id or numeric rank");
                continue;
            }
        };

        if !by_id.contains_key(&id) {
            order.push(id.clone());
        }
        let name = if name.is_empty() { id.clone() } else { name };
        by_id.insert(id.clone(), Doctor::new(id, name, rank));
    }

    Ok(order.into_iter().filter_map(|id| by_id.remove(&id)).collect())
}

/// Loads holiday records from a JSON array. Validation happens in `HolidayRegistry`.
pub fn load_holidays<P: AsRef<Path>>(json_path: P) -> RosterResult<Vec<HolidayRecord>> {
    let content = std::fs::read_to_string(json_path)?;
    parse_holidays(&content)
}

pub fn parse_holidays(content: &str) -> RosterResult<Vec<HolidayRecord>> {
    serde_json::from_str(content).map_err(|e| RosterError::configuration(format!("invalid holiday file: {}", e)))
}
