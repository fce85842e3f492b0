//! Initial unit population loader (`--herd-file`). XML herd-file parsing is
//! out of scope; the flat record shape below is the narrow interface a CSV
//! herd file stands in for, read with the same `csv` crate the output
//! writer uses.

use std::io::Read;

use serde::Deserialize;

use crate::{
    error::{SimError, SimResult},
    herd::{DiseaseStatus, Herd, HerdId, HerdList, HerdSize, Position},
    production_type::ProductionTypeRegistry,
};

#[derive(Debug, Deserialize)]
struct HerdRecord {
    official_id: String,
    production_type: String,
    x: f64,
    y: f64,
    size: u32,
    #[serde(default = "default_status")]
    status: DiseaseStatus,
}

fn default_status() -> DiseaseStatus {
    DiseaseStatus::Susceptible
}

/// Reads a herd population from CSV, resolving each record's production-type
/// name against `registry` (built from the scenario file's `production_types`
/// list, so a herd file referencing an unknown type is a scenario error, not
/// a silent default).
pub fn load_herds(reader: impl Read, registry: &ProductionTypeRegistry) -> SimResult<HerdList> {
    let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let mut herds = Vec::new();
    for (index, record) in csv_reader.deserialize::<HerdRecord>().enumerate() {
        let record = record?;
        let production_type = registry.id_of(&record.production_type).ok_or_else(|| {
            SimError::Scenario(format!(
                "herd file references unknown production type `{}`",
                record.production_type
            ))
        })?;
        herds.push(Herd::new(
            HerdId(index as u32),
            record.official_id,
            production_type,
            Position {
                x: record.x,
                y: record.y,
            },
            HerdSize(record.size),
            record.status,
        ));
    }
    if herds.is_empty() {
        return Err(SimError::Scenario("herd file contains no herds".into()));
    }
    Ok(HerdList::new(herds))
}
