use indexmap::IndexMap;
use std::hash::{Hash, Hasher};

use crate::{column_position, get_reader, parse_float, parse_id, FacilityId, LoadError};

#[derive(Debug, Clone)]
pub struct Facility {
    pub id: FacilityId,
    pub index: usize,
    pub capacity: f64,
    pub fixed_cost: f64,
}

impl Hash for Facility {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        state.write_u32(self.id);
    }
}

impl Eq for Facility {}

impl PartialEq for Facility {
    fn eq(&self, other: &Facility) -> bool {
        self.id == other.id
    }
}

impl Facility {
    pub fn new(id: FacilityId, index: usize, capacity: f64, fixed_cost: f64) -> Self {
        Facility {
            id,
            index,
            capacity,
            fixed_cost,
        }
    }

    /// Reads `id,capacity,fixed_cost` rows. The index follows the file order.
    pub fn load(path: &str) -> Result<IndexMap<FacilityId, Facility>, LoadError> {
        let mut rdr = csv::Reader::from_reader(get_reader(path)?);

        let mut facilities: IndexMap<FacilityId, Facility> = IndexMap::default();

        let header_row = rdr.headers()?.clone();

        let id_column = column_position(&header_row, "id")?;
        let capacity_column = column_position(&header_row, "capacity")?;
        let cost_column = column_position(&header_row, "fixed_cost")?;

        for result in rdr.records() {
            let record = result?;

            let id = parse_id(record.get(id_column).unwrap_or_default())?;
            let capacity = parse_float(record.get(capacity_column).unwrap_or_default(), "capacity")?;
            let fixed_cost = parse_float(record.get(cost_column).unwrap_or_default(), "fixed cost")?;

            let index = facilities.len();
            if facilities
                .insert(id, Facility::new(id, index, capacity, fixed_cost))
                .is_some()
            {
                return Err(LoadError::Invalid(format!("duplicate facility id {}", id)));
            }
        }

        Ok(facilities)
    }
}
