use indexmap::IndexMap;

use crate::{column_position, get_reader, parse_float, parse_id, CustomerId, LoadError};

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: CustomerId,
    pub index: usize,
    pub demand: f64,
}

impl Customer {
    pub fn new(id: CustomerId, index: usize, demand: f64) -> Self {
        Customer { id, index, demand }
    }

    pub fn load(path: &str) -> Result<IndexMap<CustomerId, Customer>, LoadError> {
        let mut rdr = csv::Reader::from_reader(get_reader(path)?);

        let mut customers: IndexMap<CustomerId, Customer> = IndexMap::default();

        let header_row = rdr.headers()?.clone();
        let id_column = column_position(&header_row, "id")?;
        let demand_column = column_position(&header_row, "demand")?;

        for result in rdr.records() {
            let record = result?;

            let id = parse_id(record.get(id_column).unwrap_or_default())?;
            let demand = parse_float(record.get(demand_column).unwrap_or_default(), "demand")?;

            let index = customers.len();
            if customers
                .insert(id, Customer::new(id, index, demand))
                .is_some()
            {
                return Err(LoadError::Invalid(format!("duplicate customer id {}", id)));
            }
        }

        Ok(customers)
    }
}
