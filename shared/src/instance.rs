use indexmap::IndexMap;
use log::warn;
use ndarray::Array2;
use rand::prelude::StdRng;
use rand::{Rng, SeedableRng};

use crate::{
    column_position, get_reader, parse_float, parse_id, Customer, CustomerId, Facility,
    FacilityId, LoadError,
};

/// Capacitated facility-location instance.
///
/// Customers and facilities are addressed by their `index`; the id maps are only used
/// while loading and for reporting. Shipment costs are per unit of demand and stored as
/// `ship_cost[[customer.index, facility.index]]`.
#[derive(Debug, Clone)]
pub struct Instance {
    customers: Vec<Customer>,
    facilities: Vec<Facility>,
    customer_index: IndexMap<CustomerId, usize>,
    facility_index: IndexMap<FacilityId, usize>,
    ship_cost: Array2<f64>,
}

impl Instance {
    pub fn new(
        customers: Vec<Customer>,
        facilities: Vec<Facility>,
        ship_cost: Array2<f64>,
    ) -> Result<Self, LoadError> {
        if customers.is_empty() || facilities.is_empty() {
            return Err(LoadError::Invalid(
                "instance needs at least one customer and one facility".to_string(),
            ));
        }
        if ship_cost.dim() != (customers.len(), facilities.len()) {
            return Err(LoadError::Invalid(format!(
                "cost matrix has shape {:?}, expected ({}, {})",
                ship_cost.dim(),
                customers.len(),
                facilities.len()
            )));
        }

        let mut customer_index = IndexMap::with_capacity(customers.len());
        for (position, customer) in customers.iter().enumerate() {
            if customer.index != position {
                return Err(LoadError::Invalid(format!(
                    "customer {} has index {} but is stored at {}",
                    customer.id, customer.index, position
                )));
            }
            if !(customer.demand > 0.0) || !customer.demand.is_finite() {
                return Err(LoadError::Invalid(format!(
                    "customer {} has non-positive demand {}",
                    customer.id, customer.demand
                )));
            }
            if customer_index.insert(customer.id, position).is_some() {
                return Err(LoadError::Invalid(format!("duplicate customer id {}", customer.id)));
            }
        }

        let mut facility_index = IndexMap::with_capacity(facilities.len());
        for (position, facility) in facilities.iter().enumerate() {
            if facility.index != position {
                return Err(LoadError::Invalid(format!(
                    "facility {} has index {} but is stored at {}",
                    facility.id, facility.index, position
                )));
            }
            if !(facility.capacity > 0.0) || !facility.capacity.is_finite() {
                return Err(LoadError::Invalid(format!(
                    "facility {} has non-positive capacity {}",
                    facility.id, facility.capacity
                )));
            }
            if !(facility.fixed_cost >= 0.0) || !facility.fixed_cost.is_finite() {
                return Err(LoadError::Invalid(format!(
                    "facility {} has negative fixed cost {}",
                    facility.id, facility.fixed_cost
                )));
            }
            if facility_index.insert(facility.id, position).is_some() {
                return Err(LoadError::Invalid(format!("duplicate facility id {}", facility.id)));
            }
        }

        // a zero lower bound on the shipment cost relies on this
        if let Some(((i, j), cost)) = ship_cost
            .indexed_iter()
            .find(|(_, cost)| !(**cost >= 0.0) || !cost.is_finite())
        {
            return Err(LoadError::Invalid(format!(
                "shipment cost from facility {} to customer {} is {}",
                facilities[j].id, customers[i].id, cost
            )));
        }

        let instance = Instance {
            customers,
            facilities,
            customer_index,
            facility_index,
            ship_cost,
        };

        if instance.total_capacity() < instance.total_demand() {
            warn!(
                "Total capacity {} is below total demand {}, no facility configuration is feasible",
                instance.total_capacity(),
                instance.total_demand()
            );
        }

        Ok(instance)
    }

    /// Builds an instance whose ids equal the indices.
    pub fn from_data(
        demands: &[f64],
        capacities: &[f64],
        fixed_costs: &[f64],
        ship_cost: &[Vec<f64>],
    ) -> Result<Self, LoadError> {
        if capacities.len() != fixed_costs.len() {
            return Err(LoadError::Invalid(format!(
                "{} capacities but {} fixed costs",
                capacities.len(),
                fixed_costs.len()
            )));
        }
        if ship_cost.len() != demands.len() || ship_cost.iter().any(|row| row.len() != capacities.len()) {
            return Err(LoadError::Invalid(
                "cost matrix does not match the number of customers and facilities".to_string(),
            ));
        }

        let customers = demands
            .iter()
            .enumerate()
            .map(|(i, &demand)| Customer::new(i as CustomerId, i, demand))
            .collect();
        let facilities = capacities
            .iter()
            .zip(fixed_costs.iter())
            .enumerate()
            .map(|(j, (&capacity, &fixed_cost))| Facility::new(j as FacilityId, j, capacity, fixed_cost))
            .collect();
        let flat: Vec<f64> = ship_cost.iter().flatten().cloned().collect();
        let ship_cost = Array2::from_shape_vec((demands.len(), capacities.len()), flat)
            .map_err(|e| LoadError::Invalid(e.to_string()))?;

        Instance::new(customers, facilities, ship_cost)
    }

    /// Loads facilities, customers and a `customer,facility,cost` table. Every pair must
    /// be present exactly once.
    pub fn load(
        facilities_path: &str,
        customers_path: &str,
        costs_path: &str,
    ) -> Result<Self, LoadError> {
        let facilities = Facility::load(facilities_path)?;
        let customers = Customer::load(customers_path)?;

        let mut ship_cost = Array2::from_elem((customers.len(), facilities.len()), f64::NAN);

        let mut rdr = csv::Reader::from_reader(get_reader(costs_path)?);
        let header_row = rdr.headers()?.clone();
        let customer_column = column_position(&header_row, "customer")?;
        let facility_column = column_position(&header_row, "facility")?;
        let cost_column = column_position(&header_row, "cost")?;

        for result in rdr.records() {
            let record = result?;
            let customer_id = parse_id(record.get(customer_column).unwrap_or_default())?;
            let facility_id = parse_id(record.get(facility_column).unwrap_or_default())?;
            let cost = parse_float(record.get(cost_column).unwrap_or_default(), "cost")?;

            let i = customers
                .get(&customer_id)
                .map(|c| c.index)
                .ok_or_else(|| LoadError::Invalid(format!("unknown customer {}", customer_id)))?;
            let j = facilities
                .get(&facility_id)
                .map(|f| f.index)
                .ok_or_else(|| LoadError::Invalid(format!("unknown facility {}", facility_id)))?;

            if !ship_cost[[i, j]].is_nan() {
                return Err(LoadError::Invalid(format!(
                    "duplicate cost for customer {} and facility {}",
                    customer_id, facility_id
                )));
            }
            ship_cost[[i, j]] = cost;
        }

        if let Some(((i, j), _)) = ship_cost.indexed_iter().find(|(_, cost)| cost.is_nan()) {
            return Err(LoadError::Invalid(format!(
                "missing cost for customer {} and facility {}",
                customers[i].id, facilities[j].id
            )));
        }

        Instance::new(
            customers.into_iter().map(|(_, c)| c).collect(),
            facilities.into_iter().map(|(_, f)| f).collect(),
            ship_cost,
        )
    }

    /// Random instance with enough total capacity to serve every customer. Goes through the
    /// same validation as loaded data, so empty sizes are rejected.
    pub fn random(seed: u64, num_customers: usize, num_facilities: usize) -> Result<Self, LoadError> {
        let mut rng = StdRng::seed_from_u64(seed);

        let demands: Vec<f64> = (0..num_customers)
            .map(|_| f64::from(rng.gen_range(1..10_u32)))
            .collect();
        let total_demand: f64 = demands.iter().sum();

        // each facility can carry roughly half of the demand
        let capacities: Vec<f64> = (0..num_facilities)
            .map(|_| (total_demand * rng.gen_range(0.4..0.8)).ceil())
            .collect();
        let fixed_costs: Vec<f64> = (0..num_facilities)
            .map(|_| f64::from(rng.gen_range(10..60_u32)))
            .collect();
        let ship_cost = Array2::from_shape_fn((num_customers, num_facilities), |_| {
            f64::from(rng.gen_range(1..20_u32))
        });

        let customers = demands
            .iter()
            .enumerate()
            .map(|(i, &demand)| Customer::new(i as CustomerId, i, demand))
            .collect();
        let mut facilities: Vec<Facility> = capacities
            .iter()
            .zip(fixed_costs.iter())
            .enumerate()
            .map(|(j, (&capacity, &fixed_cost))| Facility::new(j as FacilityId, j, capacity, fixed_cost))
            .collect();

        // a single facility must be able to host the largest customer for the
        // single-sourcing form to be feasible once everything is open
        let largest = demands.iter().cloned().fold(0.0, f64::max);
        for facility in facilities.iter_mut() {
            facility.capacity = facility.capacity.max(largest);
        }

        Instance::new(customers, facilities, ship_cost)
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    pub fn num_customers(&self) -> usize {
        self.customers.len()
    }

    pub fn num_facilities(&self) -> usize {
        self.facilities.len()
    }

    pub fn demand(&self, customer: usize) -> f64 {
        self.customers[customer].demand
    }

    pub fn capacity(&self, facility: usize) -> f64 {
        self.facilities[facility].capacity
    }

    pub fn fixed_cost(&self, facility: usize) -> f64 {
        self.facilities[facility].fixed_cost
    }

    pub fn ship_cost(&self, customer: usize, facility: usize) -> f64 {
        self.ship_cost[[customer, facility]]
    }

    pub fn ship_costs(&self) -> &Array2<f64> {
        &self.ship_cost
    }

    pub fn customer_position(&self, id: CustomerId) -> Option<usize> {
        self.customer_index.get(&id).cloned()
    }

    pub fn facility_position(&self, id: FacilityId) -> Option<usize> {
        self.facility_index.get(&id).cloned()
    }

    pub fn total_demand(&self) -> f64 {
        self.customers.iter().map(|c| c.demand).sum()
    }

    pub fn total_capacity(&self) -> f64 {
        self.facilities.iter().map(|f| f.capacity).sum()
    }

    /// Cost of serving every customer from its cheapest facility, ignoring capacities.
    /// No facility configuration can ship for less.
    pub fn shipment_lower_bound(&self) -> f64 {
        self.ship_cost
            .outer_iter()
            .zip(self.customers.iter())
            .map(|(row, customer)| {
                customer.demand * row.iter().cloned().fold(f64::INFINITY, f64::min)
            })
            .sum()
    }
}
