pub mod auditor;
pub mod baseline;
pub mod ecm;
pub mod end_use;
pub mod equipment;
pub mod reference_data;
pub mod units;
pub mod utility_bills;
