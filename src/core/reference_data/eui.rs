use crate::input::BusinessType;

/// Benchmark electricity energy use intensity, in kWh per square foot per year.
pub fn base_eui(business_type: BusinessType) -> f64 {
    match business_type {
        BusinessType::Office => 14.,
        BusinessType::Retail => 13.,
        BusinessType::Restaurant => 38.,
        BusinessType::GroceryStore => 50.,
        BusinessType::Warehouse => 6.,
        BusinessType::Manufacturing => 20.,
        BusinessType::Hotel => 17.,
        BusinessType::School => 11.,
        BusinessType::Healthcare => 28.,
    }
}
