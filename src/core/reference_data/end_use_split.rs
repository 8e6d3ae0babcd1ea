use crate::core::end_use::EndUseCategory;
use crate::input::BusinessType;

/// Share of annual energy use by end-use category for each business type.
///
/// The category set is exactly the set of keys a breakdown for that business type carries,
/// and each row sums to 1.
pub fn end_use_split(business_type: BusinessType) -> &'static [(EndUseCategory, f64)] {
    use EndUseCategory::*;

    match business_type {
        BusinessType::Office => &[(Lighting, 0.35), (Hvac, 0.40), (PlugLoads, 0.25)],
        BusinessType::Retail => &[(Lighting, 0.40), (Hvac, 0.35), (PlugLoads, 0.25)],
        BusinessType::Restaurant => &[
            (Lighting, 0.15),
            (Hvac, 0.30),
            (Refrigeration, 0.25),
            (PlugLoads, 0.30),
        ],
        BusinessType::GroceryStore => &[
            (Lighting, 0.25),
            (Hvac, 0.25),
            (Refrigeration, 0.40),
            (PlugLoads, 0.10),
        ],
        BusinessType::Warehouse => &[(Lighting, 0.50), (Hvac, 0.30), (PlugLoads, 0.20)],
        BusinessType::Manufacturing => &[
            (Lighting, 0.20),
            (Hvac, 0.25),
            (Process, 0.45),
            (PlugLoads, 0.10),
        ],
        BusinessType::Hotel => &[(Lighting, 0.25), (Hvac, 0.45), (PlugLoads, 0.30)],
        BusinessType::School => &[(Lighting, 0.35), (Hvac, 0.45), (PlugLoads, 0.20)],
        BusinessType::Healthcare => &[
            (Lighting, 0.25),
            (Hvac, 0.40),
            (PlugLoads, 0.20),
            (Process, 0.15),
        ],
    }
}

/// The share for one category, if the business type carries that category at all.
pub fn end_use_fraction(business_type: BusinessType, category: EndUseCategory) -> Option<f64> {
    end_use_split(business_type)
        .iter()
        .find(|(candidate, _)| *candidate == category)
        .map(|(_, fraction)| *fraction)
}
