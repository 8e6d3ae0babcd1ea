use crate::core::ecm::ValueRange;
use crate::core::end_use::EndUseCategory;
use crate::input::BusinessType;
use serde::Serialize;
use strum_macros::Display;

/// A single-point energy conservation measure.
#[derive(Clone, Copy, Debug)]
pub struct SimpleEcmDefinition {
    pub name: &'static str,
    pub category: EndUseCategory,
    /// fraction of the target category's energy saved
    pub savings_fraction: f64,
    /// installed cost, in $ per square foot of floor area
    pub cost_per_sq_ft: f64,
}

pub const SIMPLE_ECM_DEFINITIONS: &[SimpleEcmDefinition] = &[
    SimpleEcmDefinition {
        name: "LED Lighting Upgrade",
        category: EndUseCategory::Lighting,
        savings_fraction: 0.50,
        cost_per_sq_ft: 0.75,
    },
    SimpleEcmDefinition {
        name: "HVAC Tune-up",
        category: EndUseCategory::Hvac,
        savings_fraction: 0.15,
        cost_per_sq_ft: 0.15,
    },
    SimpleEcmDefinition {
        name: "Weatherization",
        category: EndUseCategory::Hvac,
        savings_fraction: 0.10,
        cost_per_sq_ft: 0.50,
    },
    SimpleEcmDefinition {
        name: "Plug Load Reduction",
        category: EndUseCategory::PlugLoads,
        savings_fraction: 0.20,
        cost_per_sq_ft: 0.10,
    },
];

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
pub enum Complexity {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RebateRule {
    None,
    /// flat incentive in $ per square foot of floor area
    PerSqFt(f64),
    /// fraction of the implementation cost
    PercentOfCost(f64),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Applicability {
    All,
    Only(&'static [BusinessType]),
}

impl Applicability {
    pub fn applies_to(&self, business_type: BusinessType) -> bool {
        match self {
            Applicability::All => true,
            Applicability::Only(business_types) => business_types.contains(&business_type),
        }
    }
}

/// A secondary reduction this measure causes in another category's energy use.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct InteractiveEffect {
    pub category: EndUseCategory,
    pub multiplier: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct EnhancedEcmDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: EndUseCategory,
    pub savings_fraction: ValueRange,
    pub cost_per_sq_ft: ValueRange,
    pub rebate: RebateRule,
    pub interactive_effects: &'static [InteractiveEffect],
    pub applicability: Applicability,
    pub complexity: Complexity,
    pub lifespan_years: u32,
}

pub const ENHANCED_ECM_DEFINITIONS: &[EnhancedEcmDefinition] = &[
    EnhancedEcmDefinition {
        id: "led-retrofit",
        name: "LED Lighting Retrofit",
        description: "Replace fluorescent, HID and incandescent lamps with LED fixtures or tubes.",
        category: EndUseCategory::Lighting,
        savings_fraction: ValueRange::new(0.40, 0.50, 0.60),
        cost_per_sq_ft: ValueRange::new(1.00, 1.50, 2.00),
        rebate: RebateRule::PerSqFt(0.25),
        interactive_effects: &[InteractiveEffect {
            category: EndUseCategory::Hvac,
            multiplier: 0.92,
        }],
        applicability: Applicability::All,
        complexity: Complexity::Low,
        lifespan_years: 15,
    },
    EnhancedEcmDefinition {
        id: "lighting-controls",
        name: "Advanced Lighting Controls",
        description: "Add occupancy and daylight sensors with scheduled dimming.",
        category: EndUseCategory::Lighting,
        savings_fraction: ValueRange::new(0.20, 0.30, 0.40),
        cost_per_sq_ft: ValueRange::new(0.30, 0.50, 0.80),
        rebate: RebateRule::PercentOfCost(0.20),
        interactive_effects: &[],
        applicability: Applicability::All,
        complexity: Complexity::Low,
        lifespan_years: 10,
    },
    EnhancedEcmDefinition {
        id: "hvac-tune-up",
        name: "HVAC Tune-up and Maintenance",
        description: "Clean coils, replace filters, check refrigerant charge and recalibrate economizers.",
        category: EndUseCategory::Hvac,
        savings_fraction: ValueRange::new(0.05, 0.10, 0.15),
        cost_per_sq_ft: ValueRange::new(0.10, 0.15, 0.20),
        rebate: RebateRule::None,
        interactive_effects: &[],
        applicability: Applicability::All,
        complexity: Complexity::Low,
        lifespan_years: 3,
    },
    EnhancedEcmDefinition {
        id: "smart-thermostats",
        name: "Smart Thermostats and Setbacks",
        description: "Install programmable or networked thermostats with occupied/unoccupied setpoints.",
        category: EndUseCategory::Hvac,
        savings_fraction: ValueRange::new(0.08, 0.12, 0.15),
        cost_per_sq_ft: ValueRange::new(0.05, 0.10, 0.15),
        rebate: RebateRule::PercentOfCost(0.25),
        interactive_effects: &[],
        applicability: Applicability::All,
        complexity: Complexity::Low,
        lifespan_years: 10,
    },
    EnhancedEcmDefinition {
        id: "envelope-insulation",
        name: "Envelope Insulation and Air Sealing",
        description: "Seal air leaks and add roof and wall insulation to reduce heating and cooling loads.",
        category: EndUseCategory::Hvac,
        savings_fraction: ValueRange::new(0.05, 0.08, 0.12),
        cost_per_sq_ft: ValueRange::new(0.50, 1.00, 1.50),
        rebate: RebateRule::PerSqFt(0.10),
        interactive_effects: &[InteractiveEffect {
            category: EndUseCategory::Hvac,
            multiplier: 0.90,
        }],
        applicability: Applicability::All,
        complexity: Complexity::Medium,
        lifespan_years: 25,
    },
    EnhancedEcmDefinition {
        id: "hvac-replacement",
        name: "High-Efficiency HVAC Replacement",
        description: "Replace aging packaged or split systems with high-efficiency units.",
        category: EndUseCategory::Hvac,
        savings_fraction: ValueRange::new(0.20, 0.30, 0.40),
        cost_per_sq_ft: ValueRange::new(8.00, 12.00, 16.00),
        rebate: RebateRule::PerSqFt(1.00),
        interactive_effects: &[],
        applicability: Applicability::All,
        complexity: Complexity::High,
        lifespan_years: 20,
    },
    EnhancedEcmDefinition {
        id: "kitchen-ventilation",
        name: "Demand-Controlled Kitchen Ventilation",
        description: "Modulate exhaust hood fans with cooking activity sensors.",
        category: EndUseCategory::Hvac,
        savings_fraction: ValueRange::new(0.10, 0.15, 0.20),
        cost_per_sq_ft: ValueRange::new(0.75, 1.00, 1.50),
        rebate: RebateRule::PerSqFt(0.15),
        interactive_effects: &[],
        applicability: Applicability::Only(&[BusinessType::Restaurant]),
        complexity: Complexity::Medium,
        lifespan_years: 15,
    },
    EnhancedEcmDefinition {
        id: "plug-load-management",
        name: "Plug Load Management",
        description: "Advanced power strips, equipment scheduling and ENERGY STAR office equipment.",
        category: EndUseCategory::PlugLoads,
        savings_fraction: ValueRange::new(0.10, 0.15, 0.25),
        cost_per_sq_ft: ValueRange::new(0.05, 0.10, 0.20),
        rebate: RebateRule::None,
        interactive_effects: &[InteractiveEffect {
            category: EndUseCategory::Hvac,
            multiplier: 0.98,
        }],
        applicability: Applicability::All,
        complexity: Complexity::Low,
        lifespan_years: 5,
    },
    EnhancedEcmDefinition {
        id: "refrigeration-upgrades",
        name: "Refrigeration System Upgrades",
        description: "EC evaporator fan motors, anti-sweat heater controls, strip curtains and night covers.",
        category: EndUseCategory::Refrigeration,
        savings_fraction: ValueRange::new(0.15, 0.20, 0.30),
        cost_per_sq_ft: ValueRange::new(0.50, 1.00, 1.50),
        rebate: RebateRule::PercentOfCost(0.30),
        interactive_effects: &[],
        applicability: Applicability::Only(&[BusinessType::Restaurant, BusinessType::GroceryStore]),
        complexity: Complexity::Medium,
        lifespan_years: 12,
    },
    EnhancedEcmDefinition {
        id: "process-vfds",
        name: "Variable Frequency Drives on Process Motors",
        description: "Fit VFDs to pumps, fans and compressors that run at part load.",
        category: EndUseCategory::Process,
        savings_fraction: ValueRange::new(0.15, 0.25, 0.35),
        cost_per_sq_ft: ValueRange::new(0.75, 1.25, 2.00),
        rebate: RebateRule::PercentOfCost(0.25),
        interactive_effects: &[],
        applicability: Applicability::Only(&[BusinessType::Manufacturing, BusinessType::Healthcare]),
        complexity: Complexity::Medium,
        lifespan_years: 15,
    },
];
