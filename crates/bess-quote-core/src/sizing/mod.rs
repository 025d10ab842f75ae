pub mod duration;
pub mod profile;
pub mod registry;
pub mod resolver;

pub use duration::{recommended_duration, Criticality, GridReliability};
pub use profile::{Attribute, AttributeValue, FacilityProfile};
pub use registry::IndustryId;
pub use resolver::{industry_spec, size_power, size_power_for, PowerSizingResult};
