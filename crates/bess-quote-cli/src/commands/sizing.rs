use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use bess_quote_core::sizing::{size_power, AttributeValue, FacilityProfile};

use crate::input;

/// Arguments for power sizing
#[derive(Args)]
pub struct SizeArgs {
    /// Path to JSON input file: {"industry": ..., "profile": {...}}
    #[arg(long)]
    pub input: Option<String>,

    /// Industry id or alias (e.g. hotel, data_center, car_wash)
    #[arg(long)]
    pub industry: Option<String>,

    /// Profile answer as key=value; repeatable (e.g. --set roomCount=200)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub answers: Vec<String>,
}

#[derive(Deserialize)]
struct SizeRequest {
    industry: String,
    #[serde(default)]
    profile: FacilityProfile,
}

pub fn run_size(args: SizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = match args.industry {
        Some(industry) => {
            let mut profile = FacilityProfile::new();
            for answer in &args.answers {
                let (key, value) = parse_answer(answer)?;
                profile = profile.with(key, value);
            }
            SizeRequest { industry, profile }
        }
        None => input::read_request(args.input.as_deref(), "size (or pass --industry)")?,
    };

    let result = size_power(&request.industry, &request.profile)?;
    Ok(serde_json::to_value(result)?)
}

/// `key=value` into a profile entry. Numbers and booleans are typed; anything
/// else is kept as text.
fn parse_answer(answer: &str) -> Result<(String, AttributeValue), Box<dyn std::error::Error>> {
    let (key, raw) = answer
        .split_once('=')
        .ok_or_else(|| format!("Expected KEY=VALUE, got '{answer}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("Missing key in '{answer}'").into());
    }

    let raw = raw.trim();
    let value = if let Ok(n) = raw.parse::<Decimal>() {
        AttributeValue::Number(n)
    } else if let Ok(b) = raw.parse::<bool>() {
        AttributeValue::Flag(b)
    } else {
        AttributeValue::Text(raw.to_string())
    };
    Ok((key.to_string(), value))
}
