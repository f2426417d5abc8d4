//! Parsing and bounds checking for the raw weather filter inputs of a search request.
//!
//! Every check here runs before the property store or the weather api is touched, so a
//! malformed request costs nothing beyond string parsing.

use crate::weather::{FilterSpec, Range, WeatherCondition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Temperature,
    Humidity,
}

impl Measure {
    fn label(&self) -> &'static str {
        match self {
            Measure::Temperature => "Temperature",
            Measure::Humidity => "Humidity",
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            Measure::Temperature => "temperature",
            Measure::Humidity => "humidity",
        }
    }

    /// Inclusive domain accepted from users; a missing bound defaults to the domain edge.
    pub fn domain(&self) -> Range {
        match self {
            Measure::Temperature => Range {
                min: -20.0,
                max: 50.0,
            },
            Measure::Humidity => Range {
                min: 0.0,
                max: 100.0,
            },
        }
    }

    fn out_of_range(&self) -> &'static str {
        match self {
            Measure::Temperature => "Temperature must be between -20°C and 50°C",
            Measure::Humidity => "Humidity must be between 0% and 100%",
        }
    }
}

/// Rejected filter input; `Display` is the message returned to the caller.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{} must be a number", .0.label())]
    NotANumber(Measure),
    #[error("{}", .0.out_of_range())]
    OutOfRange(Measure),
    #[error("Min {} cannot exceed max", .0.noun())]
    MinExceedsMax(Measure),
    #[error("Invalid conditions: {}", .0.join(", "))]
    InvalidConditions(Vec<String>),
}

pub fn validate_temp_range(
    min: Option<&str>,
    max: Option<&str>,
) -> Result<Option<Range>, ValidationError> {
    validate_range(Measure::Temperature, min, max)
}

pub fn validate_humidity_range(
    min: Option<&str>,
    max: Option<&str>,
) -> Result<Option<Range>, ValidationError> {
    validate_range(Measure::Humidity, min, max)
}

fn validate_range(
    measure: Measure,
    min: Option<&str>,
    max: Option<&str>,
) -> Result<Option<Range>, ValidationError> {
    let min = min.filter(|s| !s.is_empty());
    let max = max.filter(|s| !s.is_empty());
    if min.is_none() && max.is_none() {
        return Ok(None);
    }

    let domain = measure.domain();
    let min = min.map_or(Ok(domain.min), |s| parse_number(measure, s))?;
    let max = max.map_or(Ok(domain.max), |s| parse_number(measure, s))?;

    if min < domain.min || max > domain.max {
        return Err(ValidationError::OutOfRange(measure));
    }
    if min > max {
        return Err(ValidationError::MinExceedsMax(measure));
    }

    Ok(Some(Range { min, max }))
}

fn parse_number(measure: Measure, raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or(ValidationError::NotANumber(measure))
}

/// Check each condition name against the known buckets, case-insensitively.
///
/// Names are returned exactly as given; an empty input means no condition filter.
pub fn validate_conditions<S: AsRef<str>>(
    raw: &[S],
) -> Result<Option<Vec<String>>, ValidationError> {
    if raw.is_empty() {
        return Ok(None);
    }

    let invalid: Vec<String> = raw
        .iter()
        .map(|s| s.as_ref())
        .filter(|name| name.parse::<WeatherCondition>().is_err())
        .map(str::to_owned)
        .collect();
    if !invalid.is_empty() {
        return Err(ValidationError::InvalidConditions(invalid));
    }

    Ok(Some(raw.iter().map(|s| s.as_ref().to_owned()).collect()))
}

/// Raw query parameters of a property search, exactly as received
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    pub search_text: Option<String>,
    pub temp_min: Option<String>,
    pub temp_max: Option<String>,
    pub humidity_min: Option<String>,
    pub humidity_max: Option<String>,
    pub conditions: Vec<String>,
}

impl SearchParams {
    /// Collect parameters from decoded query pairs. `conditions` may repeat (also accepted
    /// as `conditions[]`) and empty values are dropped; for any other key the last
    /// occurrence wins.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = SearchParams::default();
        for (key, value) in pairs {
            match key.as_str() {
                "searchText" => params.search_text = Some(value),
                "tempMin" => params.temp_min = Some(value),
                "tempMax" => params.temp_max = Some(value),
                "humidityMin" => params.humidity_min = Some(value),
                "humidityMax" => params.humidity_max = Some(value),
                "conditions" | "conditions[]" if !value.is_empty() => {
                    params.conditions.push(value)
                }
                _ => {}
            }
        }
        params
    }

    /// Run every validator and build the filter the search will apply
    pub fn validate(&self) -> Result<FilterSpec, ValidationError> {
        let temperature =
            validate_temp_range(self.temp_min.as_deref(), self.temp_max.as_deref())?;
        let humidity =
            validate_humidity_range(self.humidity_min.as_deref(), self.humidity_max.as_deref())?;
        let conditions: Option<Vec<WeatherCondition>> =
            validate_conditions(self.conditions.as_slice())?.map(|names| {
                names
                    .iter()
                    .filter_map(|name| name.parse().ok())
                    .collect()
            });

        Ok(FilterSpec::from_validated(
            temperature,
            humidity,
            conditions.as_deref(),
        ))
    }

    /// Trimmed search text, `None` when blank
    pub fn search_text(&self) -> Option<&str> {
        self.search_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}
