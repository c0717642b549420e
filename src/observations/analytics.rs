use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::observations::export::join;
use crate::observations::types::{ObservationLogEntry, Weather};
use crate::predict::PassRecord;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WeatherStats {
    pub weather: Weather,
    pub success_rate: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyPasses {
    pub date: NaiveDate,
    pub passes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Summary {
    pub total_observed: usize,
    pub successful: usize,
    /// `None` until at least one observation matches a prediction
    pub success_rate: Option<f64>,
    pub by_weather: Vec<WeatherStats>,
    /// Predicted passes per UTC rise date, in date order
    pub passes_per_day: Vec<DailyPasses>,
}

/// Success statistics over the predictions/observations left join
pub fn summarize(predictions: &[PassRecord], observations: &[ObservationLogEntry]) -> Summary {
    let rows = join(predictions, observations);

    let mut total_observed = 0;
    let mut successful = 0;
    let mut per_weather: BTreeMap<Weather, (usize, usize)> = BTreeMap::new();

    for row in rows.iter().filter(|r| r.has_observation()) {
        let ok = row.successful.unwrap_or(false);
        total_observed += 1;
        successful += usize::from(ok);
        if let Some(weather) = row.weather {
            let counts = per_weather.entry(weather).or_default();
            counts.0 += usize::from(ok);
            counts.1 += 1;
        }
    }

    let by_weather = per_weather
        .into_iter()
        .map(|(weather, (ok, count))| WeatherStats {
            weather,
            success_rate: round2(ok as f64 / count as f64),
            count,
        })
        .collect();

    Summary {
        total_observed,
        successful,
        success_rate: (total_observed > 0).then(|| successful as f64 / total_observed as f64),
        by_weather,
        passes_per_day: passes_per_day(predictions),
    }
}

fn passes_per_day(predictions: &[PassRecord]) -> Vec<DailyPasses> {
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for pass in predictions {
        *per_day.entry(pass.rise_time.date_naive()).or_default() += 1;
    }
    per_day
        .into_iter()
        .map(|(date, passes)| DailyPasses { date, passes })
        .collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
