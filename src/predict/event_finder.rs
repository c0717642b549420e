use chrono::{DateTime, Duration, Utc};

use crate::predict::error::PredictError;
use crate::predict::types::{EventKind, RawEvent};

const COARSE_STEP_SECONDS: i64 = 60; // 1 minute for initial scan
const FINE_STEP_SECONDS: i64 = 1; // 1 second for refinement

#[derive(Debug, Clone, Copy)]
struct Sample {
    time: DateTime<Utc>,
    elevation_deg: f64,
}

/// Scan `[start, end]` for threshold crossings and elevation maxima.
///
/// A pass already above the threshold at `start` has no RISE, and one still
/// above it at `end` has no SET. A CULMINATION is only reported for a maximum
/// strictly inside the window.
pub fn find_events<F>(
    elevation: F,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    threshold_deg: f64,
) -> Result<Vec<RawEvent>, PredictError>
where
    F: Fn(DateTime<Utc>) -> Result<f64, PredictError>,
{
    let mut events = Vec::new();
    if end <= start {
        return Ok(events);
    }

    let coarse_step = Duration::seconds(COARSE_STEP_SECONDS);
    let mut prev = Sample {
        time: start,
        elevation_deg: elevation(start)?,
    };
    let mut above = prev.elevation_deg >= threshold_deg;
    let mut peak = above.then_some(prev);

    while prev.time < end {
        let time = (prev.time + coarse_step).min(end);
        let sample = Sample {
            time,
            elevation_deg: elevation(time)?,
        };
        let visible = sample.elevation_deg >= threshold_deg;

        if visible && !above {
            let rise = refine_crossing(&elevation, prev.time, time, threshold_deg, true)?;
            events.push(RawEvent::new(rise, EventKind::Rise));
            peak = Some(sample);
        } else if visible {
            if peak.is_none_or(|p| sample.elevation_deg > p.elevation_deg) {
                peak = Some(sample);
            }
        } else if above {
            if let Some(p) = peak.take() {
                if p.time > start {
                    let culmination = refine_peak(&elevation, p.time, start, end)?;
                    events.push(RawEvent::new(culmination, EventKind::Culmination));
                }
            }
            let set = refine_crossing(&elevation, prev.time, time, threshold_deg, false)?;
            events.push(RawEvent::new(set, EventKind::Set));
        }

        above = visible;
        prev = sample;
    }

    // Pass in progress at end of window
    if let Some(p) = peak.filter(|p| above && p.time > start && p.time < end) {
        let culmination = refine_peak(&elevation, p.time, start, end)?;
        events.push(RawEvent::new(culmination, EventKind::Culmination));
    }

    Ok(events)
}

/// Binary search for the threshold crossing; returns the above-threshold side
fn refine_crossing<F>(
    elevation: &F,
    before: DateTime<Utc>,
    after: DateTime<Utc>,
    threshold_deg: f64,
    rising: bool,
) -> Result<DateTime<Utc>, PredictError>
where
    F: Fn(DateTime<Utc>) -> Result<f64, PredictError>,
{
    let mut low = before;
    let mut high = after;

    while (high - low).num_seconds() > FINE_STEP_SECONDS {
        let mid = low + (high - low) / 2;
        let above = elevation(mid)? >= threshold_deg;
        if above == rising {
            high = mid;
        } else {
            low = mid;
        }
    }

    Ok(if rising { high } else { low })
}

/// Ternary search for the elevation maximum within one coarse step of `around`
fn refine_peak<F>(
    elevation: &F,
    around: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<DateTime<Utc>, PredictError>
where
    F: Fn(DateTime<Utc>) -> Result<f64, PredictError>,
{
    let coarse_step = Duration::seconds(COARSE_STEP_SECONDS);
    let mut low = (around - coarse_step).max(start);
    let mut high = (around + coarse_step).min(end);

    while (high - low).num_seconds() > FINE_STEP_SECONDS {
        let third = (high - low) / 3;
        let left = low + third;
        let right = high - third;
        if elevation(left)? < elevation(right)? {
            low = left;
        } else {
            high = right;
        }
    }

    Ok(low + (high - low) / 2)
}
