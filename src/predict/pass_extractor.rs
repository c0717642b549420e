use chrono::{DateTime, Utc};

use crate::predict::brightness::BrightnessModel;
use crate::predict::error::PredictError;
use crate::predict::observer::ObserverLocation;
use crate::predict::propagation::Propagator;
use crate::predict::types::{EventKind, PassRecord, PredictionWindow, RawEvent};

/// Timestamps of one matched (Rise, Culmination, Set) triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassTimes {
    pub rise: DateTime<Utc>,
    pub culmination: DateTime<Utc>,
    pub set: DateTime<Utc>,
}

/// `anchor` is the index of the RISE that opened the current attempt
#[derive(Debug, Clone, Copy)]
enum MatchState {
    SeekingRise,
    SeekingCulmination {
        anchor: usize,
        rise: DateTime<Utc>,
    },
    SeekingSet {
        anchor: usize,
        rise: DateTime<Utc>,
        culmination: DateTime<Utc>,
    },
}

/// Greedy, non-overlapping triple matching over the event stream.
///
/// A mismatch abandons the current attempt and resumes one event after its
/// RISE, so stray events anywhere in the stream are skipped rather than
/// turned into partial passes. Triples whose timestamps are not strictly
/// increasing count as mismatches.
pub fn match_triples(events: &[RawEvent]) -> Vec<PassTimes> {
    let mut triples = Vec::new();
    let mut state = MatchState::SeekingRise;
    let mut i = 0;

    while i < events.len() {
        let event = events[i];
        state = match (state, event.kind) {
            (MatchState::SeekingRise, EventKind::Rise) => MatchState::SeekingCulmination {
                anchor: i,
                rise: event.time,
            },
            (MatchState::SeekingRise, _) => MatchState::SeekingRise,
            (MatchState::SeekingCulmination { anchor, rise }, EventKind::Culmination)
                if event.time > rise =>
            {
                MatchState::SeekingSet {
                    anchor,
                    rise,
                    culmination: event.time,
                }
            }
            (
                MatchState::SeekingSet {
                    rise, culmination, ..
                },
                EventKind::Set,
            ) if event.time > culmination => {
                triples.push(PassTimes {
                    rise,
                    culmination,
                    set: event.time,
                });
                MatchState::SeekingRise
            }
            (
                MatchState::SeekingCulmination { anchor, .. } | MatchState::SeekingSet { anchor, .. },
                _,
            ) => {
                i = anchor + 1;
                state = MatchState::SeekingRise;
                continue;
            }
        };
        i += 1;
    }

    triples
}

/// Turn the propagator's event stream for `window` into characterised passes.
///
/// Passes are numbered 1..N in rise order. A pass whose culmination, rounded
/// to the reported precision, is below `window.min_elevation_deg` is dropped
/// before numbering; one exactly at the threshold is kept. An empty result is not an error.
pub fn extract_passes<P: Propagator + ?Sized>(
    propagator: &P,
    observer: &ObserverLocation,
    window: &PredictionWindow,
    brightness: &BrightnessModel,
) -> Result<Vec<PassRecord>, PredictError> {
    observer.validate()?;
    brightness.validate()?;

    let events = propagator.events(
        observer,
        window.start,
        window.end(),
        window.min_elevation_deg,
    )?;

    let mut passes: Vec<PassRecord> = Vec::new();
    for times in match_triples(&events) {
        let peak = propagator.topocentric(observer, times.culmination)?;
        // Compared as reported, so a kept pass never shows a peak below the filter
        let max_altitude = round2(peak.elevation_deg);
        if max_altitude < window.min_elevation_deg {
            log::debug!(
                "Dropping pass at {}: culmination {:.3}° below {}°",
                times.rise,
                peak.elevation_deg,
                window.min_elevation_deg
            );
            continue;
        }

        let rise = propagator.topocentric(observer, times.rise)?;
        let set = propagator.topocentric(observer, times.set)?;
        let duration_minutes = (times.set - times.rise).num_milliseconds() as f64 / 60_000.0;

        passes.push(PassRecord {
            pass_id: passes.len() as u32 + 1,
            rise_time: times.rise,
            culmination_time: times.culmination,
            set_time: times.set,
            max_altitude,
            rise_azimuth: round_azimuth(rise.azimuth_deg),
            set_azimuth: round_azimuth(set.azimuth_deg),
            duration_minutes: round1(duration_minutes),
            brightness: round2(brightness.estimate(peak.range_km)?),
        });
    }

    log::info!(
        "Extracted {} passes from {} events between {} and {}",
        passes.len(),
        events.len(),
        window.start,
        window.end()
    );

    Ok(passes)
}

/// Passes at or above `threshold_deg`, ids unchanged
pub fn filter_by_altitude(passes: &[PassRecord], threshold_deg: f64) -> Vec<PassRecord> {
    passes
        .iter()
        .filter(|p| p.max_altitude >= threshold_deg)
        .cloned()
        .collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Rounded bearing in [0, 360)
fn round_azimuth(v: f64) -> f64 {
    round2(v).rem_euclid(360.0)
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::types::Topocentric;
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;

    use crate::predict::types::EventKind::{Culmination as C, Rise as R, Set as S};

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn stream(script: &[(i64, EventKind)]) -> Vec<RawEvent> {
        script.iter().map(|&(m, k)| RawEvent::new(t(m), k)).collect()
    }

    /// Replays a fixed event list; look angles default to a 45° pass at 800 km
    struct ScriptedPropagator {
        events: Vec<RawEvent>,
        looks: HashMap<DateTime<Utc>, Topocentric>,
    }

    impl ScriptedPropagator {
        fn new(events: Vec<RawEvent>) -> Self {
            Self {
                events,
                looks: HashMap::new(),
            }
        }

        fn with_look(mut self, time: DateTime<Utc>, elevation_deg: f64, azimuth_deg: f64, range_km: f64) -> Self {
            self.looks.insert(
                time,
                Topocentric {
                    elevation_deg,
                    azimuth_deg,
                    range_km,
                },
            );
            self
        }
    }

    impl Propagator for ScriptedPropagator {
        fn events(
            &self,
            _observer: &ObserverLocation,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
            _min_elevation_deg: f64,
        ) -> Result<Vec<RawEvent>, PredictError> {
            Ok(self.events.clone())
        }

        fn topocentric(
            &self,
            _observer: &ObserverLocation,
            time: DateTime<Utc>,
        ) -> Result<Topocentric, PredictError> {
            Ok(self.looks.get(&time).copied().unwrap_or(Topocentric {
                elevation_deg: 45.0,
                azimuth_deg: 180.0,
                range_km: 800.0,
            }))
        }
    }

    fn window(min_elevation_deg: f64) -> PredictionWindow {
        PredictionWindow::new(t(0), 7, min_elevation_deg).unwrap()
    }

    fn extract(propagator: &ScriptedPropagator, min_elevation_deg: f64) -> Vec<PassRecord> {
        extract_passes(
            propagator,
            &ObserverLocation::default(),
            &window(min_elevation_deg),
            &BrightnessModel::default(),
        )
        .unwrap()
    }

    #[test]
    fn trailing_rise_is_discarded() {
        let propagator = ScriptedPropagator::new(stream(&[(0, R), (5, C), (10, S), (100, R)]));
        let passes = extract(&propagator, 10.0);

        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].pass_id, 1);
        assert_eq!(passes[0].rise_time, t(0));
        assert_eq!(passes[0].culmination_time, t(5));
        assert_eq!(passes[0].set_time, t(10));
    }

    #[test]
    fn empty_stream_is_empty_result() {
        let propagator = ScriptedPropagator::new(Vec::new());
        assert!(extract(&propagator, 10.0).is_empty());
    }

    #[test]
    fn derived_fields_are_rounded() {
        let culmination = t(3) + Duration::seconds(7);
        let set = t(6) + Duration::seconds(20);
        let events = vec![
            RawEvent::new(t(0), R),
            RawEvent::new(culmination, C),
            RawEvent::new(set, S),
        ];
        let propagator = ScriptedPropagator::new(events)
            .with_look(t(0), 10.0, 301.23456, 2200.0)
            .with_look(culmination, 67.891, 30.0, 450.0)
            .with_look(set, 10.0, 118.006, 2100.0);

        let pass = &extract(&propagator, 10.0)[0];
        assert_eq!(pass.max_altitude, 67.89);
        assert_eq!(pass.rise_azimuth, 301.23);
        assert_eq!(pass.set_azimuth, 118.01);
        // 380 s
        assert_eq!(pass.duration_minutes, 6.3);
        // 0 - 400 / 450
        assert_eq!(pass.brightness, -0.89);
    }

    #[test]
    fn stray_rise_before_triple_is_skipped() {
        let propagator = ScriptedPropagator::new(stream(&[(0, R), (2, R), (5, C), (9, S)]));
        let passes = extract(&propagator, 10.0);
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].rise_time, t(2));
    }

    #[test]
    fn mismatch_restarts_one_past_the_rise() {
        let triples = match_triples(&stream(&[(0, R), (1, C), (2, R), (3, C), (4, S)]));
        assert_eq!(
            triples,
            vec![PassTimes {
                rise: t(2),
                culmination: t(3),
                set: t(4)
            }]
        );
    }

    #[test]
    fn orphaned_leading_events_are_skipped() {
        let events = stream(&[(0, C), (3, S), (60, R), (65, C), (70, S), (120, S)]);
        let triples = match_triples(&events);
        assert_eq!(triples.len(), 1);
        assert_eq!(triples[0].rise, t(60));
    }

    #[test]
    fn non_increasing_times_do_not_form_a_pass() {
        let events = stream(&[(10, R), (5, C), (20, S)]);
        assert!(match_triples(&events).is_empty());

        let events = stream(&[(10, R), (10, C), (20, S)]);
        assert!(match_triples(&events).is_empty());
    }

    #[test]
    fn culmination_at_threshold_is_kept() {
        let propagator = ScriptedPropagator::new(stream(&[(0, R), (5, C), (10, S)])).with_look(t(5), 10.0, 0.0, 1500.0);
        let passes = extract(&propagator, 10.0);
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].max_altitude, 10.0);
    }

    #[test]
    fn reported_peak_never_falls_below_off_grid_filter() {
        let propagator = ScriptedPropagator::new(stream(&[(0, R), (5, C), (10, S), (100, R), (105, C), (110, S)]))
            .with_look(t(5), 10.004, 0.0, 1500.0)
            .with_look(t(105), 10.006, 0.0, 1500.0);

        let passes = extract(&propagator, 10.003);
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].rise_time, t(100));
        assert_eq!(passes[0].max_altitude, 10.01);
        assert!(passes.iter().all(|p| p.max_altitude >= 10.003));
    }

    #[test]
    fn peak_rounding_up_to_filter_is_kept() {
        let propagator = ScriptedPropagator::new(stream(&[(0, R), (5, C), (10, S)])).with_look(t(5), 9.996, 0.0, 1500.0);
        let passes = extract(&propagator, 10.0);
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].max_altitude, 10.0);
    }

    #[test]
    fn azimuth_just_short_of_north_reports_zero() {
        let propagator = ScriptedPropagator::new(stream(&[(0, R), (5, C), (10, S)]))
            .with_look(t(0), 10.0, 359.996, 2000.0)
            .with_look(t(10), 10.0, 359.994, 2000.0);

        let pass = &extract(&propagator, 10.0)[0];
        assert_eq!(pass.rise_azimuth, 0.0);
        assert_eq!(pass.set_azimuth, 359.99);
    }

    #[test]
    fn low_passes_are_dropped_before_numbering() {
        let propagator = ScriptedPropagator::new(stream(&[
            (0, R),
            (5, C),
            (10, S),
            (100, R),
            (105, C),
            (110, S),
            (200, R),
            (205, C),
            (210, S),
        ]))
        .with_look(t(105), 9.99, 0.0, 1500.0);

        let passes = extract(&propagator, 10.0);
        assert_eq!(passes.iter().map(|p| p.pass_id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(passes[1].rise_time, t(200));
    }

    #[test]
    fn brightness_orders_passes_by_range() {
        let propagator = ScriptedPropagator::new(stream(&[(0, R), (5, C), (10, S), (100, R), (105, C), (110, S)]))
            .with_look(t(5), 80.0, 0.0, 420.0)
            .with_look(t(105), 20.0, 0.0, 1400.0);
        let passes = extract(&propagator, 10.0);
        assert!(passes[0].brightness < passes[1].brightness);
    }

    #[test]
    fn invalid_observer_is_rejected_before_propagation() {
        let propagator = ScriptedPropagator::new(stream(&[(0, R), (5, C), (10, S)]));
        let observer = ObserverLocation {
            latitude_deg: 123.0,
            longitude_deg: 0.0,
            elevation_m: 0.0,
        };
        let err = extract_passes(&propagator, &observer, &window(10.0), &BrightnessModel::default()).unwrap_err();
        assert!(matches!(err, PredictError::InvalidObserver(_)));
    }

    #[test]
    fn filter_by_altitude_is_inclusive_and_keeps_ids() {
        let propagator = ScriptedPropagator::new(stream(&[(0, R), (5, C), (10, S), (100, R), (105, C), (110, S), (200, R), (205, C), (210, S)]))
            .with_look(t(5), 29.99, 0.0, 900.0)
            .with_look(t(105), 30.0, 0.0, 900.0)
            .with_look(t(205), 75.0, 0.0, 450.0);
        let passes = extract(&propagator, 10.0);

        let visible = filter_by_altitude(&passes, 30.0);
        assert_eq!(visible.iter().map(|p| p.pass_id).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(passes.len(), 3);
    }

    /// Small deterministic generator for event-stream invariants
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            self.0 >> 33
        }
    }

    fn random_stream(rng: &mut Lcg) -> Vec<RawEvent> {
        let len = (rng.next() % 40) as usize;
        let mut minute = 0;
        (0..len)
            .map(|_| {
                // Occasionally repeat a timestamp
                minute += (rng.next() % 4) as i64;
                let kind = match rng.next() % 3 {
                    0 => R,
                    1 => C,
                    _ => S,
                };
                RawEvent::new(t(minute), kind)
            })
            .collect()
    }

    /// Reference scan: check the triple at i, otherwise advance by one
    fn reference_count(events: &[RawEvent]) -> usize {
        let mut count = 0;
        let mut i = 0;
        while i < events.len() {
            let hit = i + 2 < events.len()
                && events[i].kind == R
                && events[i + 1].kind == C
                && events[i + 2].kind == S
                && events[i].time < events[i + 1].time
                && events[i + 1].time < events[i + 2].time;
            if hit {
                count += 1;
                i += 3;
            } else {
                i += 1;
            }
        }
        count
    }

    #[test]
    fn generated_streams_keep_pass_invariants() {
        let mut rng = Lcg(0x5eed);
        for _ in 0..500 {
            let events = random_stream(&mut rng);
            let propagator = ScriptedPropagator::new(events.clone());
            let passes = extract(&propagator, 10.0);

            assert_eq!(passes.len(), reference_count(&events));
            assert_eq!(match_triples(&events), match_triples(&events));
            for (index, pass) in passes.iter().enumerate() {
                assert_eq!(pass.pass_id as usize, index + 1);
                assert!(pass.rise_time < pass.culmination_time);
                assert!(pass.culmination_time < pass.set_time);
                assert!(pass.max_altitude >= 10.0);
            }
            assert!(passes.windows(2).all(|w| w[0].set_time <= w[1].rise_time));
        }
    }
}
