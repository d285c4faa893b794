//! # Tick Calculator
//!
//! Converts between audio sample position, MIDI tick, and script tick under
//! a piecewise-constant tempo map.
//!
//! Each tempo segment gets a precomputed `start_sample` anchor at
//! construction time, by integrating forward from the previous segment.
//! Converting a sample position directly against its segment's anchor
//! (rather than re-integrating from tick 0 on every call) keeps repeated
//! queries exact and avoids the conversion drifting as more tempo changes
//! accumulate ahead of the playhead.
//!
//! Script ticks run at 32nd-note resolution: eight script ticks per quarter
//! note, independent of the MIDI file's own PPQ.

use super::smf::{SmfData, TempoChange};

const SCRIPT_TICKS_PER_QUARTER: u64 = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    start_tick: u64,
    start_sample: f64,
    samples_per_tick: f64,
}

pub struct TickCalculator {
    ppq: u16,
    segments: Vec<Segment>,
}

impl TickCalculator {
    pub fn new(smf: &SmfData, sample_rate: u32) -> Self {
        let mut segments = Vec::with_capacity(smf.tempo_changes.len());
        let mut start_sample = 0.0;

        for (i, change) in smf.tempo_changes.iter().enumerate() {
            let samples_per_tick = samples_per_tick(change, smf.ppq, sample_rate);
            segments.push(Segment {
                start_tick: change.tick,
                start_sample,
                samples_per_tick,
            });
            if let Some(next) = smf.tempo_changes.get(i + 1) {
                let ticks = (next.tick - change.tick) as f64;
                start_sample += ticks * samples_per_tick;
            }
        }

        Self {
            ppq: smf.ppq,
            segments,
        }
    }

    /// Segment covering `tick`: the last segment whose `start_tick <= tick`.
    fn segment_for_tick(&self, tick: u64) -> &Segment {
        match self.segments.partition_point(|s| s.start_tick <= tick) {
            0 => &self.segments[0],
            n => &self.segments[n - 1],
        }
    }

    fn segment_for_sample(&self, sample: u64) -> &Segment {
        let sample = sample as f64;
        match self
            .segments
            .partition_point(|s| s.start_sample <= sample)
        {
            0 => &self.segments[0],
            n => &self.segments[n - 1],
        }
    }

    pub fn sample_at_midi_tick(&self, tick: u64) -> u64 {
        if self.segments.is_empty() {
            return 0;
        }
        let seg = self.segment_for_tick(tick);
        let delta_ticks = (tick - seg.start_tick) as f64;
        (seg.start_sample + delta_ticks * seg.samples_per_tick).round() as u64
    }

    pub fn midi_tick_at_sample(&self, sample: u64) -> u64 {
        // An empty tempo map cannot happen through `read_smf` (tick 0 is
        // always synthesized), but a calculator built by hand could still
        // be empty — treat that defensively as "no time has passed".
        if self.segments.is_empty() {
            return 0;
        }
        let seg = self.segment_for_sample(sample);
        let delta_samples = sample as f64 - seg.start_sample;
        // Truncating division, per the sample-to-tick mapping's integer-division rule.
        seg.start_tick + (delta_samples / seg.samples_per_tick) as u64
    }

    pub fn script_tick_at_sample(&self, sample: u64) -> u64 {
        if self.segments.is_empty() || self.ppq == 0 {
            return 0;
        }
        let midi_tick = self.midi_tick_at_sample(sample);
        midi_tick * SCRIPT_TICKS_PER_QUARTER / self.ppq as u64
    }

    pub fn sample_at_script_tick(&self, script_tick: u64) -> u64 {
        let midi_tick = script_tick * self.ppq as u64 / SCRIPT_TICKS_PER_QUARTER;
        self.sample_at_midi_tick(midi_tick)
    }
}

fn samples_per_tick(change: &TempoChange, ppq: u16, sample_rate: u32) -> f64 {
    let seconds_per_tick = change.micros_per_quarter as f64 / 1_000_000.0 / ppq as f64;
    seconds_per_tick * sample_rate as f64
}
