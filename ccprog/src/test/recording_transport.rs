use std::collections::VecDeque;

use crate::gpio::{GpioError, Level};
use crate::wire::BitTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    Write(u8),
    Read(u8),
    PulseHigh,
    Sample(Level),
    Clock(usize),
    EnterDebugMode,
    RunNormalMode,
}

/// A bit transport that records every call.
///
/// Reads return the queued responses and `0x00` once they run out. DD reads
/// low, the target being ready, unless configured otherwise.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    events: Vec<TransportEvent>,
    responses: VecDeque<u8>,
    busy_samples: usize,
    never_ready: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(mut self, responses: impl IntoIterator<Item = u8>) -> Self {
        self.responses.extend(responses);
        self
    }

    /// DD reads high for the next `samples` samples.
    pub fn busy_for(mut self, samples: usize) -> Self {
        self.busy_samples = samples;
        self
    }

    /// DD always reads high.
    pub fn never_ready(mut self) -> Self {
        self.never_ready = true;
        self
    }

    pub fn events(&self) -> &[TransportEvent] {
        &self.events
    }

    /// All bytes written, in order.
    pub fn written(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|event| match event {
                TransportEvent::Write(byte) => Some(*byte),
                _ => None,
            })
            .collect()
    }

    pub fn reads(&self) -> usize {
        self.count(|event| matches!(event, TransportEvent::Read(_)))
    }

    pub fn samples(&self) -> usize {
        self.count(|event| matches!(event, TransportEvent::Sample(_)))
    }

    /// Total number of dummy clock cycles.
    pub fn clocks(&self) -> usize {
        self.events
            .iter()
            .map(|event| match event {
                TransportEvent::Clock(cycles) => *cycles,
                _ => 0,
            })
            .sum()
    }

    fn count(&self, predicate: impl Fn(&TransportEvent) -> bool) -> usize {
        self.events.iter().filter(|event| predicate(event)).count()
    }
}

impl BitTransport for RecordingTransport {
    fn write_byte(&mut self, value: u8) -> Result<(), GpioError> {
        self.events.push(TransportEvent::Write(value));
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, GpioError> {
        let value = self.responses.pop_front().unwrap_or(0x00);
        self.events.push(TransportEvent::Read(value));
        Ok(value)
    }

    fn pulse_data_high(&mut self) -> Result<(), GpioError> {
        self.events.push(TransportEvent::PulseHigh);
        Ok(())
    }

    fn sample_data(&mut self) -> Result<Level, GpioError> {
        let level = if self.never_ready {
            Level::High
        } else if self.busy_samples > 0 {
            self.busy_samples -= 1;
            Level::High
        } else {
            Level::Low
        };
        self.events.push(TransportEvent::Sample(level));
        Ok(level)
    }

    fn clock_cycles(&mut self, cycles: usize) -> Result<(), GpioError> {
        self.events.push(TransportEvent::Clock(cycles));
        Ok(())
    }

    fn enter_debug_mode(&mut self) -> Result<(), GpioError> {
        self.events.push(TransportEvent::EnterDebugMode);
        Ok(())
    }

    fn run_normal_mode(&mut self) -> Result<(), GpioError> {
        self.events.push(TransportEvent::RunNormalMode);
        Ok(())
    }
}
