//! The acquisition path (slow path): sample, filter, encode, publish.
//!
//! Runs only when the cadence gate fires. Each cycle makes up to
//! `1 + max_retries` bounded conversion attempts. When all of them fail the
//! panel keeps showing the last published reading and the cycle is reported
//! as [`AcquisitionStatus::Faulted`].
use segdisp_traits::{Clock, Converter};
use tracing::{debug, info, warn};

use crate::FILTER_WINDOW;
use crate::config::{DisplayLayout, SamplingCfg, ScaleCfg};
use crate::digits::{DigitBuffer, SharedDigitBuffer};
use crate::error::DisplayError;
use crate::filter::MovingAverageFilter;
use crate::sampler::Sampler;
use crate::status::AcquisitionStatus;

pub struct Acquisition<A, C> {
    sampler: Sampler<A, C>,
    filter: Option<MovingAverageFilter<FILTER_WINDOW>>,
    layout: DisplayLayout,
    channel: u8,
    max_retries: u8,
    buffer: SharedDigitBuffer,
    consecutive_faults: u32,
}

impl<A: Converter, C: Clock> Acquisition<A, C> {
    pub fn new(
        converter: A,
        clock: C,
        sampling: &SamplingCfg,
        scale: ScaleCfg,
        layout: DisplayLayout,
        buffer: SharedDigitBuffer,
    ) -> Self {
        Self {
            sampler: Sampler::new(converter, scale, sampling, clock),
            filter: None,
            layout,
            channel: sampling.channel,
            max_retries: sampling.max_retries,
            buffer,
            consecutive_faults: 0,
        }
    }

    /// Fill the filter window with fresh samples and publish the first reading.
    ///
    /// Nothing is shown before this succeeds.
    pub fn prime(&mut self) -> Result<u16, DisplayError> {
        self.fill_window().map(|(_, _, average)| average)
    }

    /// One acquisition cycle. An unprimed pipeline attempts to prime instead
    /// and reports the last sample of the window it filled.
    pub fn poll(&mut self) -> AcquisitionStatus {
        if self.filter.is_none() {
            return match self.fill_window() {
                Ok((raw, scaled, average)) => AcquisitionStatus::Updated {
                    raw,
                    scaled,
                    average,
                },
                Err(error) => self.fault(error),
            };
        }
        match self.sample_with_retries() {
            Ok((raw, scaled)) => {
                let average = self.filter.as_mut().map_or(scaled, |f| f.update(scaled));
                self.consecutive_faults = 0;
                self.publish(average);
                AcquisitionStatus::Updated {
                    raw,
                    scaled,
                    average,
                }
            }
            Err(error) => self.fault(error),
        }
    }

    /// Latest filtered reading, once primed.
    pub fn last_average(&self) -> Option<u16> {
        self.filter.as_ref().map(MovingAverageFilter::average)
    }

    pub fn consecutive_faults(&self) -> u32 {
        self.consecutive_faults
    }

    pub fn buffer(&self) -> &SharedDigitBuffer {
        &self.buffer
    }

    /// Returns `(raw, scaled)` of the newest sample plus the seeded average.
    fn fill_window(&mut self) -> Result<(u16, u16, u16), DisplayError> {
        let mut window = [0u16; FILTER_WINDOW];
        let mut newest = (0, 0);
        for slot in &mut window {
            newest = self.sample_with_retries()?;
            *slot = newest.1;
        }
        let filter = MovingAverageFilter::seed(window);
        let average = filter.average();
        self.filter = Some(filter);
        self.consecutive_faults = 0;
        self.publish(average);
        info!(average, channel = self.channel, "filter primed");
        Ok((newest.0, newest.1, average))
    }

    fn sample_with_retries(&mut self) -> Result<(u16, u16), DisplayError> {
        match self.sampler.sample(self.channel) {
            Ok(v) => Ok(v),
            Err(first) => self.retry(first),
        }
    }

    fn retry(&mut self, first: DisplayError) -> Result<(u16, u16), DisplayError> {
        let mut last = first;
        for attempt in 1..=self.max_retries {
            debug!(attempt, error = %last, "retrying conversion");
            match self.sampler.sample(self.channel) {
                Ok(v) => return Ok(v),
                Err(e) => last = e,
            }
        }
        Err(last)
    }

    fn fault(&mut self, error: DisplayError) -> AcquisitionStatus {
        self.consecutive_faults = self.consecutive_faults.saturating_add(1);
        warn!(
            error = %error,
            consecutive = self.consecutive_faults,
            "acquisition faulted; keeping last reading"
        );
        AcquisitionStatus::Faulted {
            error,
            consecutive: self.consecutive_faults,
        }
    }

    fn publish(&self, average: u16) {
        let next = DigitBuffer::from_measurement(average, &self.layout);
        self.buffer.publish(&next);
        debug!(average, bits = next.to_bits(), "published digit buffer");
    }
}
