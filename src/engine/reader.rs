//! The three timed read loops.
//!
//! All of them poll [`SerialDevice::try_read`] and sample one
//! [`ElapsedTimer`] per iteration. A [`Timeout::INFINITE`] deadline never
//! expires. Deadlines are only checked between device calls.

use super::outcome::{BlockRead, ByteRead, LineRead, StringRead};
use super::SerialHandle;
use crate::error::{EngineError, EngineResult};
use crate::port::{PortError, SerialDevice};
use crate::timer::{Clock, ElapsedTimer, Timeout};
use std::time::Duration;
use tracing::{debug, trace, warn};

impl<D: SerialDevice, C: Clock> SerialHandle<D, C> {
    /// Read exactly one byte, waiting up to `timeout`.
    ///
    /// Busy-polls the device according to the handle's
    /// [`IdlePolicy`](super::IdlePolicy). A device error is returned at once
    /// as [`EngineError::ReadFailed`].
    pub fn read_byte(&mut self, timeout: Timeout) -> EngineResult<ByteRead> {
        let mut timer = ElapsedTimer::start(&self.clock)?;
        let mut byte = [0u8; 1];
        let mut polls: u64 = 0;

        loop {
            if !timeout.is_infinite() && timeout.expired(timer.elapsed_millis(&self.clock)?) {
                trace!("read_byte timed out ({}) after {} polls", timeout, polls);
                return Ok(ByteRead::TimedOut);
            }

            match self.device.try_read(&mut byte) {
                Ok(0) => {
                    polls += 1;
                    self.idle.idle();
                }
                Ok(_) => return Ok(ByteRead::Byte(byte[0])),
                Err(e) => return Err(read_failed(self.device.name(), e)),
            }
        }
    }

    /// Read into `buf` until `terminator` is read, `buf` is full or the
    /// overall `timeout` passes.
    ///
    /// `buf.len()` is the maximum number of bytes read. Bytes land in
    /// `buf[..n]` where `n` is the count in the returned [`StringRead`]; a
    /// terminated read includes the terminator in `n`. Nothing beyond
    /// `buf[..n]` is written. With a finite timeout the remaining budget is
    /// recomputed before every byte, so the whole call is bounded by
    /// `timeout` no matter how many bytes trickle in.
    pub fn read_string(
        &mut self,
        terminator: u8,
        buf: &mut [u8],
        timeout: Timeout,
    ) -> EngineResult<StringRead> {
        let mut timer = ElapsedTimer::start(&self.clock)?;
        let mut filled = 0;

        while filled < buf.len() {
            let elapsed = if timeout.is_infinite() {
                0
            } else {
                timer.elapsed_millis(&self.clock)?
            };
            let Some(budget) = timeout.remaining(elapsed) else {
                debug!("read_string timed out with {} bytes", filled);
                return Ok(StringRead::TimedOut(filled));
            };

            match self.read_byte(budget)? {
                ByteRead::Byte(byte) => {
                    buf[filled] = byte;
                    filled += 1;
                    if byte == terminator {
                        return Ok(StringRead::Terminated(filled));
                    }
                }
                ByteRead::TimedOut => {
                    debug!("read_string timed out with {} bytes", filled);
                    return Ok(StringRead::TimedOut(filled));
                }
            }
        }

        debug!(
            "read_string filled {} bytes without terminator 0x{:02x}",
            filled, terminator
        );
        Ok(StringRead::BufferFull(filled))
    }

    /// Owned variant of [`read_string`](Self::read_string) reading at most
    /// `max_bytes` bytes.
    pub fn read_line(
        &mut self,
        terminator: u8,
        max_bytes: usize,
        timeout: Timeout,
    ) -> EngineResult<LineRead> {
        let mut bytes = vec![0u8; max_bytes];
        let outcome = self.read_string(terminator, &mut bytes, timeout)?;
        bytes.truncate(outcome.len());
        Ok(LineRead { bytes, outcome })
    }

    /// Fill `buf` completely, or return what arrived once `timeout` passes.
    ///
    /// Unlike the byte and string readers this loop yields the processor:
    /// when no data is available it sleeps for `poll_interval` (a zero
    /// interval retries immediately). A deadline expiry is not an error; it
    /// yields [`BlockRead::TimedOut`] with the partial count. An empty `buf`
    /// completes immediately without touching the device.
    pub fn read_bytes(
        &mut self,
        buf: &mut [u8],
        timeout: Timeout,
        poll_interval: Duration,
    ) -> EngineResult<BlockRead> {
        if buf.is_empty() {
            return Ok(BlockRead::Complete(0));
        }

        let mut timer = ElapsedTimer::start(&self.clock)?;
        let mut filled = 0;
        let mut polls: u64 = 0;

        loop {
            if !timeout.is_infinite() && timeout.expired(timer.elapsed_millis(&self.clock)?) {
                debug!(
                    "read_bytes timed out with {} of {} bytes after {} polls",
                    filled,
                    buf.len(),
                    polls
                );
                return Ok(BlockRead::TimedOut(filled));
            }

            match self.device.try_read(&mut buf[filled..]) {
                Ok(0) => {
                    polls += 1;
                    if !poll_interval.is_zero() {
                        std::thread::sleep(poll_interval);
                    }
                }
                Ok(n) => {
                    filled += n;
                    if filled >= buf.len() {
                        trace!("read_bytes complete after {} polls", polls);
                        return Ok(BlockRead::Complete(buf.len()));
                    }
                }
                Err(e) => return Err(read_failed(self.device.name(), e)),
            }
        }
    }
}

fn read_failed(device: &str, e: PortError) -> EngineError {
    warn!("Read from {} failed: {}", device, e);
    EngineError::ReadFailed(e)
}
