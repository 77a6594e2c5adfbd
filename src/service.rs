// Licensed under the Apache-2.0 license

//! Cooperative service scheduler.
//!
//! Each sensor driver exposes a zero-argument poll entry point; the registry
//! keeps them in registration (FIFO) order and the daemon walks the whole
//! list once per call, waiting a fixed interval after each invocation. The
//! scheduler has no visibility into per-callback success: it is a pure
//! invoke-in-order mechanism, and the outer loop owns the cadence.

use embedded_hal::delay::DelayNs;
use fugit::MillisDurationU32;

/// Upper bound on registered services per node.
pub const MAX_SERVICES: usize = 10;

/// Wait applied after each service invocation unless the entry carries its
/// own hint.
pub const DEFAULT_POLL_INTERVAL: MillisDurationU32 = MillisDurationU32::from_ticks(100);

/// Scheduling class of a service. Currently uniform; kept as a tag so the
/// daemon can grow per-kind policy without touching registrations.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ServiceKind {
    Poll,
}

/// One registered polling service.
pub struct ServiceEntry<'a> {
    callback: &'a mut dyn FnMut(),
    kind: ServiceKind,
    timeout_hint: Option<MillisDurationU32>,
}

impl<'a> ServiceEntry<'a> {
    pub fn new(callback: &'a mut dyn FnMut()) -> Self {
        Self {
            callback,
            kind: ServiceKind::Poll,
            timeout_hint: None,
        }
    }

    /// Advisory wait after invoking this entry, overriding the daemon
    /// interval.
    #[must_use]
    pub fn with_timeout_hint(mut self, hint: MillisDurationU32) -> Self {
        self.timeout_hint = Some(hint);
        self
    }

    #[must_use]
    pub fn kind(&self) -> ServiceKind {
        self.kind
    }
}

/// FIFO list of registered services.
#[derive(Default)]
pub struct ServiceRegistry<'a> {
    entries: heapless::Vec<ServiceEntry<'a>, MAX_SERVICES>,
}

impl<'a> ServiceRegistry<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: heapless::Vec::new(),
        }
    }

    /// Append a service; invocation order is registration order.
    ///
    /// # Errors
    ///
    /// Returns the entry when the registry is full.
    pub fn register(&mut self, entry: ServiceEntry<'a>) -> Result<(), ServiceEntry<'a>> {
        self.entries.push(entry)
    }

    /// Remove and return the most recently registered service.
    ///
    /// There is no by-identity removal: registrations can only be undone in
    /// reverse order.
    pub fn unregister(&mut self) -> Option<ServiceEntry<'a>> {
        self.entries.pop()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Walks the registered services, invoking each in turn.
pub struct Daemon<'a> {
    services: ServiceRegistry<'a>,
    interval: MillisDurationU32,
}

impl<'a> Daemon<'a> {
    pub fn new(services: ServiceRegistry<'a>) -> Self {
        Self::with_interval(services, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_interval(services: ServiceRegistry<'a>, interval: MillisDurationU32) -> Self {
        Self { services, interval }
    }

    pub fn services_mut(&mut self) -> &mut ServiceRegistry<'a> {
        &mut self.services
    }

    /// One cooperative pass: invoke every service front to back, waiting the
    /// inter-entry interval (or the entry's own hint) after each. An empty
    /// list completes immediately. Callback failures are not observed.
    pub fn run_once(&mut self, delay: &mut impl DelayNs) {
        let interval = self.interval;
        for entry in self.services.entries.iter_mut() {
            (entry.callback)();
            let wait = entry.timeout_hint.unwrap_or(interval);
            delay.delay_ms(wait.ticks());
        }
    }
}
