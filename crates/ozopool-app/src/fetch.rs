// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Stale-response fencing for screen refreshes.
//!
//! Every fetch takes a ticket from a monotonically increasing sequence.
//! When a response arrives, it is applied only if its ticket is still
//! the newest issued for that screen; anything older is discarded, so a
//! slow response can never overwrite data from a later request.

use std::collections::BTreeMap;

use crate::ScreenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

#[derive(Debug, Clone, Default)]
pub struct FetchSeq {
    issued: u64,
}

impl FetchSeq {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next ticket. Invalidates all earlier tickets.
    pub fn begin(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    /// True when the ticket is the newest issued; stale completions get
    /// `false` and their payload must be dropped.
    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.issued
    }
}

/// One sequence per screen so a devices refresh cannot invalidate an
/// in-flight users refresh.
#[derive(Debug, Clone, Default)]
pub struct FetchGate {
    sequences: BTreeMap<ScreenKind, FetchSeq>,
}

impl FetchGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, screen: ScreenKind) -> FetchTicket {
        self.sequences.entry(screen).or_default().begin()
    }

    pub fn is_current(&self, screen: ScreenKind, ticket: FetchTicket) -> bool {
        self.sequences
            .get(&screen)
            .is_some_and(|seq| seq.is_current(ticket))
    }
}
