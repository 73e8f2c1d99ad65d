use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobTicket(u64);

#[derive(Debug)]
struct Occupant {
    ticket: JobTicket,
    pid: Option<u32>,
}

#[derive(Debug, Default)]
struct SlotState {
    next_ticket: u64,
    occupant: Option<Occupant>,
}

/// Single-occupancy holder for the running conversion process.
#[derive(Debug, Default)]
pub struct JobSlot {
    state: Mutex<SlotState>,
}

impl JobSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<JobTicket> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if state.occupant.is_some() {
            return None;
        }

        state.next_ticket += 1;
        let ticket = JobTicket(state.next_ticket);
        state.occupant.replace(Occupant { ticket, pid: None });

        Some(ticket)
    }

    /// Records the process ID for the holder of `ticket`. Returns `false`
    /// when the slot was cleared in the meantime.
    pub fn attach(&self, ticket: JobTicket, pid: u32) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        match state.occupant.as_mut() {
            Some(occupant) if occupant.ticket == ticket => {
                occupant.pid.replace(pid);
                true
            }
            _ => false,
        }
    }

    /// Clears the slot only if `ticket` still holds it.
    pub fn release(&self, ticket: JobTicket) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if matches!(&state.occupant, Some(occupant) if occupant.ticket == ticket) {
            state.occupant.take();
        }
    }

    /// Empties the slot unconditionally and hands back the process ID, if a
    /// process had been attached.
    pub fn take(&self) -> Option<Option<u32>> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        state.occupant.take().map(|occupant| occupant.pid)
    }

    pub fn is_busy(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        state.occupant.is_some()
    }
}
