use super::*;

impl FunnelPlayer {
    pub fn now_ms(&self) -> u64 {
        self.scheduler.now()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    /// Moves the virtual clock forward by `ms`, firing every task that falls
    /// due on the way.
    pub fn advance_by(&mut self, ms: u64) -> usize {
        let until = self.scheduler.now().saturating_add(ms);
        self.advance_to(until)
    }

    pub fn advance_to(&mut self, until: u64) -> usize {
        let mut fired = 0usize;
        while fired < MAX_TASKS_PER_RUN {
            let Some((generation, task)) = self.scheduler.pop_due(until) else {
                break;
            };
            self.fire(generation, task);
            fired += 1;
        }
        if fired == MAX_TASKS_PER_RUN {
            tracing::warn!(fired, "task limit reached while advancing the clock");
            return fired;
        }
        self.scheduler.set_now(until);
        fired
    }

    /// Fires tasks until none are left: the player is then waiting on the
    /// visitor or finished. Returns the clock afterwards.
    pub fn run_until_idle(&mut self) -> u64 {
        let mut fired = 0usize;
        while let Some((generation, task)) = self.scheduler.pop_due(u64::MAX) {
            self.fire(generation, task);
            fired += 1;
            if fired >= MAX_TASKS_PER_RUN {
                tracing::warn!(fired, "task limit reached while running to idle");
                break;
            }
        }
        self.scheduler.now()
    }
}
