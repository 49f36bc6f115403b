//! Bounded registry of active background pipelines.
//!
//! Tracks only the *representative* pid — the pipeline's first stage — for
//! each background job. Capacity is fixed; a full table is a recoverable
//! error the caller falls back on (run the pipeline in the foreground).

pub const CAPACITY: usize = 64;

#[derive(Debug)]
pub struct JobTableFull;

impl std::fmt::Display for JobTableFull {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "myshell: job table full")
    }
}

#[derive(Debug, Clone)]
struct Slot {
    job_id: u64,
    pid: i32,
    command: String,
    active: bool,
}

/// Fixed-capacity, slot-reusing table of background jobs. Job ids increase
/// monotonically for the shell's whole lifetime, even across slot reuse.
pub struct JobTable {
    slots: Vec<Option<Slot>>,
    next_job_id: u64,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTable {
    pub fn new() -> Self {
        Self {
            slots: vec![None; CAPACITY],
            next_job_id: 1,
        }
    }

    /// Registers a newly launched background pipeline, returning its job id.
    pub fn register(&mut self, pid: i32, command: String) -> Result<u64, JobTableFull> {
        let slot_idx = self
            .slots
            .iter()
            .position(|slot| !matches!(slot, Some(s) if s.active));
        let Some(idx) = slot_idx else {
            return Err(JobTableFull);
        };

        let job_id = self.next_job_id;
        self.next_job_id += 1;
        self.slots[idx] = Some(Slot {
            job_id,
            pid,
            command,
            active: true,
        });
        Ok(job_id)
    }

    /// Called from the signal layer when a child exits. Finds the first
    /// active entry with this pid, prints the `Done` line, and deactivates
    /// it. Returns `None` (silently) if no matching active job exists — the
    /// pid belonged to a foreground child or a non-representative pipeline
    /// member.
    pub fn deactivate(&mut self, pid: i32) -> Option<u64> {
        for slot in self.slots.iter_mut().flatten() {
            if slot.active && slot.pid == pid {
                slot.active = false;
                println!("\n[{}] Done    {}", slot.job_id, slot.command);
                return Some(slot.job_id);
            }
        }
        None
    }

    /// Formats the `jobs` built-in's output.
    pub fn listing(&self) -> String {
        let mut active: Vec<&Slot> = self.slots.iter().flatten().filter(|s| s.active).collect();
        active.sort_by_key(|s| s.job_id);

        if active.is_empty() {
            return "No active background jobs.\n".to_string();
        }

        let mut out = String::from("Active background jobs:\n");
        for slot in active {
            out.push_str(&format!(
                "[{}] {}    {}\n",
                slot.job_id, slot.pid, slot.command
            ));
        }
        out
    }

    #[cfg(test)]
    fn active_count(&self) -> usize {
        self.slots.iter().flatten().filter(|s| s.active).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_assigns_monotonic_ids() {
        let mut table = JobTable::new();
        let a = table.register(100, "sleep 1".into()).unwrap();
        let b = table.register(200, "sleep 2".into()).unwrap();
        assert!(b > a);
    }

    #[test]
    fn deactivate_removes_from_listing() {
        let mut table = JobTable::new();
        let id = table.register(100, "sleep 1".into()).unwrap();
        assert!(table.listing().contains(&format!("[{id}] 100")));
        assert_eq!(table.deactivate(100), Some(id));
        assert!(table.listing().contains("No active background jobs."));
    }

    #[test]
    fn deactivate_unknown_pid_is_silently_ignored() {
        let mut table = JobTable::new();
        table.register(100, "sleep 1".into()).unwrap();
        assert_eq!(table.deactivate(999), None);
        assert_eq!(table.active_count(), 1);
    }

    #[test]
    fn ids_keep_increasing_across_slot_reuse() {
        let mut table = JobTable::new();
        let first = table.register(100, "a".into()).unwrap();
        table.deactivate(100);
        let second = table.register(100, "b".into()).unwrap();
        assert!(second > first);
    }

    #[test]
    fn overflow_is_reported_once_capacity_is_full() {
        let mut table = JobTable::new();
        for i in 0..CAPACITY {
            table.register(i as i32 + 1, format!("job{i}")).unwrap();
        }
        assert!(table.register(9999, "overflow".into()).is_err());
    }

    #[test]
    fn empty_listing_message() {
        let table = JobTable::new();
        assert_eq!(table.listing(), "No active background jobs.\n");
    }
}
