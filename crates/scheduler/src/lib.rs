// ============================================================
//  Batch scheduler core.
//
//  Programs live as line ranges in the shared code store; a Pcb
//  per program waits in the ready queue. run() drains the queue
//  under one of five policies, feeding each instruction to an
//  external Interpreter and never inspecting the text itself.
//
//  All shared state sits in one struct behind one mutex. The
//  single-threaded policies take the lock briefly around each
//  queue operation and each line fetch; the opt-in multithreaded
//  round-robin mode adds two workers that cooperate on the same
//  queue through that mutex and a condition variable.
// ============================================================

mod loader;
mod policy;

pub use loader::{LoadError, MAX_PROGRAMS};
pub use policy::Policy;

use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use code_store::CodeStore;
use log::debug;
use ready_queue::{Pcb, ReadyQueue};

/// Fixed size of the round-robin worker pool.
pub const WORKERS: usize = 2;

/// Hook the scheduler drives once per instruction. The returned code
/// is 0 for success; the scheduler records the latest non-zero code
/// and reports it from `run`.
pub trait Interpreter {
    fn execute_line(&self, line: &str) -> i32;
}

/// Everything the policy loops and workers share.
struct Shared {
    queue: ReadyQueue,
    store: CodeStore,
    next_pid: u32,
    /// One-shot override: this pid is dequeued ahead of whatever the
    /// policy would normally pick. Cleared on first use.
    forced_first: Option<u32>,
    run_active: bool,
    multithreaded: bool,
    /// Slices currently executing on worker threads.
    active_jobs: usize,
    quit: bool,
}

pub struct Scheduler {
    shared: Mutex<Shared>,
    work_ready: Condvar,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            shared: Mutex::new(Shared {
                queue:         ReadyQueue::new(),
                store:         CodeStore::new(),
                next_pid:      0,
                forced_first:  None,
                run_active:    false,
                multithreaded: false,
                active_jobs:   0,
                quit:          false,
            }),
            work_ready: Condvar::new(),
        }
    }

    /// Drain the ready queue under `policy`. Returns the last error
    /// code the interpreter produced, or 0 if every line succeeded.
    /// Calling `run` while a run is already active returns 1 without
    /// touching any state.
    pub fn run<I: Interpreter + Sync>(&self, interp: &I, policy: Policy) -> i32 {
        let multithreaded;
        {
            let mut shared = self.lock();
            if shared.run_active {
                return 1;
            }
            shared.run_active = true;
            multithreaded = shared.multithreaded;
        }

        let rc = if multithreaded && matches!(policy, Policy::Rr | Policy::Rr30) {
            let quantum = if policy == Policy::Rr { 2 } else { 30 };
            self.run_workers(interp, quantum)
        } else {
            match policy {
                Policy::Fcfs  => self.run_fcfs(interp),
                Policy::Sjf   => self.run_sjf(interp),
                Policy::Rr    => self.run_rr(interp, 2),
                Policy::Rr30  => self.run_rr(interp, 30),
                Policy::Aging => self.run_aging(interp),
            }
        };

        self.lock().run_active = false;
        rc
    }

    /// Route RR/RR30 runs through the worker pool.
    pub fn set_multithreaded(&self, enabled: bool) {
        self.lock().multithreaded = enabled;
    }

    pub fn multithreaded(&self) -> bool {
        self.lock().multithreaded
    }

    /// Make this pid the next process dequeued, once, under every
    /// policy. Lets a driver script run before the programs it
    /// scheduled.
    pub fn set_first_process_pid(&self, pid: u32) {
        self.lock().forced_first = Some(pid);
    }

    /// Processes waiting in the ready queue.
    pub fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    /// Instruction slots currently holding code.
    pub fn stored_lines(&self) -> usize {
        self.lock().store.occupied()
    }

    // ── policy loops ─────────────────────────────────────────────

    fn run_fcfs(&self, interp: &impl Interpreter) -> i32 {
        let mut last_error = 0;
        while let Some(mut pcb) = self.next_arrival() {
            last_error = self.run_slice(interp, &mut pcb, None, last_error);
            self.retire(pcb);
        }
        last_error
    }

    fn run_sjf(&self, interp: &impl Interpreter) -> i32 {
        let mut last_error = 0;
        while let Some(mut pcb) = self.next_shortest() {
            last_error = self.run_slice(interp, &mut pcb, None, last_error);
            self.retire(pcb);
        }
        last_error
    }

    fn run_rr(&self, interp: &impl Interpreter, quantum: usize) -> i32 {
        let mut last_error = 0;
        while let Some(mut pcb) = self.next_arrival() {
            last_error = self.run_slice(interp, &mut pcb, Some(quantum), last_error);
            if pcb.finished() {
                self.retire(pcb);
            } else {
                self.lock().queue.push_tail(pcb);
            }
        }
        last_error
    }

    fn run_aging(&self, interp: &impl Interpreter) -> i32 {
        let mut last_error = 0;
        while let Some(mut pcb) = self.next_arrival() {
            last_error = self.run_slice(interp, &mut pcb, Some(1), last_error);
            if pcb.finished() {
                self.retire(pcb);
                continue;
            }

            let mut shared = self.lock();
            // age waiting jobs, not the one that just ran
            shared.queue.age_all();
            // it keeps the CPU unless a waiter is now strictly lower
            let overtaken = shared
                .queue
                .peek_head()
                .map_or(false, |head| head.job_length_score < pcb.job_length_score);
            if overtaken {
                shared.queue.insert_sorted(pcb);
            } else {
                shared.queue.push_head(pcb);
            }
        }
        last_error
    }

    // ── slice execution ──────────────────────────────────────────

    /// Step instructions from the program counter until the program
    /// ends or `quantum` steps have run (None = to completion). The
    /// counter advances over empty slots too; an empty slot executes
    /// nothing. Returns the latest interpreter code, or `last_error`
    /// if no line ran.
    fn run_slice(
        &self,
        interp: &impl Interpreter,
        pcb: &mut Pcb,
        quantum: Option<usize>,
        mut last_error: i32,
    ) -> i32 {
        let mut executed = 0;
        while !pcb.finished() && quantum.map_or(true, |q| executed < q) {
            // clone the line out so the interpreter runs unlocked
            let line = self.lock().store.get_line(pcb.pc).map(str::to_string);
            if let Some(line) = line {
                last_error = interp.execute_line(&line);
            }
            pcb.pc += 1;
            executed += 1;
        }
        last_error
    }

    /// A finished process gives its code range back to the store.
    fn retire(&self, pcb: Pcb) {
        debug!("pid {} finished", pcb.pid);
        self.lock().store.release(pcb.into_code());
    }

    // ── dequeue steps ────────────────────────────────────────────

    /// Read-and-clear the forced-first pid. Cleared even when the
    /// pid is no longer queued.
    fn take_forced(shared: &mut Shared) -> Option<Pcb> {
        let pid = shared.forced_first.take()?;
        shared.queue.pop_pid(pid)
    }

    fn next_arrival(&self) -> Option<Pcb> {
        let mut shared = self.lock();
        Self::take_forced(&mut shared).or_else(|| shared.queue.pop_head())
    }

    fn next_shortest(&self) -> Option<Pcb> {
        let mut shared = self.lock();
        Self::take_forced(&mut shared).or_else(|| shared.queue.pop_shortest())
    }

    // ── two-worker round-robin ───────────────────────────────────

    fn run_workers<I: Interpreter + Sync>(&self, interp: &I, quantum: usize) -> i32 {
        {
            let mut shared = self.lock();
            shared.quit = false;
            shared.active_jobs = 0;
        }

        thread::scope(|scope| {
            for worker in 0..WORKERS {
                scope.spawn(move || self.worker_loop(interp, quantum, worker));
            }

            // done only when the queue is empty AND no slice is still
            // in flight on a worker
            loop {
                {
                    let shared = self.lock();
                    if shared.queue.is_empty() && shared.active_jobs == 0 {
                        break;
                    }
                }
                thread::sleep(Duration::from_millis(1));
            }

            self.lock().quit = true;
            self.work_ready.notify_all();
        });

        0
    }

    fn worker_loop<I: Interpreter + Sync>(&self, interp: &I, quantum: usize, worker: usize) {
        debug!("worker {worker} up");
        loop {
            let mut shared = self.lock();
            while !shared.quit && shared.queue.is_empty() {
                shared = self
                    .work_ready
                    .wait(shared)
                    .expect("scheduler lock poisoned");
            }
            if shared.quit && shared.queue.is_empty() {
                break;
            }

            let popped = Self::take_forced(&mut shared).or_else(|| shared.queue.pop_head());
            let Some(mut pcb) = popped else {
                drop(shared);
                continue;
            };
            shared.active_jobs += 1;
            drop(shared);

            self.run_slice(interp, &mut pcb, Some(quantum), 0);

            let mut shared = self.lock();
            if pcb.finished() {
                debug!("worker {worker}: pid {} finished", pcb.pid);
                shared.store.release(pcb.into_code());
            } else {
                shared.queue.push_tail(pcb);
            }
            shared.active_jobs -= 1;
            drop(shared);
            self.work_ready.notify_all();
        }
        debug!("worker {worker} down");
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().expect("scheduler lock poisoned")
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::Interpreter;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Interpreter that records every line it is handed and returns a
    /// fixed code.
    pub struct Recorder {
        lines: Mutex<Vec<String>>,
        code:  i32,
    }

    impl Recorder {
        pub fn new() -> Self {
            Self::with_code(0)
        }

        pub fn with_code(code: i32) -> Self {
            Self { lines: Mutex::new(Vec::new()), code }
        }

        pub fn seen(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl Interpreter for Recorder {
        fn execute_line(&self, line: &str) -> i32 {
            self.lines.lock().unwrap().push(line.to_string());
            self.code
        }
    }

    /// Write a script into a per-test scratch directory.
    pub fn script<S: AsRef<str>>(test: &str, name: &str, lines: &[S]) -> PathBuf {
        let dir = std::env::temp_dir().join("sched-shell-tests").join(test);
        fs::create_dir_all(&dir).expect("create scratch dir");
        let path = dir.join(name);
        let body: Vec<&str> = lines.iter().map(|l| l.as_ref()).collect();
        fs::write(&path, body.join("\n")).expect("write script");
        path
    }
}
