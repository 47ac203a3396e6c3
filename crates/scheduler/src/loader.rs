// ── script loading ───────────────────────────────────────────────
//
// Programs enter the scheduler here: whole scripts are spooled into
// the code store, get a Pcb each, and are enqueued under the chosen
// policy's initial discipline. Loading is all-or-nothing: any
// failure releases every range this call stored, so the store and
// queue look untouched afterwards.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use code_store::{CodeRange, CodeStore};
use log::debug;
use ready_queue::{Pcb, ReadyQueue};
use thiserror::Error;

use crate::{Interpreter, Policy, Scheduler};

/// Most programs one exec may schedule.
pub const MAX_PROGRAMS: usize = 3;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("code store exhausted")]
    OutOfMemory,
    #[error("one exec schedules 1 to {MAX_PROGRAMS} programs, got {0}")]
    ProgramCount(usize),
}

impl Scheduler {
    /// Load 1–3 script files, enqueue them in argument order, and
    /// drain the queue under `policy`. The result is the scheduler's
    /// return code; a load error means nothing was scheduled.
    pub fn load_and_schedule<I, P>(
        &self,
        interp: &I,
        paths: &[P],
        policy: Policy,
    ) -> Result<i32, LoadError>
    where
        I: Interpreter + Sync,
        P: AsRef<Path>,
    {
        if paths.is_empty() || paths.len() > MAX_PROGRAMS {
            return Err(LoadError::ProgramCount(paths.len()));
        }

        {
            let mut shared = self.lock();
            let mut ranges = Vec::with_capacity(paths.len());
            for path in paths {
                let loaded = read_script(path.as_ref())
                    .and_then(|lines| store_program(&mut shared.store, &lines));
                match loaded {
                    Ok(range) => {
                        debug!("loaded {}: {} lines", path.as_ref().display(), range.len());
                        ranges.push(range);
                    }
                    Err(err) => {
                        for range in ranges {
                            shared.store.release(range);
                        }
                        return Err(err);
                    }
                }
            }

            for range in ranges {
                shared.next_pid += 1;
                let pid = shared.next_pid;
                enqueue(&mut shared.queue, Pcb::new(pid, range), policy);
            }
        }

        Ok(self.run(interp, policy))
    }

    /// Load one in-memory program and enqueue it under `policy`'s
    /// initial discipline. Returns its pid; on failure nothing is
    /// left behind. The batch shell spools stdin through this.
    pub fn submit<S: AsRef<str>>(&self, lines: &[S], policy: Policy) -> Result<u32, LoadError> {
        let mut shared = self.lock();
        let range = store_program(&mut shared.store, lines)?;
        shared.next_pid += 1;
        let pid = shared.next_pid;
        enqueue(&mut shared.queue, Pcb::new(pid, range), policy);
        Ok(pid)
    }
}

/// AGING starts from a score-sorted queue; every other policy takes
/// arrival order.
fn enqueue(queue: &mut ReadyQueue, pcb: Pcb, policy: Policy) {
    match policy {
        Policy::Aging => queue.insert_sorted(pcb),
        _             => queue.push_tail(pcb),
    }
}

fn read_script(path: &Path) -> Result<Vec<String>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    BufReader::new(file)
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Append a whole program to the store. If the store fills up part
/// way through, the partial range is released before reporting.
fn store_program<S: AsRef<str>>(
    store: &mut CodeStore,
    lines: &[S],
) -> Result<CodeRange, LoadError> {
    let start = store.used();
    for (count, line) in lines.iter().enumerate() {
        if store.load_line(line.as_ref()).is_none() {
            store.release(CodeRange::new(start, count));
            return Err(LoadError::OutOfMemory);
        }
    }
    Ok(CodeRange::new(start, lines.len()))
}
