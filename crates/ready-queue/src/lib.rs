// ============================================================
//  Process control blocks and the ready queue.
//
//  A Pcb describes one runnable program: its identity, the code
//  range it owns in the shared store, a program counter, and the
//  two lengths the policies select on (static job_time for SJF,
//  decaying job_length_score for AGING). The queue is an owning
//  VecDeque offering the dequeue disciplines the policies need:
//  head, shortest-job, by-pid, and score-sorted insert. At the
//  handful of programs a shell schedules, the O(n) scans are the
//  simplest thing that works.
// ============================================================

use std::collections::VecDeque;

use code_store::CodeRange;

/// Per-process record carried through the ready queue.
///
/// Owned by exactly one place at a time: the queue it waits in, or
/// the policy loop that popped it for a slice.
#[derive(Debug)]
pub struct Pcb {
    pub pid: u32,
    pub code: CodeRange,
    /// Index of the next instruction to execute.
    pub pc: usize,
    /// Static length in instructions; SJF selects on this.
    pub job_time: usize,
    /// AGING priority, lower runs sooner. Starts equal to `job_time`
    /// and only ever decays, floored at zero.
    pub job_length_score: usize,
}

impl Pcb {
    pub fn new(pid: u32, code: CodeRange) -> Self {
        let job_time = code.len();
        Self {
            pid,
            pc: code.start(),
            job_time,
            job_length_score: job_time,
            code,
        }
    }

    /// True once the program counter has passed the last instruction.
    pub fn finished(&self) -> bool {
        self.pc >= self.code.limit()
    }

    /// Give up the code range so the store can release it.
    pub fn into_code(self) -> CodeRange {
        self.code
    }
}

#[derive(Debug, Default)]
pub struct ReadyQueue {
    queue: VecDeque<Pcb>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self { queue: VecDeque::new() }
    }

    /// FIFO append.
    pub fn push_tail(&mut self, pcb: Pcb) {
        self.queue.push_back(pcb);
    }

    /// Prepend; lets a running process keep the head of the line.
    pub fn push_head(&mut self, pcb: Pcb) {
        self.queue.push_front(pcb);
    }

    pub fn pop_head(&mut self) -> Option<Pcb> {
        self.queue.pop_front()
    }

    pub fn peek_head(&self) -> Option<&Pcb> {
        self.queue.front()
    }

    /// Remove the process with the smallest `job_time`. Ties go to
    /// the one nearest the head.
    pub fn pop_shortest(&mut self) -> Option<Pcb> {
        let mut shortest = 0;
        for (idx, pcb) in self.queue.iter().enumerate() {
            if pcb.job_time < self.queue[shortest].job_time {
                shortest = idx;
            }
        }
        self.queue.remove(shortest)
    }

    /// Remove the process with this pid, if it is queued.
    pub fn pop_pid(&mut self, pid: u32) -> Option<Pcb> {
        let idx = self.queue.iter().position(|pcb| pcb.pid == pid)?;
        self.queue.remove(idx)
    }

    /// Place `pcb` so scores stay non-decreasing from the head.
    /// A new entry lands after existing entries with the same score,
    /// so equal-score processes keep their arrival order.
    pub fn insert_sorted(&mut self, pcb: Pcb) {
        let idx = self
            .queue
            .iter()
            .position(|queued| queued.job_length_score > pcb.job_length_score)
            .unwrap_or(self.queue.len());
        self.queue.insert(idx, pcb);
    }

    /// One aging step: every waiting process gets one score point of
    /// relief, floored at zero. The process currently holding the CPU
    /// is not in the queue and is untouched.
    pub fn age_all(&mut self) {
        for pcb in self.queue.iter_mut() {
            pcb.job_length_score = pcb.job_length_score.saturating_sub(1);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Queue-only tests never touch a real store, so overlapping
    /// ranges starting at zero are fine here.
    fn pcb(pid: u32, job_time: usize) -> Pcb {
        Pcb::new(pid, CodeRange::new(0, job_time))
    }

    fn pcb_scored(pid: u32, job_time: usize, score: usize) -> Pcb {
        let mut p = pcb(pid, job_time);
        p.job_length_score = score;
        p
    }

    fn pids(queue: &mut ReadyQueue) -> Vec<u32> {
        let mut out = Vec::new();
        while let Some(p) = queue.pop_head() {
            out.push(p.pid);
        }
        out
    }

    mod fifo_discipline {
        use super::*;

        #[test]
        fn pop_head_returns_processes_in_arrival_order() {
            let mut queue = ReadyQueue::new();
            queue.push_tail(pcb(1, 2));
            queue.push_tail(pcb(2, 1));
            assert_eq!(queue.pop_head().unwrap().pid, 1);
            assert_eq!(queue.pop_head().unwrap().pid, 2);
        }

        #[test]
        fn pop_head_of_empty_queue_is_none() {
            let mut queue = ReadyQueue::new();
            assert!(queue.pop_head().is_none());
        }

        #[test]
        fn push_head_puts_a_process_in_front() {
            let mut queue = ReadyQueue::new();
            queue.push_tail(pcb(1, 2));
            queue.push_head(pcb(2, 2));
            assert_eq!(pids(&mut queue), vec![2, 1]);
        }

        #[test]
        fn peek_head_does_not_remove() {
            let mut queue = ReadyQueue::new();
            queue.push_tail(pcb(7, 3));
            assert_eq!(queue.peek_head().unwrap().pid, 7);
            assert_eq!(queue.len(), 1);
        }

        #[test]
        fn empty_and_len_agree() {
            let mut queue = ReadyQueue::new();
            assert!(queue.is_empty());
            queue.push_tail(pcb(1, 1));
            assert!(!queue.is_empty());
            assert_eq!(queue.len(), 1);
            queue.pop_head();
            assert!(queue.is_empty());
            assert_eq!(queue.len(), 0);
        }
    }

    mod shortest_job {
        use super::*;

        #[test]
        fn pop_shortest_picks_minimum_job_time() {
            let mut queue = ReadyQueue::new();
            queue.push_tail(pcb(1, 5));
            queue.push_tail(pcb(2, 2));
            queue.push_tail(pcb(3, 9));
            assert_eq!(queue.pop_shortest().unwrap().pid, 2);
        }

        #[test]
        fn equal_job_times_resolve_to_the_earlier_arrival() {
            let mut queue = ReadyQueue::new();
            queue.push_tail(pcb(1, 3));
            queue.push_tail(pcb(2, 3));
            assert_eq!(queue.pop_shortest().unwrap().pid, 1);
        }

        #[test]
        fn pop_shortest_drains_in_length_order() {
            let mut queue = ReadyQueue::new();
            queue.push_tail(pcb(1, 4));
            queue.push_tail(pcb(2, 1));
            queue.push_tail(pcb(3, 3));
            let mut order = Vec::new();
            while let Some(p) = queue.pop_shortest() {
                order.push(p.pid);
            }
            assert_eq!(order, vec![2, 3, 1]);
        }

        #[test]
        fn pop_shortest_of_empty_queue_is_none() {
            let mut queue = ReadyQueue::new();
            assert!(queue.pop_shortest().is_none());
        }
    }

    mod by_pid {
        use super::*;

        #[test]
        fn pop_pid_removes_only_the_matching_process() {
            let mut queue = ReadyQueue::new();
            queue.push_tail(pcb(1, 1));
            queue.push_tail(pcb(2, 1));
            queue.push_tail(pcb(3, 1));
            assert_eq!(queue.pop_pid(2).unwrap().pid, 2);
            assert_eq!(pids(&mut queue), vec![1, 3]);
        }

        #[test]
        fn pop_pid_of_absent_process_is_none_and_leaves_queue_alone() {
            let mut queue = ReadyQueue::new();
            queue.push_tail(pcb(1, 1));
            assert!(queue.pop_pid(42).is_none());
            assert_eq!(queue.len(), 1);
        }
    }

    mod sorted_insert {
        use super::*;

        fn scores(queue: &mut ReadyQueue) -> Vec<usize> {
            let mut out = Vec::new();
            while let Some(p) = queue.pop_head() {
                out.push(p.job_length_score);
            }
            out
        }

        #[test]
        fn insert_keeps_scores_non_decreasing() {
            let mut queue = ReadyQueue::new();
            for (pid, score) in [(1, 5), (2, 2), (3, 8), (4, 1)] {
                queue.insert_sorted(pcb_scored(pid, 3, score));
            }
            assert_eq!(scores(&mut queue), vec![1, 2, 5, 8]);
        }

        #[test]
        fn equal_scores_keep_insertion_order() {
            let mut queue = ReadyQueue::new();
            queue.insert_sorted(pcb_scored(1, 3, 4));
            queue.insert_sorted(pcb_scored(2, 3, 4));
            queue.insert_sorted(pcb_scored(3, 3, 4));
            assert_eq!(pids(&mut queue), vec![1, 2, 3]);
        }

        #[test]
        fn lower_score_overtakes_the_head() {
            let mut queue = ReadyQueue::new();
            queue.insert_sorted(pcb_scored(1, 6, 6));
            queue.insert_sorted(pcb_scored(2, 2, 2));
            assert_eq!(queue.peek_head().unwrap().pid, 2);
        }
    }

    mod aging {
        use super::*;

        #[test]
        fn age_all_lowers_every_waiting_score_by_one() {
            let mut queue = ReadyQueue::new();
            queue.push_tail(pcb_scored(1, 5, 5));
            queue.push_tail(pcb_scored(2, 3, 3));
            queue.age_all();
            let collected = pids_and_scores(&mut queue);
            assert_eq!(collected, vec![(1, 4), (2, 2)]);
        }

        #[test]
        fn scores_never_go_below_zero() {
            let mut queue = ReadyQueue::new();
            queue.push_tail(pcb_scored(1, 1, 0));
            queue.age_all();
            queue.age_all();
            assert_eq!(queue.pop_head().unwrap().job_length_score, 0);
        }

        fn pids_and_scores(queue: &mut ReadyQueue) -> Vec<(u32, usize)> {
            let mut out = Vec::new();
            while let Some(p) = queue.pop_head() {
                out.push((p.pid, p.job_length_score));
            }
            out
        }
    }

    mod randomized {
        use super::*;
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        #[test]
        fn pop_shortest_always_drains_in_non_decreasing_job_time() {
            let mut rng = StdRng::seed_from_u64(42);
            let mut queue = ReadyQueue::new();
            for pid in 1..=50 {
                queue.push_tail(pcb(pid, rng.gen_range(0..20)));
            }

            let mut prev = 0;
            while let Some(p) = queue.pop_shortest() {
                assert!(
                    p.job_time >= prev,
                    "job_time went backwards: {prev} → {}",
                    p.job_time
                );
                prev = p.job_time;
            }
        }

        #[test]
        fn sorted_insert_keeps_the_queue_ordered_under_random_traffic() {
            let mut rng = StdRng::seed_from_u64(7);
            let mut queue = ReadyQueue::new();
            for pid in 1..=50 {
                let score = rng.gen_range(0..10);
                queue.insert_sorted(pcb_scored(pid, score, score));
                if rng.gen_bool(0.2) {
                    queue.pop_head();
                }
                if rng.gen_bool(0.1) {
                    queue.age_all();
                }
            }

            let mut prev = 0;
            while let Some(p) = queue.pop_head() {
                assert!(
                    p.job_length_score >= prev,
                    "scores out of order after mixed traffic"
                );
                prev = p.job_length_score;
            }
        }
    }
}
