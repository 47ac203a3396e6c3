/// The five scheduling disciplines the shell's `exec` accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// First-come-first-served: run each program to completion in
    /// arrival order.
    Fcfs,
    /// Shortest-job-first: always pick the program with the fewest
    /// instructions.
    Sjf,
    /// Round-robin, two instructions per slice.
    Rr,
    /// Round-robin, thirty instructions per slice.
    Rr30,
    /// Shortest-job-first with starvation relief: one-instruction
    /// slices, waiters gain priority while they wait.
    Aging,
}

impl Policy {
    /// Parse an `exec` policy token. Case-sensitive.
    pub fn from_token(token: &str) -> Option<Policy> {
        match token {
            "FCFS"  => Some(Policy::Fcfs),
            "SJF"   => Some(Policy::Sjf),
            "RR"    => Some(Policy::Rr),
            "RR30"  => Some(Policy::Rr30),
            "AGING" => Some(Policy::Aging),
            _       => None,
        }
    }

    /// Instructions one slice may execute before the policy gets to
    /// re-decide. None means run to completion.
    pub fn quantum(self) -> Option<usize> {
        match self {
            Policy::Fcfs | Policy::Sjf => None,
            Policy::Rr                 => Some(2),
            Policy::Rr30               => Some(30),
            Policy::Aging              => Some(1),
        }
    }
}
