fn main() {
    use code_store::CodeRange;
    use ready_queue::{Pcb, ReadyQueue};

    let mut queue = ReadyQueue::new();
    queue.push_tail(Pcb::new(1, CodeRange::new(0, 4)));
    queue.push_tail(Pcb::new(2, CodeRange::new(4, 1)));
    queue.push_tail(Pcb::new(3, CodeRange::new(5, 3)));

    println!("shortest-job drain order:");
    while let Some(pcb) = queue.pop_shortest() {
        println!("  pid {} ({} instructions)", pcb.pid, pcb.job_time);
    }
}
