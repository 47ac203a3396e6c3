fn main() {
    use scheduler::{Interpreter, Policy, Scheduler};

    struct Echo;
    impl Interpreter for Echo {
        fn execute_line(&self, line: &str) -> i32 {
            println!("> {line}");
            0
        }
    }

    let sched = Scheduler::new();
    let programs: [&[&str]; 3] = [
        &["echo a1", "echo a2", "echo a3"],
        &["echo b1", "echo b2"],
        &["echo c1"],
    ];
    for lines in programs {
        sched.submit(lines, Policy::Rr).expect("programs fit in the store");
    }

    let rc = sched.run(&Echo, Policy::Rr);
    println!("scheduler returned {rc}");
}
