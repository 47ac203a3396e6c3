// ============================================================
//  Interactive shell with an embedded batch scheduler.
//
//  On a terminal this is an ordinary prompt loop. With stdin
//  piped in, the whole input is spooled into the code store as
//  the shell's own driver program, marked to run first, and
//  drained through the scheduler like any other process.
// ============================================================

mod config;
mod interpreter;
mod vars;

use std::io::{self, BufRead, IsTerminal, Write};

use interpreter::ShellInterpreter;
use log::debug;
use scheduler::{Interpreter, Policy, Scheduler};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config        = config::load();
    let multithreaded = std::env::args().any(|arg| arg == "-mt") || config.multithreaded;

    let sched = Scheduler::new();
    sched.set_multithreaded(multithreaded);
    let shell = ShellInterpreter::new(sched);

    if io::stdin().is_terminal() {
        interactive(&shell, &config.prompt)?;
    } else {
        batch(&shell);
    }
    Ok(())
}

fn interactive(shell: &ShellInterpreter, prompt: &str) -> io::Result<()> {
    let stdin = io::stdin();
    let mut input = String::new();
    loop {
        print!("{prompt}");
        io::stdout().flush()?;

        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break; // EOF
        }
        shell.execute_line(input.trim_end_matches(['\r', '\n']));
    }
    Ok(())
}

/// Piped stdin becomes the shell's own driver program. Forcing its
/// pid to run first keeps it ahead of any program it schedules,
/// whatever policy those are queued under.
fn batch(shell: &ShellInterpreter) {
    let lines: Vec<String> = io::stdin().lock().lines().map_while(Result::ok).collect();

    let sched = shell.scheduler();
    match sched.submit(&lines, Policy::Fcfs) {
        Ok(pid) => {
            sched.set_first_process_pid(pid);
            let rc = sched.run(shell, Policy::Fcfs);
            debug!("batch driver drained with code {rc}");
        }
        Err(err) => eprintln!("could not load batch input: {err}"),
    }
}
