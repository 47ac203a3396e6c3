// ── command dispatch ─────────────────────────────────────────────
//
// One instruction at a time: the REPL, the batch driver, and the
// scheduler all feed lines through execute_line. Commands print
// their own diagnostics and hand back an error code; the scheduler
// records the latest non-zero code and reports it from run().

use std::cmp::Ordering;
use std::fs;
use std::process::Command;

use log::{debug, warn};
use scheduler::{Interpreter, LoadError, Policy, Scheduler};

use crate::vars::VarStore;

pub struct ShellInterpreter {
    sched: Scheduler,
    vars:  VarStore,
}

impl ShellInterpreter {
    pub fn new(sched: Scheduler) -> Self {
        Self { sched, vars: VarStore::new() }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.sched
    }

    fn set(&self, name: &str, value: &str) -> i32 {
        self.vars.set(name, value);
        0
    }

    fn print(&self, name: &str) -> i32 {
        match self.vars.get(name) {
            Some(value) => println!("{value}"),
            None        => println!("Variable does not exist"),
        }
        0
    }

    /// Echo a token; `$NAME` expands to the variable's value, or to
    /// the empty string when it was never set.
    fn echo(&self, token: &str) -> i32 {
        match token.strip_prefix('$') {
            Some(name) => println!("{}", self.vars.get(name).unwrap_or_default()),
            None       => println!("{token}"),
        }
        0
    }

    /// Create a directory. Only a bad name is a command error; a
    /// failing mkdir (the directory may already exist) is logged and
    /// otherwise ignored.
    fn my_mkdir(&self, name: &str) -> i32 {
        let name = match name.strip_prefix('$') {
            Some(var) => match self.vars.get(var) {
                Some(value) => value,
                None        => return bad_command_mkdir(),
            },
            None => name.to_string(),
        };
        if !is_alphanumeric(&name) {
            return bad_command_mkdir();
        }

        if let Err(err) = fs::create_dir(&name) {
            warn!("my_mkdir {name}: {err}");
        }
        0
    }

    /// Run a script as a scheduled process of its own.
    fn source(&self, path: &str) -> i32 {
        match self.sched.load_and_schedule(self, &[path], Policy::Fcfs) {
            Ok(rc)                      => rc,
            Err(LoadError::Open { .. }) => bad_command_file_not_found(),
            Err(_)                      => 1,
        }
    }

    /// `exec P1 [P2] [P3] POLICY`: validate, then load and schedule.
    fn exec(&self, args: &[&str]) -> i32 {
        let (scripts, policy_token) = args.split_at(args.len() - 1);

        let Some(policy) = Policy::from_token(policy_token[0]) else {
            return bad_command_exec_policy();
        };

        for (idx, script) in scripts.iter().enumerate() {
            if scripts[idx + 1..].contains(script) {
                return bad_command_exec_duplicate();
            }
        }

        match self.sched.load_and_schedule(self, scripts, policy) {
            Ok(rc) => rc,
            Err(err) => {
                debug!("exec load failed: {err}");
                bad_command_exec_load()
            }
        }
    }
}

impl Interpreter for ShellInterpreter {
    fn execute_line(&self, line: &str) -> i32 {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            return 0;
        };

        match (command, args.len()) {
            ("help", 0)     => help(),
            ("quit", 0)     => quit(),
            ("set", 2)      => self.set(args[0], args[1]),
            ("print", 1)    => self.print(args[0]),
            ("echo", 1)     => self.echo(args[0]),
            ("my_ls", 0)    => my_ls(),
            ("my_mkdir", 1) => self.my_mkdir(args[0]),
            ("my_touch", 1) => my_touch(args[0]),
            ("my_cd", 1)    => my_cd(args[0]),
            ("source", 1)   => self.source(args[0]),
            ("run", n) if n >= 1 => run_external(args),
            ("exec", n) if (2..=4).contains(&n) => self.exec(args),
            ("exec", _) => bad_command_exec(),
            _           => bad_command(),
        }
    }
}

// ── builtins without shell state ─────────────────────────────────

const HELP_TEXT: &str = "\
COMMAND\t\t\t\tDESCRIPTION
help\t\t\t\tDisplays all the commands
quit\t\t\t\tExits the shell
set VAR STRING\t\t\tAssigns a value to shell memory
print VAR\t\t\tDisplays the STRING assigned to VAR
echo TOK\t\t\tDisplays TOK, expanding $VAR
my_ls\t\t\t\tLists the current directory
my_mkdir DIR\t\t\tCreates a directory
my_touch FILE\t\t\tCreates an empty file
my_cd DIR\t\t\tChanges the current directory
run PROG ARGS\t\t\tRuns an external program and waits
source SCRIPT.TXT\t\tExecutes the file SCRIPT.TXT
exec p1 [p2] [p3] POLICY\tSchedules up to 3 programs";

fn help() -> i32 {
    println!("{HELP_TEXT}");
    0
}

fn quit() -> i32 {
    println!("Bye!");
    std::process::exit(0);
}

fn my_ls() -> i32 {
    let entries = match fs::read_dir(".") {
        Ok(entries) => entries,
        Err(err) => {
            eprintln!("my_ls couldn't scan the directory: {err}");
            return 0;
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| !name.starts_with('.'))
        .collect();
    names.sort_by(|a, b| ls_order(a, b));

    for name in names {
        println!("{name}");
    }
    0
}

/// Listing order: digits before letters, letters alphabetically with
/// case ignored, and for the same letter the capital goes first.
fn ls_order(a: &str, b: &str) -> Ordering {
    let mut rhs = b.chars();
    for ca in a.chars() {
        match rhs.next() {
            None => return Ordering::Greater,
            Some(cb) => {
                let ord = ls_char_order(ca, cb);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
    if rhs.next().is_some() {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

fn ls_char_order(a: char, b: char) -> Ordering {
    match (a.is_ascii_digit(), b.is_ascii_digit()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => {
            let (la, lb) = (a.to_ascii_lowercase(), b.to_ascii_lowercase());
            if la == lb {
                a.cmp(&b)
            } else {
                la.cmp(&lb)
            }
        }
    }
}

fn is_alphanumeric(name: &str) -> bool {
    name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Create the file if it is missing; failure is ignored.
fn my_touch(path: &str) -> i32 {
    let _ = fs::OpenOptions::new().create(true).append(true).open(path);
    0
}

fn my_cd(dir: &str) -> i32 {
    match std::env::set_current_dir(dir) {
        Ok(())  => 0,
        Err(_)  => bad_command_cd(),
    }
}

/// Spawn an external program and wait for it.
fn run_external(args: &[&str]) -> i32 {
    match Command::new(args[0]).args(&args[1..]).status() {
        Ok(_) => 0,
        Err(err) => {
            eprintln!("run: {err}");
            1
        }
    }
}

// ── diagnostics ──────────────────────────────────────────────────

fn bad_command() -> i32 {
    println!("Unknown Command");
    1
}

fn bad_command_exec() -> i32 {
    println!("Bad command: exec");
    1
}

fn bad_command_exec_policy() -> i32 {
    println!("Bad command: exec policy");
    1
}

fn bad_command_exec_duplicate() -> i32 {
    println!("Bad command: exec duplicate program");
    1
}

fn bad_command_exec_load() -> i32 {
    println!("Bad command: exec load");
    1
}

fn bad_command_file_not_found() -> i32 {
    println!("Bad command: File not found");
    3
}

fn bad_command_mkdir() -> i32 {
    println!("Bad command: my_mkdir");
    4
}

fn bad_command_cd() -> i32 {
    println!("Bad command: my_cd");
    5
}
