use serde::{Deserialize, Serialize};

/// Optional shell settings, read from `.schedshell.json` in the
/// working directory. A missing or malformed file means defaults.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Run RR/RR30 execs on the two-worker pool.
    pub multithreaded: bool,
    pub prompt: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            multithreaded: false,
            prompt:        "$ ".to_string(),
        }
    }
}

const FILE: &str = ".schedshell.json";

pub fn load() -> Config {
    std::fs::read_to_string(FILE)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}
