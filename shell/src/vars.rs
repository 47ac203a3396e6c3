use std::collections::HashMap;
use std::sync::Mutex;

/// Shell variable memory.
///
/// Under multithreaded round-robin two workers re-enter the
/// interpreter concurrently, so the map lives behind a mutex.
pub struct VarStore {
    vars: Mutex<HashMap<String, String>>,
}

impl VarStore {
    pub fn new() -> Self {
        Self { vars: Mutex::new(HashMap::new()) }
    }

    /// Assign, overwriting any previous value.
    pub fn set(&self, name: &str, value: &str) {
        self.vars
            .lock()
            .expect("var store lock poisoned")
            .insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.vars
            .lock()
            .expect("var store lock poisoned")
            .get(name)
            .cloned()
    }
}
