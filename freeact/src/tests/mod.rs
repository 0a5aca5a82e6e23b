//! In-crate integration scenarios: complete dispatch loops running on a
//! minimal thread-backed test platform.

use std::sync::{Condvar, Mutex};

use crate::port::{Parker, Platform, Priority, SpawnError, StartOptions};
use std::sync::Arc;


/// Permit-carrying parker, so an unpark delivered before the park is kept.
struct TestParker {
    permit: Mutex<bool>,
    condvar: Condvar,
}

impl TestParker {
    fn new() -> Self {
        Self {
            permit: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }
}

impl Parker for TestParker {
    fn park(&self) {
        let mut permit = self.permit.lock().unwrap();
        while !*permit {
            permit = self.condvar.wait(permit).unwrap();
        }
        *permit = false;
    }

    fn unpark(&self) {
        *self.permit.lock().unwrap() = true;
        self.condvar.notify_one();
    }

    fn unpark_from_isr(&self) {
        self.unpark();
    }
}

pub(crate) struct TestPlatform;

impl Platform for TestPlatform {
    fn parker(&self) -> Arc<dyn Parker> {
        Arc::new(TestParker::new())
    }

    fn spawn(
        &self,
        name: &'static str,
        _priority: Priority,
        _options: &StartOptions,
        entry: Box<dyn FnOnce() + Send + 'static>,
    ) -> Result<(), SpawnError> {
        std::thread::Builder::new()
            .name(name.into())
            .spawn(entry)
            .map(|_| ())
            .map_err(|err| SpawnError {
                reason: err.to_string(),
            })
    }
}

/// A platform whose scheduler is out of resources.
pub(crate) struct ExhaustedPlatform;

impl Platform for ExhaustedPlatform {
    fn parker(&self) -> Arc<dyn Parker> {
        Arc::new(TestParker::new())
    }

    fn spawn(
        &self,
        _name: &'static str,
        _priority: Priority,
        _options: &StartOptions,
        _entry: Box<dyn FnOnce() + Send + 'static>,
    ) -> Result<(), SpawnError> {
        Err(SpawnError {
            reason: "no contexts left".into(),
        })
    }
}
