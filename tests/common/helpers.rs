//! Shared test helpers and utilities

use cmext::{CommandRunner, Invocation, RuntimeInfo, ToolOutput};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;

/// Path to the compiled cmext binary
#[allow(dead_code)]
pub(crate) fn get_cmext_binary() -> String {
    env!("CARGO_BIN_EXE_cmext").to_string()
}

/// Replays canned tool outputs and records what was run
///
/// A call with no queued output fails with `NotFound`, the same way a
/// missing executable does.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub(crate) struct FakeTools {
    outputs: RefCell<VecDeque<ToolOutput>>,
    seen: RefCell<Vec<Invocation>>,
}

#[allow(dead_code)]
impl FakeTools {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next call.
    pub(crate) fn then(self, code: i32, stdout: &str) -> Self {
        self.outputs
            .borrow_mut()
            .push_back(ToolOutput::new(code, stdout, ""));
        self
    }

    pub(crate) fn seen(&self) -> Vec<Invocation> {
        self.seen.borrow().clone()
    }
}

impl CommandRunner for FakeTools {
    fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput> {
        self.seen.borrow_mut().push(invocation.clone());
        self.outputs.borrow_mut().pop_front().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", invocation.program().display()),
            )
        })
    }
}

/// Interpreter layout used across the orchestration tests
#[allow(dead_code)]
pub(crate) fn runtime() -> RuntimeInfo {
    RuntimeInfo {
        executable: PathBuf::from("/usr/bin/python3"),
        include_dir: PathBuf::from("/usr/include/python3.12"),
        lib_dir: PathBuf::from("/usr/lib"),
        ext_suffix: ".cpython-312-x86_64-linux-gnu.so".to_string(),
    }
}
