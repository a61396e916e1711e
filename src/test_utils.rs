//! Shared test utilities for cmext tests
//!
//! Provides a scripted stand-in for external tools so orchestration can be
//! tested without `CMake` or an interpreter installed.

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::process::{CommandRunner, Invocation, ToolOutput};
    use crate::runtime::RuntimeInfo;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;
    use std::path::PathBuf;

    /// Runner that replays canned outputs in order and records every call
    ///
    /// Once the script runs out, further calls fail as if the program did
    /// not exist.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedRunner {
        responses: RefCell<VecDeque<ToolOutput>>,
        calls: RefCell<Vec<Invocation>>,
    }

    impl ScriptedRunner {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Queue the output of the next call.
        pub(crate) fn respond(self, output: ToolOutput) -> Self {
            self.responses.borrow_mut().push_back(output);
            self
        }

        /// Every invocation seen so far, in order.
        pub(crate) fn calls(&self) -> Vec<Invocation> {
            self.calls.borrow().clone()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, invocation: &Invocation) -> io::Result<ToolOutput> {
            self.calls.borrow_mut().push(invocation.clone());
            self.responses.borrow_mut().pop_front().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} not found", invocation.program().display()),
                )
            })
        }
    }

    /// Interpreter layout of a typical Linux install
    pub(crate) fn sample_runtime() -> RuntimeInfo {
        RuntimeInfo {
            executable: PathBuf::from("/usr/bin/python3"),
            include_dir: PathBuf::from("/usr/include/python3.12"),
            lib_dir: PathBuf::from("/usr/lib/x86_64-linux-gnu"),
            ext_suffix: ".so".to_string(),
        }
    }
}
