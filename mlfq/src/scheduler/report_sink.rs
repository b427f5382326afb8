/*
 *   Copyright (c) 2025 R3BL LLC
 *   All rights reserved.
 *
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

//! Destination for the scheduler's observable output (admissions, served
//! quanta, migrations, I/O detours, completions). Production writes to
//! `stdout`; tests capture the lines in a buffer and assert on them. The
//! tracing system is separate and carries the debug-level internals.

use std::{io::Write,
          sync::{Arc, Mutex}};

/// Type alias to hide the gnarly type of the shared writer.
pub type SafeWriter = Arc<StdMutex<dyn Write + Send>>;

pub type StdMutex<T> = Mutex<T>;

#[derive(Clone)]
pub struct ReportSink {
    pub resource: SafeWriter,
    pub is_mock: bool,
}

impl std::fmt::Debug for ReportSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportSink")
            .field("is_mock", &self.is_mock)
            .finish_non_exhaustive()
    }
}

impl Default for ReportSink {
    fn default() -> Self { Self::new_stdout() }
}

impl ReportSink {
    #[must_use]
    pub fn new_stdout() -> Self {
        Self {
            resource: Arc::new(StdMutex::new(std::io::stdout())),
            is_mock: false,
        }
    }

    /// A sink that captures everything in memory. Returns the sink and the
    /// shared buffer to assert on.
    #[must_use]
    pub fn new_mock() -> (Self, Arc<StdMutex<Vec<u8>>>) {
        let buffer = Arc::new(StdMutex::new(Vec::new()));
        let resource: SafeWriter = buffer.clone();
        (
            Self {
                resource,
                is_mock: true,
            },
            buffer,
        )
    }

    /// Write one observable line. Output failures are swallowed; losing a
    /// report line must never derail a scheduling decision.
    pub fn line(&self, text: impl AsRef<str>) {
        if let Ok(mut writer) = self.resource.lock() {
            _ = writeln!(writer, "{}", text.as_ref());
            _ = writer.flush();
        }
    }
}

/// Render a mock sink's captured bytes as text, for assertions.
#[must_use]
pub fn mock_output_to_string(buffer: &Arc<StdMutex<Vec<u8>>>) -> String {
    String::from_utf8_lossy(&buffer.lock().unwrap()).into_owned()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn mock_sink_captures_lines_in_order() {
        let (sink, buffer) = ReportSink::new_mock();
        sink.line("first");
        sink.line("second");
        assert_eq!(mock_output_to_string(&buffer), "first\nsecond\n");
    }

    #[test]
    fn stdout_sink_is_not_a_mock() {
        assert!(!ReportSink::new_stdout().is_mock);
    }
}
