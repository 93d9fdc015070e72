use crate::capture::RunOutput;
use crate::error::Result;
use crate::handler::InterpreterHandler;

pub const PS1: &str = ">>> ";
pub const PS2: &str = "... ";

pub trait Repl {
    fn feed(&mut self, s: String) -> Result<Option<RunOutput>>;
    fn is_alive(&self) -> bool;
}

/// Turns a stream of text into complete statements for an
/// [`InterpreterHandler`], the way the standard console groups input lines.
pub struct PythonRepl {
    handler: InterpreterHandler,
    buf: String,
    block: Vec<String>,
    live: bool,
}

impl PythonRepl {
    pub fn new(handler: InterpreterHandler) -> Self {
        Self {
            handler,
            buf: Default::default(),
            block: Default::default(),
            live: true,
        }
    }

    pub fn handler(&self) -> &InterpreterHandler {
        &self.handler
    }

    pub fn prompt(&self) -> &'static str {
        if self.block.is_empty() {
            PS1
        } else {
            PS2
        }
    }

    /// Handles one input line, running the pending block once it is complete.
    pub fn process(&mut self, line: &str) -> Result<Option<RunOutput>> {
        if self.block.is_empty() {
            match line.trim() {
                "exit" | "quit" => {
                    self.live = false;
                    return Ok(None);
                }
                "" => return Ok(None),
                _ => {}
            }
        }

        self.block.push(line.to_string());
        let source = self.block.join("\n");
        if !self.handler.is_complete(&source)? {
            return Ok(None);
        }
        self.block.clear();
        self.handler.run(&source).map(Some)
    }
}

impl Repl for PythonRepl {
    fn feed(&mut self, s: String) -> Result<Option<RunOutput>> {
        self.buf += &s;
        let mut ret: Option<RunOutput> = None;
        while self.live {
            let Some((line, rest)) = self.buf.split_once('\n') else {
                break;
            };
            let line = line.trim_end_matches('\r').to_string();
            self.buf = rest.to_string();
            if let Some(output) = self.process(&line)? {
                ret.get_or_insert_with(RunOutput::default).append(output);
            }
        }
        Ok(ret)
    }

    fn is_alive(&self) -> bool {
        self.live
    }
}
