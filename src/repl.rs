use std::io::{self, BufRead, Write};

use colored::Colorize;

use crate::engine::runtime::Interpreter;
use crate::run_source;

const PROMPT: &str = "> ";

/// Line-at-a-time session over one interpreter, so definitions persist between lines.
pub struct Repl<W: Write, E: Write> {
    interpreter: Interpreter,
    prompt: W,
    errors: E,
}

impl<W: Write, E: Write> Repl<W, E> {
    pub fn new(interpreter: Interpreter, prompt: W, errors: E) -> Self {
        Repl {
            interpreter,
            prompt,
            errors,
        }
    }

    /// Reads until end of input. A failing line is reported and the session goes on.
    pub fn run<R: BufRead>(&mut self, input: R) -> io::Result<()> {
        let mut lines = input.lines();
        loop {
            write!(self.prompt, "{}", PROMPT)?;
            self.prompt.flush()?;

            let Some(line) = lines.next() else {
                writeln!(self.prompt)?;
                return Ok(());
            };
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            if let Err(err) = run_source(&line, &mut self.interpreter) {
                tracing::debug!(exit_code = err.exit_code(), "repl line failed");
                writeln!(self.errors, "{}", err.to_string().red())?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl Shared {
        fn text(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn session(input: &str) -> (String, String) {
        colored::control::set_override(false);
        let out = Shared::default();
        let err = Shared::default();
        let interpreter = Interpreter::new(Box::new(out.clone()));
        let mut repl = Repl::new(interpreter, out.clone(), err.clone());
        repl.run(input.as_bytes()).unwrap();
        (out.text(), err.text())
    }

    #[test]
    fn bindings_survive_between_lines() {
        let (out, err) = session("var a = 20;\nprint a + 1;\n");
        assert_eq!(out, "> > 21\n> \n");
        assert_eq!(err, "");
    }

    #[test]
    fn bare_expressions_echo_their_value() {
        let (out, _) = session("1 + 2\n");
        assert_eq!(out, "> 3\n> \n");
    }

    #[test]
    fn errors_do_not_end_the_session() {
        let (out, err) = session("print -nil;\nprint \"still here\";\n");
        assert_eq!(out, "> > still here\n> \n");
        assert_eq!(err, "Operand must be a number.\n[line 1]\n");
    }

    #[test]
    fn syntax_errors_are_reported() {
        let (_, err) = session("print ;\n");
        assert_eq!(err, "[line 1] Error at ';': Expect expression.\n");
    }
}
