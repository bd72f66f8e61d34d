use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;

use raw_lox::{parse, run_source, scan, Config, Interpreter, LoxError};
use walkdir::WalkDir;

#[derive(Clone, Default)]
struct Captured(Rc<RefCell<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// What a fixture says about itself through `// expect:`, `// error:`, `// exit:` and
/// `// max-call-depth:` comments.
#[derive(Default)]
struct Expectations {
    output: Vec<String>,
    errors: Vec<String>,
    exit: u8,
    max_call_depth: Option<usize>,
}

fn annotation<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let (_, rest) = line.split_once(&format!("// {key}: "))?;
    Some(rest.trim_end())
}

fn expectations(source: &str) -> Expectations {
    let mut expected = Expectations::default();
    for line in source.lines() {
        if let Some(text) = annotation(line, "expect") {
            expected.output.push(text.to_string());
        } else if let Some(text) = annotation(line, "error") {
            expected.errors.push(text.to_string());
        } else if let Some(code) = annotation(line, "exit") {
            expected.exit = code.parse().expect("exit annotation must be a number");
        } else if let Some(depth) = annotation(line, "max-call-depth") {
            expected.max_call_depth = Some(depth.parse().expect("depth must be a number"));
        }
    }
    expected
}

fn run(source: &str, config: &Config) -> (String, Result<(), LoxError>) {
    let out = Captured::default();
    let mut interpreter = Interpreter::with_config(config, Box::new(out.clone()));
    let result = run_source(source, &mut interpreter);
    (out.text(), result)
}

fn check_script(path: &Path) {
    let source =
        fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));
    let expected = expectations(&source);

    let mut config = Config::default();
    if let Some(depth) = expected.max_call_depth {
        config.max_call_depth = depth;
    }

    let (output, result) = run(&source, &config);
    let printed: Vec<&str> = output.lines().collect();
    assert_eq!(printed, expected.output, "stdout of {path:?}");

    match result {
        Ok(()) => {
            assert_eq!(expected.exit, 0, "{path:?} succeeded but should exit {}", expected.exit);
            assert!(expected.errors.is_empty(), "{path:?} should have failed");
        }
        Err(err) => {
            assert_eq!(err.exit_code(), expected.exit, "exit code of {path:?}: {err}");
            let reported = err.to_string();
            let reported: Vec<&str> = reported.lines().collect();
            assert_eq!(reported, expected.errors, "errors of {path:?}");
        }
    }
}

#[test]
fn scripts_behave_as_annotated() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/scripts");
    let mut count = 0;

    for entry in WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "lox"))
    {
        count += 1;
        check_script(entry.path());
    }

    assert!(count > 0, "No scripts found in {root:?}");
}

#[test]
fn token_lines_end_with_eof() {
    let scanned = scan("var x = 3.5; // note\n\"hi\"");
    let lines: Vec<String> = scanned.tokens.iter().map(ToString::to_string).collect();
    assert_eq!(
        lines,
        vec![
            "VAR var null",
            "IDENTIFIER x null",
            "EQUAL = null",
            "NUMBER 3.5 3.5",
            "SEMICOLON ; null",
            "STRING \"hi\" hi",
            "EOF  null",
        ]
    );
    assert!(!scanned.had_error);
}

#[test]
fn unterminated_string_is_diagnosed_without_a_string_token() {
    let scanned = scan("\"abc");
    assert!(scanned.had_error);

    let diagnostics: Vec<String> = scanned.errors().filter_map(|t| t.diagnostic()).collect();
    assert_eq!(diagnostics, vec!["[line 1] Error: Unterminated string."]);

    let printed: Vec<String> = scanned
        .tokens
        .iter()
        .filter(|t| !t.error)
        .map(ToString::to_string)
        .collect();
    assert_eq!(printed, vec!["EOF  null"]);
}

#[test]
fn scan_errors_never_reach_the_interpreter() {
    let (output, result) = run("print 1;\nprint @;", &Config::default());
    assert_eq!(output, "");
    let err = result.unwrap_err();
    assert_eq!(err.exit_code(), 65);
    assert_eq!(err.to_string(), "[line 2] Error: Unexpected character: @");
}

#[test]
fn expressions_print_as_s_expressions() {
    let ast = parse("1 + 2 * 3;\n-(x);\n!true == false;").unwrap();
    let printed: Vec<String> = ast.expressions().map(ToString::to_string).collect();
    assert_eq!(
        printed,
        vec![
            "(+ 1.0 (* 2.0 3.0))",
            "(- (group x))",
            "(== (! true) false)",
        ]
    );
}

#[test]
fn syntax_error_reports_line_and_exit_code() {
    let err = parse("var a = 1;\nvar = 2;").unwrap_err();
    assert_eq!(err.exit_code(), 65);
    assert_eq!(err.to_string(), "[line 2] Error at '=': Expect variable name.");
}
