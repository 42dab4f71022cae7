//! Failures: compile errors and runtime errors inside tasks

use super::harness::{compile_error, run};

#[test]
fn test_failed_task_does_not_stop_others() {
    let source = "\
fn bad()
  error('oops')
end
spawn(bad)
delay(1, bad)
wait(2)
print('still here')
";
    let run = run(source);
    assert_eq!(run.stdout(), "still here\n");
    assert_eq!(run.failures(), 2);
}

#[test]
fn test_arithmetic_on_nil_fails() {
    let run = run("print('start')\nlet x = nil + 1\nprint('unreachable')");
    assert_eq!(run.stdout(), "start\n");
    assert_eq!(run.failures(), 1);
}

#[test]
fn test_failure_after_wait() {
    let run = run("wait(1)\nprint('resumed')\nerror('late')");
    assert_eq!(run.stdout(), "resumed\n");
    assert_eq!(run.failures(), 1);
}

#[test]
fn test_deep_recursion_overflows() {
    let run = run("fn down(n)\n  return down(n + 1)\nend\ndown(0)");
    assert_eq!(run.failures(), 1);
}

#[test]
fn test_compile_errors_name_chunk_and_line() {
    assert_eq!(
        compile_error("print(1)\nprint(x)"),
        "test:2: undefined variable 'x'"
    );
    assert_eq!(
        compile_error("missing()"),
        "test:1: undefined function 'missing'"
    );
    assert!(compile_error("print(").starts_with("test:1: "));
    assert!(compile_error("let s = 'open").starts_with("test:1: "));
}

#[test]
fn test_builtins_cannot_be_redefined() {
    assert_eq!(
        compile_error("fn print()\nend"),
        "test:1: cannot redefine builtin 'print'"
    );
}
