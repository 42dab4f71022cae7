//! `on_exit`: callbacks run once at shutdown, without yielding

use super::harness::{expect_output, run};

#[test]
fn test_callback_runs_after_script() {
    let source = "\
fn bye()
  print('bye')
end
on_exit(bye)
wait(1)
print('main')
";
    expect_output(source, "main\nbye\n");
}

#[test]
fn test_callbacks_run_in_registration_order() {
    let source = "\
fn one()
  print('one')
end
fn two()
  print('two')
end
on_exit(two)
on_exit(one)
";
    expect_output(source, "two\none\n");
}

#[test]
fn test_callback_cannot_wait() {
    let source = "\
fn slow()
  print('before')
  wait(1)
  print('after')
end
on_exit(slow)
";
    let run = run(source);
    assert_eq!(run.stdout(), "before\n");
    assert_eq!(run.runtime.scheduler().stats().yield_violations, 1);
}

#[test]
fn test_callback_must_be_function() {
    let run = run("on_exit(5)\nprint('unreachable')");
    assert_eq!(run.stdout(), "");
    assert_eq!(run.failures(), 1);
}
