//! Virtual time: `wait`, `delay` and `clock`

use super::harness::{expect_output, run, STEP};
use cotick_runtime::RunOutcome;

#[test]
fn test_waits_finish_in_time_order() {
    let source = "\
fn worker(name, t)
  wait(t)
  print(name)
end
spawn(worker, 'slow', 1)
spawn(worker, 'fast', 0.5)
print('started')
";
    expect_output(source, "started\nfast\nslow\n");
}

#[test]
fn test_wait_returns_elapsed_time() {
    expect_output("print(wait(1))", "1\n");
}

#[test]
fn test_wait_without_argument_resumes_next_tick() {
    expect_output("print(wait())", &format!("{}\n", STEP));
}

#[test]
fn test_clock_reports_virtual_time() {
    expect_output("print(clock())\nwait(0.75)\nprint(clock())", "0\n0.75\n");
}

#[test]
fn test_delay_passes_arguments() {
    let source = "\
fn greet(who, punctuation)
  print('hello ' .. who .. punctuation)
end
delay(0.5, greet, 'world', '!')
print('queued')
";
    expect_output(source, "queued\nhello world!\n");
}

#[test]
fn test_delay_from_tick_runs_next_tick() {
    let source = "\
fn second()
  print('second', clock())
end
fn first()
  print('first', clock())
  delay(0, second)
end
delay(0, first)
";
    expect_output(source, "first\t0.25\nsecond\t0.5\n");
}

#[test]
fn test_waits_inside_nested_calls() {
    let source = "\
fn pause(t)
  return wait(t)
end
fn twice()
  return pause(0.5) + pause(0.5)
end
print(twice())
";
    expect_output(source, "1\n");
}

#[test]
fn test_loop_with_waits() {
    let source = "\
let i = 0
while i < 3
  wait(1)
  i = i + 1
  print('tick', i, clock())
end
";
    expect_output(source, "tick\t1\t1\ntick\t2\t2\ntick\t3\t3\n");
}

#[test]
fn test_script_without_waits_completes_after_one_tick() {
    let run = run("print('done')");
    assert_eq!(run.outcome, RunOutcome::Completed);
    assert_eq!(run.stdout(), "done\n");
}
