//! `defer`: same-tick FIFO execution and the nesting ceiling

use super::harness::{expect_output, run, run_with_limits};
use cotick_engine::SchedulerLimits;

#[test]
fn test_deferred_run_fifo_after_caller() {
    let source = "\
fn log(name)
  print(name)
end
fn fan()
  defer(log, 'a')
  defer(log, 'b')
end
defer(fan)
defer(log, 'c')
print('main')
";
    expect_output(source, "main\nc\na\nb\n");
}

#[test]
fn test_deferred_chain_runs_in_one_tick() {
    let source = "\
fn step(n)
  print(n, clock())
  if n < 3
    defer(step, n + 1)
  end
end
delay(1, step, 1)
";
    expect_output(source, "1\t1\n2\t1\n3\t1\n");
}

#[test]
fn test_nested_defer_ceiling() {
    let source = "\
fn nest(n)
  print(n)
  defer(nest, n + 1)
end
defer(nest, 1)
";
    let run = run(source);
    let expected: String = (1..=40).map(|n| format!("{}\n", n)).collect();
    assert_eq!(run.stdout(), expected);
    assert_eq!(run.failures(), 1);
    assert_eq!(run.runtime.scheduler().stats().defers_rejected, 1);
}

#[test]
fn test_defer_ceiling_is_configurable() {
    let source = "\
fn nest(n)
  print(n)
  defer(nest, n + 1)
end
defer(nest, 1)
";
    let limits = SchedulerLimits {
        max_defer_depth: 3,
        ..SchedulerLimits::default()
    };
    let run = run_with_limits(source, limits);
    assert_eq!(run.stdout(), "1\n2\n3\n");
    assert_eq!(run.failures(), 1);
}

#[test]
fn test_sibling_defers_do_not_nest() {
    let source = "\
fn log(n)
  print(n)
end
let i = 0
while i < 50
  i = i + 1
  defer(log, i)
end
";
    let run = run(source);
    assert_eq!(run.stdout().lines().count(), 50);
    assert_eq!(run.failures(), 0);
}

#[test]
fn test_defer_rejects_non_callable() {
    let run = run("defer(42)\nprint('unreachable')");
    assert_eq!(run.stdout(), "");
    assert_eq!(run.failures(), 1);
}
