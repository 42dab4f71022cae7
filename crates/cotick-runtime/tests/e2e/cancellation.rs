//! `cancel`: queued entries for a cancelled task never fire

use super::harness::{expect_output, run};

#[test]
fn test_cancel_before_delay_fires() {
    let source = "\
fn boom()
  print('boom')
end
let t = delay(1, boom)
cancel(t)
print('cancelled')
";
    expect_output(source, "cancelled\n");
}

#[test]
fn test_cancel_waiting_task() {
    let source = "\
fn worker()
  print('working')
  wait(1)
  print('never')
end
fn stop(t)
  cancel(t)
  print('stopped')
end
let w = spawn(worker)
delay(0.5, stop, w)
";
    expect_output(source, "working\nstopped\n");
}

#[test]
fn test_cancel_within_the_same_tick() {
    let source = "\
fn victim()
  print('victim')
end
fn killer(t)
  print('killer')
  cancel(t)
end
let v = delay(10, victim)
delay(1, killer, v)
delay(1, v)
";
    let run = run(source);
    assert_eq!(run.stdout(), "killer\n");
    assert_eq!(run.failures(), 0);
}

#[test]
fn test_cancel_deferred_task() {
    let source = "\
fn log(name)
  print(name)
end
fn first(t)
  print('first')
  cancel(t)
end
let later = delay(100, log, 'late')
defer(first, later)
defer(later, 'second')
";
    let run = run(source);
    assert_eq!(run.stdout(), "first\n");
}

#[test]
fn test_cancel_requires_task() {
    let run = run("cancel(1)");
    assert_eq!(run.failures(), 1);
}
