//! Language basics: values, operators, control flow and functions

use super::harness::expect_output;

#[test]
fn test_print_values() {
    expect_output("print(1, 2.5, 'hi', true, nil)", "1\t2.5\thi\ttrue\tnil\n");
}

#[test]
fn test_print_without_arguments() {
    expect_output("print()", "\n");
}

#[test]
fn test_arithmetic_precedence() {
    expect_output("print(2 + 3 * 4, (2 + 3) * 4, 7 / 2, -2 * 3)", "14\t20\t3.5\t-6\n");
}

#[test]
fn test_floored_modulo() {
    expect_output("print(7 % 3, -7 % 3, 7 % -3)", "1\t2\t-2\n");
}

#[test]
fn test_string_concatenation() {
    expect_output("let name = 'tick'\nprint('co' .. name .. 1)", "cotick1\n");
}

#[test]
fn test_if_else() {
    let source = "\
fn sign(n)
  if n < 0
    return 'negative'
  else
    if n == 0
      return 'zero'
    end
  end
  return 'positive'
end
print(sign(-3), sign(0), sign(4))
";
    expect_output(source, "negative\tzero\tpositive\n");
}

#[test]
fn test_while_loop() {
    let source = "\
let i = 1
let product = 1
while i <= 5
  product = product * i
  i = i + 1
end
print(product)
";
    expect_output(source, "120\n");
}

#[test]
fn test_short_circuit() {
    let source = "\
fn loud(v)
  print('evaluated', v)
  return v
end
print(false and loud(1))
print(true or loud(2))
print(nil or loud(3))
";
    expect_output(source, "false\ntrue\nevaluated\t3\n3\n");
}

#[test]
fn test_recursion() {
    let source = "\
fn fact(n)
  if n <= 1
    return 1
  end
  return n * fact(n - 1)
end
print(fact(10))
";
    expect_output(source, "3628800\n");
}

#[test]
fn test_functions_are_hoisted() {
    expect_output("greet('world')\nfn greet(who)\n  print('hello', who)\nend", "hello\tworld\n");
}

#[test]
fn test_missing_arguments_are_nil() {
    expect_output("fn show(a, b)\n  print(a, b)\nend\nshow(1)", "1\tnil\n");
}

#[test]
fn test_function_values() {
    let source = "\
fn add(a, b)
  print(a + b)
end
let f = add
print(f)
spawn(f, 1, 2)
";
    expect_output(source, "function: add\n3\n");
}

#[test]
fn test_equality() {
    expect_output(
        "print(1 == 1, 'a' == 'a', 1 == '1', nil == false, 2 != 3)",
        "true\ttrue\tfalse\tfalse\ttrue\n",
    );
}
