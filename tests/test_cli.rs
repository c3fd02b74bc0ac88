use assert_cmd::Command;
use assert_fs::{prelude::FileWriteStr, NamedTempFile};
use predicates::{
    prelude::{predicate, PredicateBooleanExt},
    BoxPredicate,
};

const EMPLOYEES: &str = "id,department,salary\n1,Sales,5000\n2,Eng,7000\n3,Sales,6000\n";

const COURSES: &str = "StudentID,Course,Instructor
1,Math101,Prof. Brown
1,Math101,Prof. Green
2,Math101,Prof. Brown
";

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn temp_file(name: &str, content: &str) -> Result<NamedTempFile, Box<dyn std::error::Error>> {
    let file = NamedTempFile::new(name)?;
    file.write_str(content)?;
    Ok(file)
}

fn solve_cmd(
    data: &NamedTempFile,
    constraints: &NamedTempFile,
    query: &str,
    mode: &str,
) -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("cavsat")?;
    cmd.arg("solve")
        .arg("-f")
        .arg(data.path())
        .arg("-c")
        .arg(constraints.path())
        .arg("-q")
        .arg(query)
        .arg("-m")
        .arg(mode);
    Ok(cmd)
}

#[test]
fn test_authors() {
    let app_name = option_env!("CARGO_PKG_NAME").unwrap_or("unknown app name");
    let app_version = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown version");
    let authors = option_env!("CARGO_PKG_AUTHORS")
        .map(|v| v.replace(':', ", "))
        .unwrap_or_else(|| "unknown authors".to_string());
    let license = option_env!("CARGO_PKG_LICENSE").unwrap_or("unknown license");
    let expected = format!(
        "{} {}\n{}\nlicense: {}\n",
        app_name, app_version, authors, license
    );
    let mut cmd = Command::cargo_bin("cavsat").unwrap();
    cmd.arg("authors")
        .assert()
        .success()
        .stdout(predicate::eq(expected.as_str()));
}

#[test]
fn test_check_logs_to_stderr() -> TestResult {
    let data = temp_file("courses.csv", COURSES)?;
    let constraints = temp_file("courses.ic", "key(StudentID, Course)\n")?;
    let mut cmd = Command::cargo_bin("cavsat")?;
    cmd.arg("check")
        .arg("-f")
        .arg(data.path())
        .arg("-c")
        .arg(constraints.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("found 1 conflict(s) involving 2 record(s)"));
    Ok(())
}

#[test]
fn test_sales_certain() -> TestResult {
    let data = temp_file("employees.csv", EMPLOYEES)?;
    let constraints = temp_file(
        "employees.ic",
        "check department != \"Sales\" or salary > 5000 -- sales need a raise\n",
    )?;
    for encoding in ["filter", "repair"] {
        solve_cmd(&data, &constraints, r#"department == "Sales""#, "certain")?
            .arg("--encoding")
            .arg(encoding)
            .assert()
            .success()
            .stdout(predicate::eq("id,department,salary\n3,Sales,6000\n"));
    }
    Ok(())
}

#[test]
fn test_key_certain_and_possible() -> TestResult {
    let data = temp_file("courses.csv", COURSES)?;
    let constraints = temp_file("courses.ic", "key(StudentID, Course)\n")?;
    let query = r#"Course == "Math101""#;
    solve_cmd(&data, &constraints, query, "certain")?
        .assert()
        .success()
        .stdout(predicate::eq(
            "StudentID,Course,Instructor\n2,Math101,Prof. Brown\n",
        ));
    solve_cmd(&data, &constraints, query, "certain")?
        .arg("--by-assumptions")
        .assert()
        .success()
        .stdout(predicate::eq(
            "StudentID,Course,Instructor\n2,Math101,Prof. Brown\n",
        ));
    solve_cmd(&data, &constraints, query, "possible")?
        .assert()
        .success()
        .stdout(predicate::eq(COURSES));
    Ok(())
}

#[test]
fn test_key_single() -> TestResult {
    let data = temp_file("courses.csv", COURSES)?;
    let constraints = temp_file("courses.ic", "key(StudentID, Course)\n")?;
    let brown = "StudentID,Course,Instructor\n1,Math101,Prof. Brown\n2,Math101,Prof. Brown\n";
    let green = "StudentID,Course,Instructor\n1,Math101,Prof. Green\n2,Math101,Prof. Brown\n";
    let pred: BoxPredicate<str> = BoxPredicate::new(predicate::eq(brown).or(predicate::eq(green)));
    solve_cmd(&data, &constraints, "true", "single")?
        .assert()
        .success()
        .stdout(pred);
    Ok(())
}

#[test]
fn test_key_repairs() -> TestResult {
    let data = temp_file("courses.csv", COURSES)?;
    let constraints = temp_file("courses.ic", "key(StudentID, Course)\n")?;
    solve_cmd(&data, &constraints, "true", "repairs")?
        .assert()
        .success()
        .stdout(
            predicate::str::starts_with("repair,StudentID,Course,Instructor\n")
                .and(predicate::str::contains("1,1,Math101,Prof. "))
                .and(predicate::str::contains("2,1,Math101,Prof. "))
                .and(predicate::function(|s: &str| s.lines().count() == 5)),
        );
    Ok(())
}

#[test]
fn test_no_repair() -> TestResult {
    let data = temp_file("employees.csv", EMPLOYEES)?;
    let constraints = temp_file(
        "employees.ic",
        "require department == \"Sales\"\ncheck salary > 5500\n",
    )?;
    for mode in ["single", "certain", "possible", "repairs"] {
        solve_cmd(&data, &constraints, "true", mode)?
            .assert()
            .success()
            .stdout(predicate::eq("NO REPAIR\n"));
    }
    Ok(())
}

#[test]
fn test_bounded_enumeration() -> TestResult {
    let data = temp_file("courses.csv", COURSES)?;
    let constraints = temp_file("courses.ic", "key(StudentID, Course)\n")?;
    let mut cmd = solve_cmd(&data, &constraints, "true", "repairs")?;
    cmd.arg("--max-repairs")
        .arg("1")
        .arg("--logging-level")
        .arg("warn")
        .assert()
        .success()
        .stdout(predicate::function(|s: &str| s.lines().count() == 3))
        .stderr(predicate::str::contains("more exist"));
    Ok(())
}

#[test]
fn test_delimiter_and_no_header() -> TestResult {
    let data = temp_file("courses.csv", "1;a\n1;b\n2;a\n")?;
    let constraints = temp_file("courses.ic", "key(#0)\n")?;
    let mut cmd = solve_cmd(&data, &constraints, "#1 == \"a\"", "certain")?;
    cmd.arg("--delimiter")
        .arg(";")
        .arg("--no-header")
        .assert()
        .success()
        .stdout(predicate::eq("#0;#1\n2;a\n"));
    Ok(())
}

#[test]
fn test_leading_zeros_are_kept() -> TestResult {
    let content = "zip,city\n007,Paris\n7,Paris\n";
    let data = temp_file("zips.csv", content)?;
    let constraints = temp_file("zips.ic", "key(zip)\n")?;
    solve_cmd(&data, &constraints, "true", "certain")?
        .assert()
        .success()
        .stdout(predicate::eq(content));
    Ok(())
}

#[test]
fn test_encode_to_file() -> TestResult {
    let data = temp_file("courses.csv", COURSES)?;
    let constraints = temp_file("courses.ic", "key(StudentID, Course)\n")?;
    let output = NamedTempFile::new("courses.cnf")?;
    let mut cmd = Command::cargo_bin("cavsat")?;
    cmd.arg("encode")
        .arg("-f")
        .arg(data.path())
        .arg("-c")
        .arg(constraints.path())
        .arg("--encoding")
        .arg("filter")
        .arg("-o")
        .arg(output.path())
        .assert()
        .success();
    let content = std::fs::read_to_string(output.path())?;
    assert_eq!("p cnf 3 3\n-1 0\n-2 0\n3 0\n", content);
    Ok(())
}

#[test]
fn test_encode_to_stdout() -> TestResult {
    let data = temp_file("courses.csv", COURSES)?;
    let constraints = temp_file("courses.ic", "key(StudentID, Course)\n")?;
    let mut cmd = Command::cargo_bin("cavsat")?;
    cmd.arg("encode")
        .arg("-f")
        .arg(data.path())
        .arg("-c")
        .arg(constraints.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("p cnf 3 ").and(predicate::str::contains("-1 -2 0\n")));
    Ok(())
}

#[test]
fn test_errors() -> TestResult {
    let data = temp_file("employees.csv", EMPLOYEES)?;
    let constraints = temp_file("employees.ic", "key(name)\n")?;
    solve_cmd(&data, &constraints, "true", "certain")?
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("name"));
    let constraints = temp_file("employees.ic", "key(id)\n")?;
    solve_cmd(&data, &constraints, "manager == 1", "certain")?
        .assert()
        .failure()
        .code(1);
    let bad_data = temp_file("bad.csv", "id,department\n1,Sales,5000\n")?;
    solve_cmd(&bad_data, &constraints, "true", "certain")?
        .assert()
        .failure()
        .code(1);
    let mut cmd = Command::cargo_bin("cavsat")?;
    cmd.arg("solve")
        .arg("-f")
        .arg("/this/file/does/not/exist.csv")
        .arg("-c")
        .arg(constraints.path())
        .assert()
        .failure()
        .code(1);
    Ok(())
}

#[test]
fn test_invalid_external_solver() -> TestResult {
    let data = temp_file("courses.csv", COURSES)?;
    let constraints = temp_file("courses.ic", "key(StudentID, Course)\n")?;
    let not_a_solver = temp_file("solver.txt", "not a program\n")?;
    solve_cmd(&data, &constraints, "true", "certain")?
        .arg("--external-sat-solver")
        .arg("/this/solver/does/not/exist")
        .assert()
        .failure()
        .code(1);
    solve_cmd(&data, &constraints, "true", "certain")?
        .arg("--external-sat-solver")
        .arg(not_a_solver.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not executable"));
    Ok(())
}
