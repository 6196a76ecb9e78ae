use assert_cmd::Command;

fn shelf(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("shelf").unwrap();
    cmd.env("SHELF_CONFIG_DIR", dir.path())
        .env("SHELF_ENV", "local")
        .env("SHELF_STORAGE__BACKEND", "json")
        .env("SHELF_STORAGE__JSON_PATH", dir.path().join("books.json"));
    cmd
}

fn seed(dir: &tempfile::TempDir) {
    std::fs::write(
        dir.path().join("books.json"),
        r#"{
            "next_id": 4,
            "books": [
                {"id": 1, "title": "Emma", "author": "Jane Austen", "rating": 3},
                {"id": 2, "title": "Dune", "author": "Frank Herbert", "rating": 5},
                {"id": 3, "title": "Persuasion", "author": "Jane Austen", "rating": 4}
            ]
        }"#,
    )
    .unwrap();
}

fn stdout_lines(cmd: &mut Command) -> Vec<String> {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{:?}", output);
    String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn list_sorts_by_rating() {
    let dir = tempfile::tempdir().unwrap();
    seed(&dir);

    let lines = stdout_lines(shelf(&dir).args(["list", "--sort", "rating"]));
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("Dune by Frank Herbert"));
    assert!(lines[2].contains("Emma"));
}

#[test]
fn list_filters_by_search() {
    let dir = tempfile::tempdir().unwrap();
    seed(&dir);

    let lines = stdout_lines(shelf(&dir).args(["list", "--search", "austen", "--sort", "alphabetical"]));
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("Emma"));
    assert!(lines[1].contains("Persuasion"));
}

#[test]
fn list_on_empty_store() {
    let dir = tempfile::tempdir().unwrap();

    let lines = stdout_lines(shelf(&dir).arg("list"));
    assert_eq!(lines, vec!["No books found."]);
}

#[test]
fn unknown_sort_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    shelf(&dir).args(["list", "--sort", "newest"]).assert().failure();
}
