//! Task list input parsing.

use std::io::Read;
use std::path::Path;

use fleet_dispatch::Task;

use crate::error::CliError;

/// Read a JSON task list from `path`, or from stdin when the path is `-`.
pub fn read_tasks(path: &Path) -> Result<Vec<Task>, CliError> {
    if path.as_os_str() == "-" {
        let mut contents = String::new();
        std::io::stdin()
            .read_to_string(&mut contents)
            .map_err(|source| CliError::TaskFileRead {
                path: "<stdin>".to_string(),
                source,
            })?;
        parse_tasks(&contents, "<stdin>")
    } else {
        let contents =
            std::fs::read_to_string(path).map_err(|source| CliError::TaskFileRead {
                path: path.display().to_string(),
                source,
            })?;
        parse_tasks(&contents, &path.display().to_string())
    }
}

/// Parse a JSON task list: `[{"arrival_at": 0, "duration": 5}, ...]`.
fn parse_tasks(contents: &str, path: &str) -> Result<Vec<Task>, CliError> {
    serde_json::from_str(contents).map_err(|source| CliError::TaskFileParse {
        path: path.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn parses_a_task_list() {
        let tasks = parse_tasks(
            r#"[{"arrival_at": 0, "duration": 5}, {"arrival_at": 1, "duration": 0}]"#,
            "test",
        )
        .unwrap();

        assert_eq!(
            tasks,
            vec![
                Task {
                    arrival_at: 0,
                    duration: 5
                },
                Task {
                    arrival_at: 1,
                    duration: 0
                },
            ]
        );
    }

    #[test]
    fn parses_an_empty_list() {
        assert_eq!(parse_tasks("[]", "test").unwrap(), Vec::new());
    }

    #[rstest]
    #[case::not_a_list(r#"{"arrival_at": 0, "duration": 5}"#)]
    #[case::missing_field(r#"[{"arrival_at": 0}]"#)]
    #[case::not_json("0 5\n1 3")]
    fn rejects_malformed_input(#[case] contents: &str) {
        assert!(matches!(
            parse_tasks(contents, "test"),
            Err(CliError::TaskFileParse { .. })
        ));
    }
}
