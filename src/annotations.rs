//! Check-run annotations for failed assertions.

use std::path::Path;

use crate::model::{relative_path, Annotation, AnnotationLevel, Assertion, TestRun};

const TITLE_SEPARATOR: &str = " > ";

/// Remove terminal styling escape sequences from runner output.
#[must_use]
pub fn strip_ansi(text: &str) -> String {
    String::from_utf8_lossy(&strip_ansi_escapes::strip(text.as_bytes())).into_owned()
}

/// One annotation per failed assertion, in file order then assertion order.
/// Empty for a successful run.
pub fn build(run: &TestRun, base_dir: &Path) -> Vec<Annotation> {
    if run.success {
        return Vec::new();
    }

    run.failed_assertions()
        .map(|(file, assertion)| {
            let line = assertion.location.map(|l| l.line).unwrap_or(0);
            Annotation {
                path: relative_path(&file.file_path, base_dir),
                start_line: line,
                end_line: line,
                annotation_level: AnnotationLevel::Failure,
                title: full_title(assertion),
                message: strip_ansi(&assertion.failure_messages.join("\n\n")),
            }
        })
        .collect()
}

fn full_title(assertion: &Assertion) -> String {
    assertion
        .ancestor_titles
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(assertion.title.as_str()))
        .collect::<Vec<_>>()
        .join(TITLE_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_results;

    fn failing_run() -> TestRun {
        parse_results(
            r#"{
                "success": false,
                "numTotalTests": 4, "numPassedTests": 1, "numFailedTests": 3,
                "numTotalTestSuites": 2, "numPassedTestSuites": 0, "numFailedTestSuites": 2,
                "testResults": [
                    {
                        "name": "/repo/src/auth.test.js",
                        "message": "",
                        "assertionResults": [
                            {
                                "status": "failed",
                                "ancestorTitles": ["Auth", "login"],
                                "title": "rejects bad password",
                                "location": { "line": 12, "column": 5 },
                                "failureMessages": ["\u001b[31mexpected\u001b[39m 401", "second"]
                            },
                            {
                                "status": "passed",
                                "ancestorTitles": ["Auth", "login"],
                                "title": "accepts good password",
                                "failureMessages": []
                            },
                            {
                                "status": "failed",
                                "ancestorTitles": ["Auth", "logout"],
                                "title": "clears session",
                                "location": null,
                                "failureMessages": []
                            }
                        ]
                    },
                    {
                        "name": "/repo/src/cart.test.js",
                        "assertionResults": [
                            {
                                "status": "failed",
                                "title": "top level",
                                "location": { "line": 3, "column": 1 },
                                "failureMessages": ["boom"]
                            }
                        ]
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_success_has_no_annotations() {
        let mut run = failing_run();
        run.success = true;
        assert!(build(&run, Path::new("/repo")).is_empty());
    }

    #[test]
    fn test_one_annotation_per_failed_assertion_in_order() {
        let annotations = build(&failing_run(), Path::new("/repo"));
        assert_eq!(annotations.len(), 3);

        let titles: Vec<_> = annotations.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Auth > login > rejects bad password",
                "Auth > logout > clears session",
                "top level",
            ]
        );
        assert_eq!(annotations[0].path, "src/auth.test.js");
        assert_eq!(annotations[1].path, "src/auth.test.js");
        assert_eq!(annotations[2].path, "src/cart.test.js");
    }

    #[test]
    fn test_message_is_joined_and_stripped() {
        let annotations = build(&failing_run(), Path::new("/repo"));
        assert_eq!(annotations[0].message, "expected 401\n\nsecond");
        assert_eq!(annotations[1].message, "");
        assert_eq!(annotations[2].message, "boom");
    }

    #[test]
    fn test_missing_location_defaults_to_zero() {
        let annotations = build(&failing_run(), Path::new("/repo"));
        assert_eq!((annotations[0].start_line, annotations[0].end_line), (12, 12));
        assert_eq!((annotations[1].start_line, annotations[1].end_line), (0, 0));
    }

    #[test]
    fn test_annotation_json_shape() {
        let annotations = build(&failing_run(), Path::new("/repo"));
        let value = serde_json::to_value(&annotations[2]).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "path": "src/cart.test.js",
                "start_line": 3,
                "end_line": 3,
                "annotation_level": "failure",
                "title": "top level",
                "message": "boom"
            })
        );
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(
            strip_ansi("\u{1b}[1m\u{1b}[31mFAIL\u{1b}[39m\u{1b}[22m src/a.js"),
            "FAIL src/a.js"
        );
        assert_eq!(strip_ansi("plain"), "plain");
    }
}
