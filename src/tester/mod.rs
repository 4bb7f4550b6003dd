//! Prompt regression-test harness.
//!
//! Renders a record against supplied or example input, invokes the
//! external generation service, and computes a pass/fail verdict with a
//! deterministic 0-10 quality score. Service failures are captured in-band
//! as failed results; a batch run is never aborted by one record.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::llm::{GenerateText, GenerationRequest};
use crate::prompt::{render_raw, PromptExample, PromptMetadata};

/// Output-token cap applied when a record does not set `max_tokens`.
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;

/// Raw view of a record file as the harness reads it.
///
/// The harness parses the file itself instead of going through the library
/// cache: it needs only the template, metadata, and examples, and it
/// tolerates files the strict loader would reject (a missing name falls
/// back to the file stem).
#[derive(Debug, Deserialize, Default)]
struct RawRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    template: String,
    #[serde(default)]
    metadata: PromptMetadata,
    #[serde(default)]
    examples: Vec<PromptExample>,
}

/// Outcome of testing a single record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    /// Record name, or the file stem when the file declares none.
    pub prompt_name: String,
    /// The input mapping the template was rendered with.
    pub test_input: BTreeMap<String, String>,
    /// Generated output, empty on failure.
    pub output: String,
    /// Deterministic quality score, 0-10.
    pub quality_score: f64,
    /// Wall-clock latency of the generation call, in milliseconds.
    pub latency_ms: f64,
    /// Approximate token count (whitespace-delimited words).
    pub token_count: usize,
    /// Whether the attempt passed: no missing keywords and non-empty output.
    pub passed: bool,
    /// Keywords the output was expected to contain.
    pub expected_contains: Vec<String>,
    /// Expected keywords absent from the output, case-insensitively.
    pub missing_keywords: Vec<String>,
    /// Failure description, captured verbatim, when the attempt errored.
    pub error: Option<String>,
}

impl TestResult {
    /// Builds a zeroed failure result carrying the error description.
    fn failure(prompt_name: String, test_input: BTreeMap<String, String>, error: String) -> Self {
        Self {
            prompt_name,
            test_input,
            output: String::new(),
            quality_score: 0.0,
            latency_ms: 0.0,
            token_count: 0,
            passed: false,
            expected_contains: Vec::new(),
            missing_keywords: Vec::new(),
            error: Some(error),
        }
    }
}

/// Aggregate outcome of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchTestResult {
    /// Number of records tested.
    pub total: usize,
    /// Number of passing results.
    pub passed: usize,
    /// Number of failing results.
    pub failed: usize,
    /// Individual results in traversal order.
    pub results: Vec<TestResult>,
    /// Mean quality score across all results, 0.0 when empty.
    pub avg_quality: f64,
    /// Mean latency across all results, 0.0 when empty.
    pub avg_latency_ms: f64,
}

impl BatchTestResult {
    /// Pass rate as a percentage; 0.0 when no records were tested.
    pub fn pass_rate(&self) -> f64 {
        if self.total > 0 {
            self.passed as f64 / self.total as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Renders a human-readable summary, listing each failure with its
    /// error or missing keywords.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!(
                "Test Results: {}/{} passed ({:.0}%)",
                self.passed,
                self.total,
                self.pass_rate()
            ),
            format!("Avg Quality: {:.1}/10", self.avg_quality),
            format!("Avg Latency: {:.0}ms", self.avg_latency_ms),
        ];
        if self.failed > 0 {
            lines.push(String::new());
            lines.push("Failed tests:".to_string());
            for result in self.results.iter().filter(|r| !r.passed) {
                let reason = match &result.error {
                    Some(error) => error.clone(),
                    None => format!("Missing keywords: {}", result.missing_keywords.join(", ")),
                };
                lines.push(format!("  - {}: {}", result.prompt_name, reason));
            }
        }
        lines.join("\n")
    }
}

/// Scores output quality on a deterministic 0-10 scale.
///
/// Empty (whitespace-only) output scores exactly 0. Any non-empty output
/// starts at 5.0, gains up to 1.5 for length, up to 3.0 scaled by the
/// fraction of expected keywords present, and 0.5 for structural markers,
/// clamped to 10.0.
pub fn score_quality(output: &str, expected: &[String], missing: &[String]) -> f64 {
    if output.trim().is_empty() {
        return 0.0;
    }

    let mut score = 5.0;

    let word_count = output.split_whitespace().count();
    if word_count >= 50 {
        score += 1.0;
    }
    if word_count >= 200 {
        score += 0.5;
    }

    if !expected.is_empty() {
        let match_rate = (expected.len() - missing.len()) as f64 / expected.len() as f64;
        score += match_rate * 3.0;
    }

    if ["- ", "* ", "1.", "## "]
        .iter()
        .any(|marker| output.contains(marker))
    {
        score += 0.5;
    }

    score.min(10.0)
}

/// The test harness. Holds an injected generation provider; all calls are
/// strictly sequential and blocking from the caller's perspective.
pub struct PromptTester<P: GenerateText> {
    provider: P,
}

impl<P: GenerateText> PromptTester<P> {
    /// Creates a tester backed by the given provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Tests a single record file.
    ///
    /// Inputs resolve in order: explicit `test_input`, else the first
    /// example's input, else an empty mapping. Expected keywords come from
    /// the first example only when no explicit input was supplied; ad-hoc
    /// testing never auto-inherits expectations. The outbound text is built
    /// with the permissive raw substitution path, not strict rendering, so
    /// undeclared keys substitute and missing parameters cannot fail here.
    ///
    /// Every failure mode, from an unreadable file to a service error, is
    /// returned as a normal failed result.
    pub async fn test_prompt(
        &self,
        prompt_path: impl AsRef<Path>,
        test_input: Option<&BTreeMap<String, String>>,
        model_override: Option<&str>,
    ) -> TestResult {
        let path = prompt_path.as_ref();
        let stem_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let record: RawRecord = match fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_yaml::from_str(&content).map_err(|e| e.to_string()))
        {
            Ok(record) => record,
            Err(reason) => {
                return TestResult::failure(stem_name, BTreeMap::new(), reason);
            }
        };

        let prompt_name = record.name.unwrap_or(stem_name);
        let model = model_override
            .map(String::from)
            .unwrap_or(record.metadata.recommended_model);

        let input_data = match test_input {
            Some(input) => input.clone(),
            None => record
                .examples
                .first()
                .map(|ex| ex.input.clone())
                .unwrap_or_default(),
        };

        let expected_contains = if test_input.is_none() {
            record
                .examples
                .first()
                .map(|ex| ex.expected_output_contains.clone())
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        let rendered = render_raw(&record.template, &input_data);

        let request = GenerationRequest::new(model, rendered)
            .with_temperature(record.metadata.temperature)
            .with_max_output_tokens(
                record
                    .metadata
                    .max_tokens
                    .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
            );

        let start = Instant::now();
        match self.provider.generate(request).await {
            Ok(response) => {
                let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
                let output = response.text;
                let token_count = output.split_whitespace().count();

                let output_lower = output.to_lowercase();
                let missing_keywords: Vec<String> = expected_contains
                    .iter()
                    .filter(|kw| !output_lower.contains(&kw.to_lowercase()))
                    .cloned()
                    .collect();

                let quality_score = score_quality(&output, &expected_contains, &missing_keywords);
                let passed = missing_keywords.is_empty() && !output.trim().is_empty();

                tracing::debug!(
                    prompt = %prompt_name,
                    passed,
                    quality = quality_score,
                    latency_ms,
                    "Prompt test completed"
                );

                TestResult {
                    prompt_name,
                    test_input: input_data,
                    output,
                    quality_score,
                    latency_ms,
                    token_count,
                    passed,
                    expected_contains,
                    missing_keywords,
                    error: None,
                }
            }
            Err(e) => {
                tracing::debug!(prompt = %prompt_name, error = %e, "Prompt test errored");
                TestResult::failure(prompt_name, input_data, e.to_string())
            }
        }
    }

    /// Tests every record file under `dir`, recursively, in sorted path
    /// order, one at a time. Aggregates never divide by zero: an empty
    /// directory yields an all-zero result.
    pub async fn test_batch(
        &self,
        dir: impl AsRef<Path>,
        model_override: Option<&str>,
    ) -> BatchTestResult {
        let mut paths: Vec<_> = WalkDir::new(dir.as_ref())
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry
                        .path()
                        .extension()
                        .map(|ext| ext == "yaml" || ext == "yml")
                        .unwrap_or(false)
            })
            .map(|entry| entry.into_path())
            .collect();
        paths.sort();

        let mut results = Vec::with_capacity(paths.len());
        for path in &paths {
            tracing::info!(file = %path.display(), "Testing prompt");
            results.push(self.test_prompt(path, None, model_override).await);
        }

        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        let (avg_quality, avg_latency_ms) = if total > 0 {
            (
                results.iter().map(|r| r.quality_score).sum::<f64>() / total as f64,
                results.iter().map(|r| r.latency_ms).sum::<f64>() / total as f64,
            )
        } else {
            (0.0, 0.0)
        };

        BatchTestResult {
            total,
            passed,
            failed: total - passed,
            results,
            avg_quality,
            avg_latency_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::GenerationResponse;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Provider stub that replays canned outcomes and records the requests
    /// it receives.
    struct MockProvider {
        responses: Mutex<Vec<Result<String, LlmError>>>,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl MockProvider {
        fn with_outputs(outputs: Vec<Result<String, LlmError>>) -> Self {
            Self {
                // Popped from the back; store reversed so replies come in
                // declaration order.
                responses: Mutex::new(outputs.into_iter().rev().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn single(output: &str) -> Self {
            Self::with_outputs(vec![Ok(output.to_string())])
        }

        fn last_request(&self) -> GenerationRequest {
            self.requests
                .lock()
                .expect("lock")
                .last()
                .cloned()
                .expect("a request was made")
        }
    }

    #[async_trait]
    impl GenerateText for MockProvider {
        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            self.requests.lock().expect("lock").push(request);
            match self.responses.lock().expect("lock").pop() {
                Some(Ok(text)) => Ok(GenerationResponse { text }),
                Some(Err(e)) => Err(e),
                None => Err(LlmError::RequestFailed("mock exhausted".to_string())),
            }
        }
    }

    fn write_record(dir: &TempDir, file: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(file);
        fs::write(&path, content).expect("write fixture");
        path
    }

    const SUMMARY_RECORD: &str = r#"
name: executive_summary
category: summarization
template: "Summarize: {document}"
parameters:
  - name: document
metadata:
  recommended_model: gemini-2.5-flash-lite
  temperature: 0.3
  max_tokens: 256
examples:
  - input:
      document: "Revenue grew 12% this quarter."
    expected_output_contains: [revenue]
"#;

    #[test]
    fn test_score_empty_output_is_zero() {
        assert_eq!(score_quality("   \n\t", &[], &[]), 0.0);
    }

    #[test]
    fn test_score_non_empty_bounds() {
        let score = score_quality("short answer", &[], &[]);
        assert!((5.0..=10.0).contains(&score));
    }

    #[test]
    fn test_score_length_bonuses() {
        let short = "word ".repeat(10);
        let medium = "word ".repeat(60);
        let long = "word ".repeat(250);

        assert_eq!(score_quality(&short, &[], &[]), 5.0);
        assert_eq!(score_quality(&medium, &[], &[]), 6.0);
        assert_eq!(score_quality(&long, &[], &[]), 6.5);
    }

    #[test]
    fn test_score_keyword_fraction() {
        let expected = vec!["alpha".to_string(), "beta".to_string()];

        let all_present = score_quality("alpha beta", &expected, &[]);
        let half_missing = score_quality("alpha only", &expected, &["beta".to_string()]);

        assert_eq!(all_present, 8.0);
        assert_eq!(half_missing, 6.5);
        // Monotonicity: fewer missing keywords means a strictly higher score.
        assert!(all_present > half_missing);
    }

    #[test]
    fn test_score_structure_bonus_and_clamp() {
        let structured = "Findings:\n- item one\n- item two";
        assert_eq!(score_quality(structured, &[], &[]), 5.5);

        // Long output, full keyword coverage, structure: every bonus fires
        // and the sum lands exactly on the 10.0 ceiling.
        let expected = vec!["word".to_string()];
        let long_structured = format!("## Heading\n{}", "word ".repeat(250));
        let score = score_quality(&long_structured, &expected, &[]);
        assert_eq!(score, 10.0);
    }

    #[tokio::test]
    async fn test_prompt_uses_first_example_and_expectations() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_record(&dir, "summary.yaml", SUMMARY_RECORD);

        let provider = MockProvider::single("Revenue increased significantly this quarter.");
        let tester = PromptTester::new(provider);

        let result = tester.test_prompt(&path, None, None).await;

        assert!(result.passed, "keyword present and output non-empty");
        assert_eq!(result.prompt_name, "executive_summary");
        assert_eq!(result.expected_contains, vec!["revenue"]);
        assert!(result.missing_keywords.is_empty());
        assert!(result.quality_score >= 5.0);
        assert_eq!(result.token_count, 5);
        assert!(result.error.is_none());

        // The raw substitution path fed the example input into the template.
        let request = tester.provider.last_request();
        assert_eq!(request.prompt, "Summarize: Revenue grew 12% this quarter.");
        assert_eq!(request.model, "gemini-2.5-flash-lite");
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.max_output_tokens, Some(256));
    }

    #[tokio::test]
    async fn test_prompt_explicit_input_skips_expectations() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_record(&dir, "summary.yaml", SUMMARY_RECORD);

        let provider = MockProvider::single("Completely unrelated text.");
        let tester = PromptTester::new(provider);

        let input: BTreeMap<String, String> =
            [("document".to_string(), "Custom doc".to_string())].into();
        let result = tester.test_prompt(&path, Some(&input), None).await;

        // Ad-hoc input never inherits the example's expected keywords.
        assert!(result.expected_contains.is_empty());
        assert!(result.missing_keywords.is_empty());
        assert!(result.passed);
        assert_eq!(
            tester.provider.last_request().prompt,
            "Summarize: Custom doc"
        );
    }

    #[tokio::test]
    async fn test_prompt_missing_keyword_fails() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_record(&dir, "summary.yaml", SUMMARY_RECORD);

        let provider = MockProvider::single("No relevant terms here.");
        let tester = PromptTester::new(provider);

        let result = tester.test_prompt(&path, None, None).await;

        assert!(!result.passed);
        assert_eq!(result.missing_keywords, vec!["revenue"]);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_prompt_service_failure_captured_in_band() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_record(&dir, "summary.yaml", SUMMARY_RECORD);

        let provider = MockProvider::with_outputs(vec![Err(LlmError::ApiError {
            code: 503,
            message: "backend unavailable".to_string(),
        })]);
        let tester = PromptTester::new(provider);

        let result = tester.test_prompt(&path, None, None).await;

        assert!(!result.passed);
        assert_eq!(result.quality_score, 0.0);
        assert_eq!(result.latency_ms, 0.0);
        assert_eq!(result.token_count, 0);
        assert_eq!(
            result.error.as_deref(),
            Some("API error (503): backend unavailable")
        );
    }

    #[tokio::test]
    async fn test_prompt_model_override() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_record(&dir, "summary.yaml", SUMMARY_RECORD);

        let provider = MockProvider::single("revenue report");
        let tester = PromptTester::new(provider);

        tester
            .test_prompt(&path, None, Some("gemini-2.5-pro"))
            .await;
        assert_eq!(tester.provider.last_request().model, "gemini-2.5-pro");
    }

    #[tokio::test]
    async fn test_prompt_nameless_record_uses_file_stem() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_record(&dir, "draft_idea.yaml", "template: \"Say hi\"\n");

        let provider = MockProvider::single("hi there");
        let tester = PromptTester::new(provider);

        let result = tester.test_prompt(&path, None, None).await;
        assert_eq!(result.prompt_name, "draft_idea");
        assert!(result.passed);
    }

    #[tokio::test]
    async fn test_prompt_unreadable_file_is_failed_result() {
        let provider = MockProvider::single("never used");
        let tester = PromptTester::new(provider);

        let result = tester
            .test_prompt("/no/such/prompt.yaml", None, None)
            .await;

        assert!(!result.passed);
        assert!(result.error.is_some());
        assert_eq!(result.prompt_name, "prompt");
    }

    #[tokio::test]
    async fn test_batch_empty_directory_all_zero() {
        let dir = TempDir::new().expect("tempdir");
        let tester = PromptTester::new(MockProvider::with_outputs(vec![]));

        let batch = tester.test_batch(dir.path(), None).await;

        assert_eq!(batch.total, 0);
        assert_eq!(batch.passed, 0);
        assert_eq!(batch.failed, 0);
        assert_eq!(batch.avg_quality, 0.0);
        assert_eq!(batch.avg_latency_ms, 0.0);
        assert_eq!(batch.pass_rate(), 0.0);
    }

    #[tokio::test]
    async fn test_batch_aggregates_and_summary() {
        let dir = TempDir::new().expect("tempdir");
        write_record(&dir, "a_first.yaml", SUMMARY_RECORD);
        write_record(
            &dir,
            "b_second.yaml",
            "name: other\ntemplate: \"Plain request\"\nexamples:\n  - input: {}\n    expected_output_contains: [impossible]\n",
        );

        // Sorted path order: a_first gets the passing output.
        let provider = MockProvider::with_outputs(vec![
            Ok("Quarterly revenue summary.".to_string()),
            Ok("Nothing matching.".to_string()),
        ]);
        let tester = PromptTester::new(provider);

        let batch = tester.test_batch(dir.path(), None).await;

        assert_eq!(batch.total, 2);
        assert_eq!(batch.passed, 1);
        assert_eq!(batch.failed, 1);
        assert!((batch.pass_rate() - 50.0).abs() < f64::EPSILON);
        assert!(batch.avg_quality > 0.0);

        let summary = batch.summary();
        assert!(summary.contains("1/2 passed (50%)"));
        assert!(summary.contains("Failed tests:"));
        assert!(summary.contains("other: Missing keywords: impossible"));
    }
}
