use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[allow(deprecated)]
fn planbot(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("planbot").expect("binary");
    cmd.current_dir(workdir)
        .arg("--quiet")
        .arg("--corpus-dir")
        .arg(workdir.join("corpus"))
        .arg("--model-dir")
        .arg(workdir.join("models"));
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

fn setup_corpus() -> tempfile::TempDir {
    let temp = tempdir().unwrap();
    let corpus = temp.path().join("corpus");
    fs::create_dir_all(corpus.join("plan_text")).unwrap();
    fs::write(
        corpus.join("plans.json"),
        r#"[
          {"id": 1, "topic": "wealth tax", "display_title": "Ultra-Millionaire Tax",
           "url": "https://example.org/wealth-tax", "summary": "Two cents on big fortunes."},
          {"id": 2, "topic": "child care", "display_title": "Universal Child Care",
           "url": "https://example.org/child-care", "summary": "Affordable child care."},
          {"id": 3, "topic": "student debt", "display_title": "Cancel Student Debt",
           "url": "https://example.org/student-debt", "summary": "Cancel student loans."}
        ]"#,
    )
    .unwrap();
    fs::write(
        corpus.join("plan_text/1.json"),
        r#"{"text": "Billionaires pay an annual wealth tax on their fortunes above fifty million."}"#,
    )
    .unwrap();
    fs::write(
        corpus.join("plan_text/2.json"),
        r#"{"text": "Families get affordable child care and early learning from local providers."}"#,
    )
    .unwrap();
    fs::write(
        corpus.join("plan_text/3.json"),
        r#"{"text": "Cancel student loan debt and make public college tuition free."}"#,
    )
    .unwrap();
    fs::write(
        corpus.join("verbatims.json"),
        r#"[{"id": "basic_help", "text": "Ask me about any plan."}]"#,
    )
    .unwrap();
    temp
}

#[test]
fn match_prints_the_match_result() {
    let temp = setup_corpus();
    let body = stdout_json(
        planbot(temp.path())
            .arg("match")
            .arg("--strategy")
            .arg("token_sort_ratio")
            .arg("child care"),
    );
    assert_eq!(body["match"], "2");
    assert_eq!(body["confidence"], 100.0);
}

#[test]
fn match_reports_operations() {
    let temp = setup_corpus();
    let body = stdout_json(
        planbot(temp.path())
            .arg("match")
            .arg("--strategy")
            .arg("token_sort_ratio")
            .arg("!WarrenPlanBot show me the plans"),
    );
    assert!(body["match"].is_null());
    assert_eq!(body["operation"], "all_the_plans");
}

#[test]
fn build_models_then_match_with_tfidf() {
    let temp = setup_corpus();
    let summary = stdout_json(planbot(temp.path()).arg("build-models"));
    assert!(summary["documents"].as_u64().unwrap() > 0);
    assert!(summary["lsa_topics"].as_u64().unwrap() > 0);
    for file in [
        "plan_ids.json",
        "plans.dict.json",
        "tfidf.model.json",
        "tfidf.index.json",
        "lsa.model.json",
        "lsa.index.json",
    ] {
        assert!(temp.path().join("models").join(file).exists(), "{file}");
    }

    let body = stdout_json(
        planbot(temp.path())
            .arg("match")
            .arg("--strategy")
            .arg("tfidf")
            .arg("billionaires wealth tax fortunes"),
    );
    assert_eq!(body["match"], "1");
}

#[test]
fn match_without_models_fails_cleanly() {
    let temp = setup_corpus();
    planbot(temp.path())
        .arg("match")
        .arg("--strategy")
        .arg("lsa")
        .arg("something unrelated")
        .assert()
        .failure();
}

#[test]
fn process_sends_replies_and_writes_audit_records() {
    let temp = setup_corpus();
    let root = temp.path();
    fs::write(
        root.join("posts.json"),
        r#"[
          {"id": "p1", "kind": "submission", "author": "voter",
           "text": "!WarrenPlanBot child care"},
          {"id": "p2", "kind": "submission", "author": "voter",
           "text": "no summons here"},
          {"id": "p1", "kind": "submission", "author": "voter",
           "text": "!WarrenPlanBot child care"}
        ]"#,
    )
    .unwrap();
    fs::write(root.join("bot.toml"), "strategy = \"token_sort_ratio\"\n").unwrap();

    let body = stdout_json(
        planbot(root)
            .arg("--config")
            .arg(root.join("bot.toml"))
            .arg("process")
            .arg(root.join("posts.json"))
            .arg("--send")
            .arg("--audit-dir")
            .arg(root.join("audit"))
            .arg("--outbox")
            .arg(root.join("out/outbox.jsonl")),
    );
    let outcomes = body.as_array().unwrap();
    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0]["outcome"], "handled");
    assert_eq!(outcomes[0]["reply_type"], "plan");
    assert_eq!(outcomes[1]["reason"], "trigger_not_found");
    assert_eq!(outcomes[2]["outcome"], "already_processed");

    let outbox = fs::read_to_string(root.join("out/outbox.jsonl")).unwrap();
    assert_eq!(outbox.lines().count(), 1);
    assert!(outbox.contains("Universal Child Care"));

    let record: Value =
        serde_json::from_slice(&fs::read(root.join("audit/p1.json")).unwrap()).unwrap();
    assert_eq!(record["plan_match"], "2");
    assert_eq!(record["replied"], true);
    assert!(root.join("audit/p2.json").exists());
}

#[test]
fn process_dry_run_sends_nothing() {
    let temp = setup_corpus();
    let root = temp.path();
    fs::write(
        root.join("posts.json"),
        r#"[{"id": "p1", "kind": "submission", "author": "voter", "text": "!warrenplanbot help"}]"#,
    )
    .unwrap();

    let body = stdout_json(
        planbot(root)
            .arg("process")
            .arg(root.join("posts.json"))
            .arg("--audit-dir")
            .arg(root.join("audit")),
    );
    assert_eq!(body[0]["reply_type"], "operation");
    assert_eq!(body[0]["replied"], false);
    assert!(!root.join(".planbot/outbox.jsonl").exists());
}

#[test]
fn eval_ranks_strategies() {
    let temp = setup_corpus();
    let root = temp.path();
    fs::write(
        root.join("labelled.json"),
        r#"[
          {"text": "!warrenplanbot child care", "match": "2"},
          {"text": "!warrenplanbot student debt", "match": "3", "alternate_matches": ["1"]},
          {"text": "!warrenplanbot zzzz", "match": null}
        ]"#,
    )
    .unwrap();

    let body = stdout_json(
        planbot(root)
            .arg("eval")
            .arg(root.join("labelled.json"))
            .arg("--strategies")
            .arg("token_sort_ratio")
            .arg("--json"),
    );
    assert_eq!(body[0]["name"], "token_sort_ratio");
    assert_eq!(body[0]["total_score"], 100.0);

    planbot(root)
        .arg("eval")
        .arg(root.join("labelled.json"))
        .arg("--strategies")
        .arg("token_sort_ratio")
        .assert()
        .success()
        .stdout(predicate::str::contains("# Strategy evaluation"));
}

#[test]
fn unknown_strategy_is_rejected() {
    let temp = setup_corpus();
    planbot(temp.path())
        .arg("match")
        .arg("--strategy")
        .arg("word2vec")
        .arg("child care")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}
