//! End-to-end registration runs against the in-memory catalog.
//!
//! Each test scripts the operator's answers and checks what ends up in the
//! catalog tables.

use catalog_capture::catalog::{
    CatalogSnapshot, CatalogStore as _, MemoryCatalog, TransactionCoordinator,
};
use catalog_capture::error::{CatalogError, Result, StoreError, WriteStage};
use catalog_capture::input::{InputColumn, InputFile};
use catalog_capture::prompt::ScriptedPrompter;
use catalog_capture::workflow::{self, RegistrationWorkflow, WorkflowState, rules};
use chrono::NaiveDate;

const TOPIC: &str = "catalog";

fn sales_input(columns: &[&str]) -> InputFile {
    InputFile::new(
        "sales.csv",
        columns.iter().map(|c| InputColumn::named(*c)).collect(),
        3,
    )
}

fn dataset_answers(name: &str, keywords: &[&str]) -> Vec<String> {
    let mut answers = owned(&[
        name,
        "Daily sales per store",
        "store-day",
        "All stores open during the period",
        "Finance",
        "Point of sale system",
        "Automated export",
        "Revenue reporting",
        "https://example.org/sales",
        "",
        "Internal use only",
    ]);

    for (idx, keyword) in keywords.iter().enumerate() {
        answers.push((*keyword).to_owned());
        let more = if idx + 1 < keywords.len() { "y" } else { "n" };
        answers.push(more.to_owned());
    }
    answers.push("month".to_owned());
    answers
}

fn owned(answers: &[&str]) -> Vec<String> {
    answers.iter().map(|s| (*s).to_owned()).collect()
}

fn sales_variable_answers() -> Vec<String> {
    let store_id = ["Store identifier", "string", "n", "n", "n"];
    let amount = ["Sale amount in dollars", "numeric", "y", "store_id", "y", "10", "n"];
    owned(&[&store_id[..], &amount[..]].concat())
}

fn edition_answers() -> Vec<String> {
    owned(&["First pull", "2024-02-01", "2024-01-01", "2024-01-31", "2024-02-02"])
}

fn new_dataset_script(name: &str, keywords: &[&str]) -> ScriptedPrompter {
    let mut answers = dataset_answers(name, keywords);
    answers.extend(sales_variable_answers());
    answers.extend(edition_answers());
    ScriptedPrompter::new(answers)
}

fn edition_script(name: &str) -> ScriptedPrompter {
    let mut answers = vec![name.to_owned()];
    answers.extend(edition_answers());
    ScriptedPrompter::new(answers)
}

/// Hands `register` a clone sharing the script, so the test can still
/// inspect what was asked afterwards.
fn answering(prompter: ScriptedPrompter) -> impl FnOnce() -> Result<ScriptedPrompter> + Send {
    move || Ok(prompter)
}

async fn register_scripted(
    catalog: &MemoryCatalog,
    prompter: &ScriptedPrompter,
    input: InputFile,
) -> Result<i32> {
    workflow::register(catalog, input, TOPIC, answering(prompter.clone())).await
}

async fn register_sales_v1(catalog: &MemoryCatalog) -> i32 {
    let prompter = new_dataset_script("sales_v1", &["retail"]);
    register_scripted(catalog, &prompter, sales_input(&["store_id", "amount"]))
        .await
        .expect("first registration of sales_v1 should succeed")
}

#[tokio::test]
async fn test_new_dataset_from_csv_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("sales.csv");
    std::fs::write(&path, "store_id,amount\n1,10.5\n2,3.25\n3,8.0\n").expect("write fixture");
    let input = InputFile::read(&path).expect("read fixture");

    let catalog = MemoryCatalog::new();
    let prompter = new_dataset_script("sales_v1", &["retail", "sales"]);
    let dataset_id = register_scripted(&catalog, &prompter, input)
        .await
        .expect("registration should succeed");

    let tables = catalog.tables().await;
    assert_eq!(tables.datasets.len(), 1, "one dataset");
    assert_eq!(tables.variables.len(), 2, "one variable per column");
    assert_eq!(tables.editions.len(), 1, "one edition");
    assert_eq!(tables.keywords.len(), 2);
    assert_eq!(tables.tags.len(), 2);

    let dataset = tables.dataset_by_name("sales_v1").expect("dataset stored");
    assert_eq!(dataset.id, dataset_id);
    assert_eq!(dataset.dataset.topic, TOPIC);

    let names: Vec<&str> = tables
        .variables_of(dataset_id)
        .iter()
        .map(|v| v.variable.variable_name.as_str())
        .collect();
    assert_eq!(names, vec!["store_id", "amount"]);

    let edition = tables.editions_of(dataset_id);
    assert_eq!(edition.len(), 1);
    assert_eq!(edition.first().map(|e| e.edition.num_records), Some(3));
    assert_eq!(prompter.remaining(), 0, "every scripted answer is used");

    let snapshot = CatalogSnapshot::load(&catalog).await.expect("snapshot");
    let known = snapshot.dataset("sales_v1").expect("new dataset is visible");
    assert_eq!(known.variables, vec!["store_id", "amount"]);
}

#[tokio::test]
async fn test_extra_column_is_a_schema_mismatch() {
    let catalog = MemoryCatalog::new();
    register_sales_v1(&catalog).await;
    let before = catalog.tables().await;

    let prompter = edition_script("sales_v1");
    let result =
        register_scripted(&catalog, &prompter, sales_input(&["store_id", "amount", "region"]))
            .await;

    match result {
        Err(CatalogError::SchemaMismatch {
            dataset,
            missing,
            unexpected,
            ..
        }) => {
            assert_eq!(dataset, "sales_v1");
            assert!(missing.is_empty());
            assert_eq!(unexpected, vec!["region"]);
        }
        other => panic!("expected a schema mismatch, got {other:?}"),
    }
    assert_eq!(
        prompter.remaining(),
        edition_answers().len(),
        "no edition question is asked after a mismatch"
    );
    assert_eq!(catalog.tables().await, before, "the catalog is unchanged");
}

#[tokio::test]
async fn test_missing_column_is_a_schema_mismatch() {
    let catalog = MemoryCatalog::new();
    register_sales_v1(&catalog).await;
    let before = catalog.tables().await;

    let prompter = edition_script("sales_v1");
    let result = register_scripted(&catalog, &prompter, sales_input(&["store_id"])).await;

    assert!(
        matches!(
            &result,
            Err(CatalogError::SchemaMismatch { missing, .. }) if missing == &["amount"]
        ),
        "got {result:?}"
    );
    assert_eq!(catalog.tables().await, before, "the catalog is unchanged");
}

#[tokio::test]
async fn test_reordered_columns_add_one_edition() {
    let catalog = MemoryCatalog::new();
    let dataset_id = register_sales_v1(&catalog).await;
    let before = catalog.tables().await;

    let prompter = edition_script("sales_v1");
    let second_id = register_scripted(&catalog, &prompter, sales_input(&["amount", "store_id"]))
        .await
        .expect("a reordered file is the same dataset");

    let after = catalog.tables().await;
    assert_eq!(second_id, dataset_id);
    assert_eq!(after.editions_of(dataset_id).len(), 2);
    assert_eq!(after.datasets.len(), before.datasets.len());
    assert_eq!(after.variables.len(), before.variables.len());
    assert_eq!(after.keywords.len(), before.keywords.len());
    assert_eq!(after.tags.len(), before.tags.len());
}

#[tokio::test]
async fn test_existing_keywords_are_reused() {
    let catalog = MemoryCatalog::new();
    let mut tx = catalog.begin().await.expect("begin");
    let seeded = tx
        .insert_keywords(&["retail".to_owned()])
        .await
        .expect("seed keyword");
    tx.commit().await.expect("commit seed");
    let retail_id = seeded.first().map(|k| k.id).expect("seeded id");

    let prompter = new_dataset_script("sales_v1", &["retail", "sales", "retail"]);
    let dataset_id = register_scripted(&catalog, &prompter, sales_input(&["store_id", "amount"]))
        .await
        .expect("registration should succeed");

    let tables = catalog.tables().await;
    let retail: Vec<_> = tables
        .keywords
        .iter()
        .filter(|k| k.content == "retail")
        .collect();
    assert_eq!(retail.len(), 1, "retail is not inserted twice");
    assert_eq!(retail.first().map(|k| k.id), Some(retail_id));
    assert_eq!(tables.keywords.len(), 2);

    let mut tagged: Vec<_> = tables
        .tags
        .iter()
        .filter(|t| t.dataset_id == dataset_id)
        .map(|t| t.kw_id)
        .collect();
    tagged.sort_unstable();
    tagged.dedup();
    assert_eq!(tagged.len(), 2, "one tag per distinct keyword");
    assert!(tagged.contains(&retail_id));
}

#[tokio::test]
async fn test_failed_edition_insert_rolls_back_everything() {
    let catalog = MemoryCatalog::new();
    catalog.fail_at(WriteStage::InsertEdition).await;

    let prompter = new_dataset_script("sales_v1", &["retail"]);
    let result = register_scripted(&catalog, &prompter, sales_input(&["store_id", "amount"])).await;

    assert!(
        matches!(
            result,
            Err(CatalogError::CatalogWrite {
                stage: WriteStage::InsertEdition,
                ..
            })
        ),
        "got {result:?}"
    );
    let tables = catalog.tables().await;
    assert!(tables.datasets.is_empty());
    assert!(tables.variables.is_empty());
    assert!(tables.keywords.is_empty());
    assert!(tables.tags.is_empty());
    assert!(tables.editions.is_empty());
}

#[tokio::test]
async fn test_self_parent_is_asked_again() {
    let mut answers = dataset_answers("sales_v1", &["retail"]);
    answers.extend(owned(&["Store identifier", "string", "n", "n", "n"]));
    answers.extend(owned(&["Sale amount", "numeric", "y", "amount", "store_id", "n", "n"]));
    answers.extend(edition_answers());
    let prompter = ScriptedPrompter::new(answers);

    let catalog = MemoryCatalog::new();
    let dataset_id = register_scripted(&catalog, &prompter, sales_input(&["store_id", "amount"]))
        .await
        .expect("registration should succeed once a sibling is named");

    assert_eq!(
        prompter.rejections(),
        vec![("amount".to_owned(), rules::PARENT_MESSAGE.to_owned())]
    );
    let tables = catalog.tables().await;
    let amount = tables
        .variables_of(dataset_id)
        .into_iter()
        .find(|v| v.variable.variable_name == "amount")
        .expect("amount stored");
    assert_eq!(amount.variable.parent_variable.as_deref(), Some("store_id"));
}

#[tokio::test]
async fn test_invalid_dates_are_asked_again() {
    let catalog = MemoryCatalog::new();
    let dataset_id = register_sales_v1(&catalog).await;

    let prompter = ScriptedPrompter::new([
        "sales_v1",
        "Second pull",
        "2024-13-01",
        "yesterday",
        "2024-03-01",
        "2024-02-01",
        "2024-02-29",
        "03-Mar-2024",
    ]);
    register_scripted(&catalog, &prompter, sales_input(&["store_id", "amount"]))
        .await
        .expect("registration should succeed");

    assert_eq!(prompter.rejections().len(), 2);
    assert!(
        prompter
            .rejections()
            .iter()
            .all(|(_, message)| message == rules::DATE_MESSAGE)
    );

    let tables = catalog.tables().await;
    let latest = tables
        .editions_of(dataset_id)
        .into_iter()
        .find(|e| e.edition.notes == "Second pull")
        .expect("second edition stored");
    let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).expect("date");
    assert_eq!(latest.edition.publish_date, day(1));
    assert_eq!(latest.edition.acquisition_date, day(3));
}

#[tokio::test]
async fn test_unavailable_catalog_stops_before_prompting() {
    let catalog = MemoryCatalog::new();
    catalog.set_unavailable(true).await;

    let prompter = new_dataset_script("sales_v1", &["retail"]);
    let result = register_scripted(&catalog, &prompter, sales_input(&["store_id", "amount"])).await;

    assert!(
        matches!(result, Err(CatalogError::CatalogUnavailable(_))),
        "got {result:?}"
    );
    assert!(prompter.asked().is_empty());
}

#[tokio::test]
async fn test_dataset_created_after_snapshot_fails_on_commit() {
    let catalog = MemoryCatalog::new();
    let snapshot = CatalogSnapshot::load(&catalog).await.expect("snapshot");

    // Another session registers the same name after our snapshot was taken.
    register_sales_v1(&catalog).await;

    let mut workflow =
        RegistrationWorkflow::new(snapshot, sales_input(&["store_id", "amount"]), TOPIC);
    let mut prompter = new_dataset_script("sales_v1", &["retail"]);
    let plan = workflow.interview(&mut prompter).expect("interview");
    assert!(plan.is_new_dataset());

    let result = workflow
        .commit(&TransactionCoordinator::new(&catalog), &plan)
        .await;

    assert!(
        matches!(
            result,
            Err(CatalogError::CatalogWrite {
                stage: WriteStage::InsertDataset,
                source: StoreError::UniqueViolation { .. },
            })
        ),
        "got {result:?}"
    );
    assert_eq!(workflow.state(), WorkflowState::Commit);
    assert_eq!(catalog.tables().await.datasets.len(), 1);
}

#[tokio::test]
async fn test_file_without_columns_is_never_registered() {
    let catalog = MemoryCatalog::new();

    for attempt in 1..=2 {
        let prompter = new_dataset_script("empty_ds", &["retail"]);
        let empty = InputFile::new("e.csv", vec![], 0);
        let result = register_scripted(&catalog, &prompter, empty).await;

        assert!(
            matches!(result, Err(CatalogError::Input(_))),
            "attempt {attempt}: got {result:?}"
        );
        assert!(prompter.asked().is_empty(), "nothing is asked about an empty file");
    }
    assert_eq!(catalog.tables().await, MemoryCatalog::new().tables().await);
}

#[tokio::test]
async fn test_prompter_failure_stops_before_commit() {
    let catalog = MemoryCatalog::new();

    let result = workflow::register(
        &catalog,
        sales_input(&["store_id", "amount"]),
        TOPIC,
        || Err::<ScriptedPrompter, _>(CatalogError::Prompt("no terminal".to_owned())),
    )
    .await;

    assert!(matches!(result, Err(CatalogError::Prompt(_))), "got {result:?}");
    assert!(catalog.tables().await.datasets.is_empty());
}
