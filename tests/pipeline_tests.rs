//! End-to-end tests: ingest a raw dataset, then query the cached artifacts

use std::sync::Arc;

use nutrition_insights::{
    Artifact, BlobStore, CsvExporter, IngestionTrigger, MemoryBlobStore, QueryService, RowFilter,
    parse_csv, transform,
};

const IMPUTATION: &str = "Diet_type,Recipe_name,Cuisine_type,Protein(g),Carbs(g),Fat(g)\n\
     keto ,Omelette,french,10,5,20\n\
    Keto,Pork Belly,,,10,30\n";

async fn ingest(source: &str) -> (Arc<MemoryBlobStore>, QueryService) {
    let store = Arc::new(MemoryBlobStore::new());
    let trigger = IngestionTrigger::new(store.clone(), "outputs");
    trigger.handle("All_Diets.csv", source.as_bytes()).await.unwrap();
    let query = QueryService::new(store.clone(), "outputs");
    (store, query)
}

/// Twelve recipes across three diets, protein descending within keto
fn larger_dataset() -> String {
    let mut csv = String::from("Diet_type,Recipe_name,Cuisine_type,Protein(g),Carbs(g),Fat(g)\n");
    for i in 0..7 {
        csv.push_str(&format!("keto,Keto dish {i},american,{},5,20\n", 40 - i));
    }
    for i in 0..3 {
        csv.push_str(&format!("vegan,Vegan dish {i},asian,{},50,8\n", 10 + i));
    }
    csv.push_str("paleo,Paleo dish 0,mediterranean,35,12,18\n");
    csv.push_str("paleo,Paleo dish 1,mediterranean,25,0,10\n");
    csv
}

#[tokio::test]
async fn test_imputation_and_aggregate() {
    let (store, _) = ingest(IMPUTATION).await;

    let aggregate = store
        .get("outputs", Artifact::AggregateCsv.blob_name())
        .await
        .unwrap();
    assert_eq!(
        String::from_utf8(aggregate).unwrap(),
        "Diet_type,Protein(g),Carbs(g),Fat(g)\nKeto,10.0,7.5,25.0\n"
    );

    let cleaned = store
        .get("outputs", Artifact::CleanedCsv.blob_name())
        .await
        .unwrap();
    assert_eq!(
        String::from_utf8(cleaned).unwrap(),
        "Diet_type,Recipe_name,Cuisine_type,Protein(g),Carbs(g),Fat(g),Protein_to_Carbs_ratio,Carbs_to_Fat_ratio\n\
         Keto,Omelette,French,10.0,5,20,2.0,0.25\n\
         Keto,Pork Belly,Unknown,10.0,10,30,1.0,0.3333333333333333\n"
    );
}

#[tokio::test]
async fn test_all_artifacts_published() {
    let (store, _) = ingest(IMPUTATION).await;

    for artifact in Artifact::ALL {
        let content = store.get("outputs", artifact.blob_name()).await.unwrap();
        if artifact.content_type() == "image/png" {
            assert!(content.starts_with(b"\x89PNG"), "{artifact} is not a PNG");
        } else {
            assert!(!content.is_empty(), "{artifact} is empty");
        }
    }
}

#[tokio::test]
async fn test_raw_fetch_round_trip() {
    let source = larger_dataset();
    let (_, query) = ingest(&source).await;

    let expected = CsvExporter::new()
        .export_cleaned(&transform(&parse_csv(source.as_bytes()).unwrap()).unwrap().cleaned)
        .unwrap();
    assert_eq!(query.raw().await.unwrap(), expected);
}

#[tokio::test]
async fn test_page_by_diet() {
    let (_, query) = ingest(IMPUTATION).await;

    let filter = RowFilter::new(Some("Keto".to_string()), None);
    let page = query.page(&filter, 1, 1).await.unwrap();
    assert_eq!(page.total_rows, 2);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0]["Recipe_name"], "Omelette");
}

#[tokio::test]
async fn test_page_for_unknown_diet_is_empty() {
    let (_, query) = ingest(IMPUTATION).await;

    let filter = RowFilter::new(Some("Vegan".to_string()), None);
    let page = query.page(&filter, 1, 20).await.unwrap();
    assert_eq!(page.total_rows, 0);
    assert_eq!(page.total_pages, 0);
    assert!(page.data.is_empty());
}

#[tokio::test]
async fn test_pagination_reassembles_filtered_rows() {
    let (_, query) = ingest(&larger_dataset()).await;
    let filter = RowFilter::new(None, Some("dish".to_string()));

    for page_size in 1..=5 {
        let first = query.page(&filter, 1, page_size).await.unwrap();
        let mut rows = first.data.clone();
        for page in 2..=first.total_pages {
            rows.extend(query.page(&filter, page, page_size).await.unwrap().data);
        }

        let all = query.page(&filter, 1, 100).await.unwrap();
        assert_eq!(rows, all.data, "page size {page_size}");
        assert_eq!(all.total_rows, 12);

        let beyond = query
            .page(&filter, first.total_pages + 1, page_size)
            .await
            .unwrap();
        assert!(beyond.data.is_empty());
    }
}

#[tokio::test]
async fn test_top_protein_limits_each_diet() {
    let (store, _) = ingest(&larger_dataset()).await;

    let top = store
        .get("outputs", Artifact::TopProteinCsv.blob_name())
        .await
        .unwrap();
    let text = String::from_utf8(top).unwrap();
    let mut lines = text.lines();

    assert_eq!(
        lines.next(),
        Some("Diet_type,Recipe_name,Cuisine_type,Protein(g),Carbs(g),Fat(g)")
    );
    let rows: Vec<&str> = lines.collect();
    let keto: Vec<_> = rows.iter().filter(|r| r.starts_with("Keto,")).collect();
    assert_eq!(keto.len(), 5);
    // Highest protein first; dishes 5 and 6 are the lowest and dropped
    assert!(keto[0].contains("Keto dish 0"));
    assert!(!text.contains("Keto dish 5"));
    assert_eq!(rows.len(), 5 + 3 + 2);
}

#[tokio::test]
async fn test_stats_counts_filtered_rows() {
    let (_, query) = ingest(&larger_dataset()).await;

    let stats = query
        .stats(&RowFilter::new(Some("paleo".to_string()), Some("mediterranean".to_string())))
        .await
        .unwrap();
    assert_eq!(stats.rows_processed, 2);
    assert_eq!(
        stats.uploaded_files,
        vec![
            "avg_macros_bar_chart.png",
            "macronutrient_heatmap.png",
            "top5_protein_scatter.png"
        ]
    );
}

#[tokio::test]
async fn test_queries_fail_before_first_ingest() {
    let store = Arc::new(MemoryBlobStore::new());
    let query = QueryService::new(store, "outputs");

    let err = query.raw().await.unwrap_err();
    assert!(err.to_string().contains("processed_data_with_metrics.csv"));
    assert!(query.page(&RowFilter::default(), 1, 20).await.is_err());
}

#[tokio::test]
async fn test_reingest_is_idempotent() {
    let store = Arc::new(MemoryBlobStore::new());
    let trigger = IngestionTrigger::new(store.clone(), "outputs");
    let source = larger_dataset();

    trigger.handle("a.csv", source.as_bytes()).await.unwrap();
    let mut first = Vec::new();
    for artifact in Artifact::ALL {
        first.push(store.get("outputs", artifact.blob_name()).await.unwrap());
    }

    trigger.handle("a.csv", source.as_bytes()).await.unwrap();
    for (artifact, before) in Artifact::ALL.iter().zip(first) {
        assert_eq!(store.get("outputs", artifact.blob_name()).await.unwrap(), before);
    }
}
