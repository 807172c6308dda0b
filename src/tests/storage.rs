pub use crate::*;

#[cfg(test)]
pub mod tests {
    use super::*;
    use axum::{
        extract::{Query, State},
        http::StatusCode,
    };
    use object_store::{memory::InMemory, path::Path, ObjectStore};
    use std::sync::Arc;

    fn stats(median: f64, count: u64) -> QuantileSummary {
        QuantileSummary {
            min: median - 20.0,
            q1: median - 10.0,
            median,
            q3: median + 10.0,
            max: median + 20.0,
            outliers: vec![median + 25.0],
            count,
        }
    }

    fn row(city: &str, asn: u32, name: &str, median: f64) -> SummaryRow {
        let location = LocationKey::new(city, "US", "DFW");
        SummaryRow {
            key: location.key(),
            location,
            group: GroupIdentity::new(asn, name),
            stats: [
                (Metric::Download, stats(median, 120)),
                (Metric::Latency, stats(40.0, 120)),
            ]
            .into_iter()
            .collect(),
        }
    }

    fn fixture_rows() -> Vec<SummaryRow> {
        vec![
            row("Austin", 7922, "Comcast", 300.0),
            row("Austin", 14593, "SpaceX", 110.0),
            row("Boise", 14593, "SpaceX", 90.0),
            row("Austin", 7018, "AT&T", 250.0),
        ]
    }

    fn memory_store() -> Arc<dyn ObjectStore> {
        Arc::new(InMemory::new())
    }

    async fn seeded_state() -> Arc<AppState> {
        let store = memory_store();
        SummaryWriter::new(Arc::clone(&store))
            .write_summary_rows(Source::Cloudflare, &fixture_rows())
            .await
            .unwrap();
        Arc::new(AppState::new(store, Config::default()))
    }

    #[tokio::test]
    async fn test_summary_rows_round_trip() {
        let store = memory_store();
        let rows = fixture_rows();

        SummaryWriter::new(Arc::clone(&store))
            .write_summary_rows(Source::MLab, &rows)
            .await
            .unwrap();

        let mut read = SummaryReader::new(Arc::clone(&store))
            .read_summary_rows(Source::MLab)
            .await
            .unwrap();

        let mut expected = rows.clone();
        expected.sort_by_key(SummaryRow::group_key);
        read.sort_by_key(SummaryRow::group_key);
        assert_eq!(read, expected);
    }

    #[tokio::test]
    async fn test_rows_with_malformed_metric_survive() {
        let mut rows = fixture_rows();
        rows.truncate(1);
        let batch = summary_batch(&rows).unwrap();

        // Corrupt latency while leaving download intact
        let blob = r#"{"download": {"min": 1.0, "q1": 2.0, "median": 3.0, "q3": 4.0, "max": 5.0, "outliers": [], "count": 10}, "latencyMs": {"median": "fast"}}"#;
        let columns: Vec<(String, arrow::array::ArrayRef)> = batch
            .schema()
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, column)| {
                let column = if field.name() == "boxplot_stats" {
                    Arc::new(arrow::array::StringArray::from(vec![blob])) as arrow::array::ArrayRef
                } else {
                    Arc::clone(column)
                };
                (field.name().clone(), column)
            })
            .collect();
        let batch = arrow::record_batch::RecordBatch::try_from_iter(columns).unwrap();

        let parsed = rows_from_batch(&batch).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].stats.len(), 1);
        assert!(parsed[0].summary(Metric::Download).is_some());
    }

    #[tokio::test]
    async fn test_regional_means_round_trip() {
        let store = memory_store();
        let means = vec![RegionalMeans {
            region: "Texas".to_string(),
            country: "US".to_string(),
            metrics: [(Metric::Download, MomentSummary { mean: 140.5, std_dev: 12.0, sample_count: 88 })]
                .into_iter()
                .collect(),
        }];

        let writer = SummaryWriter::new(Arc::clone(&store));
        writer
            .write_regional_means(RegionalTable::Cloudflare, &means, &SUMMARY_METRICS)
            .await
            .unwrap();

        let read = SummaryReader::new(store)
            .read_regional_means(RegionalTable::Cloudflare, &SUMMARY_METRICS)
            .await
            .unwrap();
        assert_eq!(read, means);
    }

    #[tokio::test]
    async fn test_available_sources_and_metadata() {
        let store = memory_store();
        let writer = SummaryWriter::new(Arc::clone(&store));
        writer.write_summary_rows(Source::MLab, &fixture_rows()).await.unwrap();
        writer.write_summary_rows(Source::Cloudflare, &[]).await.unwrap();

        let metadata = ProcessingMetadata {
            processed_date: "2025-07-23".to_string(),
            sources: [("mlab".to_string(), SourceMetadata { rows: 4, locations: 2, observations: 480, skipped_rows: 1 })]
                .into_iter()
                .collect(),
            regional_records: 0,
            starlink_state_records: 0,
        };
        writer.write_metadata(&metadata).await.unwrap();

        let sources = SummaryReader::new(Arc::clone(&store)).available_sources().await.unwrap();
        assert_eq!(sources, vec![Source::Cloudflare, Source::MLab]);

        let bytes = store
            .get(&Path::from(METADATA_FILE))
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        let stored: ProcessingMetadata = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(stored, metadata);
    }

    #[tokio::test]
    async fn test_boxplot_series_order() {
        let state = seeded_state().await;
        let query = BoxplotQuery {
            source: "cloudflare".to_string(),
            metric: "download".to_string(),
            location: None,
            seed: Some(4),
        };

        let response = get_boxplot(State(state), Query(query)).await.unwrap().0;
        let labels: Vec<&str> = response.series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["14593 - SpaceX", "7018 - AT&T", "7922 - Comcast"]);

        let spacex = &response.series[0];
        assert!(spacex.distinguished);
        // Two locations, each capped clusters plus one admitted outlier
        assert_eq!(spacex.points.len(), 2 * (SAMPLE_CAP + 1));
        assert_eq!(response.title, Metric::Download.title());
    }

    #[tokio::test]
    async fn test_boxplot_location_filter_and_seed() {
        let state = seeded_state().await;
        let query = || BoxplotQuery {
            source: "cloudflare".to_string(),
            metric: "latencyMs".to_string(),
            location: Some("Boise, US (to DFW)".to_string()),
            seed: Some(11),
        };

        let first = get_boxplot(State(Arc::clone(&state)), Query(query())).await.unwrap().0;
        let second = get_boxplot(State(state), Query(query())).await.unwrap().0;

        assert_eq!(first.series.len(), 1);
        assert_eq!(first.series[0].asn, 14593);
        assert_eq!(first.series[0].points, second.series[0].points);
    }

    #[tokio::test]
    async fn test_boxplot_errors() {
        let state = seeded_state().await;

        let bad_metric = BoxplotQuery {
            source: "cloudflare".to_string(),
            metric: "speed".to_string(),
            location: None,
            seed: None,
        };
        let err = get_boxplot(State(Arc::clone(&state)), Query(bad_metric)).await.unwrap_err();
        assert_eq!(err, StatusCode::BAD_REQUEST);

        let missing_source = BoxplotQuery {
            source: "mlab".to_string(),
            metric: "download".to_string(),
            location: None,
            seed: None,
        };
        let err = get_boxplot(State(state), Query(missing_source)).await.unwrap_err();
        assert_eq!(err, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_group_details_endpoint() {
        let state = seeded_state().await;
        let query = DetailsQuery {
            source: "cloudflare".to_string(),
            asn: 14593,
            name: "SpaceX".to_string(),
        };

        let details = get_group_details(State(Arc::clone(&state)), Query(query)).await.unwrap().0;
        assert_eq!(details.location_count, 2);
        assert_eq!(details.metrics[&Metric::Download].total_measurements, 240);

        let unknown = DetailsQuery {
            source: "cloudflare".to_string(),
            asn: 1,
            name: "Nobody".to_string(),
        };
        let err = get_group_details(State(state), Query(unknown)).await.unwrap_err();
        assert_eq!(err, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_boxplot_single_location_caps_groups() {
        let store = memory_store();
        let mut rows = vec![row("Austin", 14593, "SpaceX", 110.0)];
        for asn in 1..=12u32 {
            let mut isp = row("Austin", asn, &format!("ISP {:02}", asn), 200.0);
            for stats in isp.stats.values_mut() {
                stats.count = 100 + asn as u64;
            }
            rows.push(isp);
        }
        SummaryWriter::new(Arc::clone(&store))
            .write_summary_rows(Source::MLab, &rows)
            .await
            .unwrap();
        let state = Arc::new(AppState::new(store, Config::default()));

        let query = |location: Option<&str>| BoxplotQuery {
            source: "mlab".to_string(),
            metric: "download".to_string(),
            location: location.map(str::to_string),
            seed: Some(1),
        };

        let capped = get_boxplot(State(Arc::clone(&state)), Query(query(Some("Austin, US (to DFW)"))))
            .await
            .unwrap()
            .0;
        assert_eq!(capped.series.len(), MAX_LOCATION_GROUPS);
        assert_eq!(capped.series[0].asn, 14593);
        // The three smallest operators fall outside the cap
        assert!(capped.series.iter().all(|s| s.asn == 14593 || s.asn > 3));

        let everything = get_boxplot(State(state), Query(query(None))).await.unwrap().0;
        assert_eq!(everything.series.len(), 13);
    }

    #[tokio::test]
    async fn test_locations_endpoint() {
        let state = seeded_state().await;

        let response = get_locations(
            State(Arc::clone(&state)),
            Query(LocationsQuery { source: "cloudflare".to_string() }),
        )
        .await
        .unwrap()
        .0;

        let labels: Vec<&str> = response.cities.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Austin, US", "Boise, US"]);
        assert_eq!(response.cities[1].destinations[0].key, "Boise, US (to DFW)");

        let err = get_locations(State(state), Query(LocationsQuery { source: "mlab".to_string() }))
            .await
            .unwrap_err();
        assert_eq!(err, StatusCode::NOT_FOUND);
    }

    fn cloudflare_csv(rows: &[(&str, u32, &str, f64)]) -> String {
        let mut csv = String::from(
            "clientCity,clientCountry,clientRegion,serverPoP,clientASN,clientASName,download,upload,latencyMs,jitter,loss\n",
        );
        for (city, asn, name, download) in rows {
            csv.push_str(&format!(
                "{},US,Texas,DFW,{},{},{},10,25,2,0\n",
                city, asn, name, download
            ));
        }
        csv
    }

    #[tokio::test]
    async fn test_preprocess_end_to_end() {
        let store = memory_store();

        let mut raw = Vec::new();
        for i in 0..12 {
            raw.push(("Austin", 14593, "SpaceX", 100.0 + i as f64));
            raw.push(("Austin", 7922, "Comcast", 300.0 + i as f64));
        }
        raw.push(("Austin", 7018, "AT&T", 250.0));
        store
            .put(&Path::from("raw/cloudflare.csv"), cloudflare_csv(&raw).into_bytes().into())
            .await
            .unwrap();

        let states = "state_name,country_iso2,date,download_p50,upload_p50,latency_p50\n\
                      Texas,US,202506,110,15,30\n\
                      Utah,US,202506,95,12,35\n";
        store
            .put(&Path::from("raw/starlink_states.csv"), states.as_bytes().to_vec().into())
            .await
            .unwrap();

        let config = Config {
            aggregation: AggregationPolicy { min_group_observations: 10, min_location_observations: 0 },
            ..Config::default()
        };
        let inputs = PreprocessInputs {
            cloudflare: Some("raw/cloudflare.csv".to_string()),
            starlink_states: Some("raw/starlink_states.csv".to_string()),
            ..PreprocessInputs::default()
        };

        let metadata = Preprocessor::new(Arc::clone(&store), &config)
            .run(&inputs)
            .await
            .unwrap()
            .unwrap();
        let cloudflare = &metadata.sources["cloudflare"];
        assert_eq!(cloudflare.observations, 25);
        assert_eq!(cloudflare.rows, 2);
        assert_eq!(cloudflare.locations, 1);
        assert_eq!(metadata.starlink_state_records, 2);
        assert_eq!(metadata.regional_records, 0);

        let reader = SummaryReader::new(Arc::clone(&store));
        let rows = reader.read_summary_rows(Source::Cloudflare).await.unwrap();
        let asns: Vec<u32> = rows.iter().map(|r| r.group.asn).collect();
        assert_eq!(asns, vec![7922, 14593]);
        assert_eq!(rows[1].summary(Metric::Download).unwrap().median, 105.5);

        let state = Arc::new(AppState::new(store, config));
        let regions = get_regions(
            State(state),
            Query(RegionsQuery { metric: "download".to_string(), provider: Some("starlink".to_string()) }),
        )
        .await
        .unwrap()
        .0;
        let names: Vec<&str> = regions.regions.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(names, vec!["Texas", "Utah"]);
        assert_eq!(regions.regions[0].mean, 110.0);
    }

    #[tokio::test]
    async fn test_preprocess_without_inputs() {
        let store = memory_store();
        let result = Preprocessor::new(Arc::clone(&store), &Config::default())
            .run(&PreprocessInputs::default())
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(store.get(&Path::from(METADATA_FILE)).await.is_err());
    }
}
