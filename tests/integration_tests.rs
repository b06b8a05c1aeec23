use chrono::NaiveDate;
use inmet_processor::models::{Reading, StationKey};
use inmet_processor::processors::{DailyAggregator, Ingestor};
use inmet_processor::storage::daily::fetch_daily;
use inmet_processor::storage::measurements::count_measurements;
use inmet_processor::storage::stations::{count_stations, find_station};
use inmet_processor::storage::{AggregationScope, Database};
use inmet_processor::{ProcessingError, Result};
use pretty_assertions::assert_eq;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// 2019-onwards export: ISO founding date, a title row, slashed dates, Latin-1 text.
fn titled_station_file() -> Vec<u8> {
    let mut bytes = b"REGIAO:;CO\n\
        UF:;GO\n\
        ESTACAO:;GOIANIA\n\
        CODIGO (WMO):;A002\n\
        LATITUDE:;-16,64277777\n\
        LONGITUDE:;-49,22027777\n\
        ALTITUDE:;770\n\
        DATA DE FUNDACAO:;2001-05-29\n"
        .to_vec();
    bytes.extend_from_slice(b"Data;Hora UTC;PRECIPITA\xC7\xC3O TOTAL, HOR\xC1RIO (mm);");
    bytes.extend_from_slice(b"PRESSAO ATMOSFERICA AO NIVEL DA ESTACAO, HORARIA (mB);...\n");
    bytes.extend_from_slice(
        b"2019/01/01;0000 UTC;0;924,2;924,2;923,7;-9999;22,4;19,1;23,1;22,4;19,3;18,9;82;79;82;293;4,1;1,2;\n\
          2019/01/01;2500 UTC;0;924,6;924,6;924,2;-9999;21,8;19,2;22,4;21,8;19,3;19;86;82;85;317;3,5;1,1;\n\
          2019/01/01;1300 UTC;0,2;926,1;926,1;925,6;1520,3;24,0;19,5;24,2;22,9;19,6;19,2;79;73;76;306;5,3;2,0;\n",
    );
    bytes
}

/// Older export: DD/MM/YY founding date, no title row, ISO dates, HH:MM times.
fn legacy_station_file() -> Vec<u8> {
    b"REGIAO:;CO\n\
      UF:;DF\n\
      ESTACAO:;BRASILIA\n\
      CODIGO (WMO):;A001\n\
      LATITUDE:;-15,78944444\n\
      LONGITUDE:;-47,92583332\n\
      ALTITUDE:;1160,96\n\
      DATA DE FUNDACAO:;07/05/00\n\
      2000-05-07;12:00;0;887,7;888,2;887,7;1200;18,0;17,4;18,9;18,5;17,5;17,2;94;92;93;36;4,6;1,6;\n\
      2000-05-07;13:00;;887,9;888,0;887,7;800;20,0;17,0;20,1;18,0;17,4;16,9;90;85;88;40;5,0;2,0;\n"
        .to_vec()
}

fn write_zip(path: &Path, entries: &[(&str, Vec<u8>)]) -> Result<()> {
    let mut zip = ZipWriter::new(File::create(path)?);
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);

    zip.add_directory("dados/", options)?;
    for (name, bytes) in entries {
        zip.start_file(*name, options)?;
        zip.write_all(bytes)?;
    }
    zip.finish()?;
    Ok(())
}

async fn file_database(dir: &Path, max_connections: u32) -> Result<Database> {
    let url = format!("sqlite://{}", dir.join("clima.db").display());
    Database::connect(&url, max_connections, Duration::from_secs(30)).await
}

fn input_dir_with_archive(temp_dir: &TempDir) -> Result<PathBuf> {
    let input = temp_dir.path().join("input");
    fs::create_dir(&input)?;
    write_zip(
        &input.join("2019.zip"),
        &[
            ("dados/GO/INMET_CO_GO_A002_GOIANIA.CSV", titled_station_file()),
            ("dados/DF/INMET_CO_DF_A001_BRASILIA.csv", legacy_station_file()),
        ],
    )?;
    Ok(input)
}

#[tokio::test]
async fn test_archive_with_nested_files_is_ingested() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = input_dir_with_archive(&temp_dir)?;
    let db = file_database(temp_dir.path(), 3).await?;

    let report = Ingestor::new(db.clone())
        .with_max_workers(2)
        .ingest_directory(&input, "")
        .await?;

    assert_eq!(report.archives_processed, 1);
    assert_eq!(report.files_ingested, 2);
    assert_eq!(report.files_skipped, 0);
    assert_eq!(report.stations_created, 2);
    // Five rows in total, one with an impossible hour.
    assert_eq!(report.rows_inserted, 4);
    assert_eq!(report.rows_rejected, 1);
    assert_eq!(count_measurements(db.pool(), None).await?, 4);
    assert_eq!(count_stations(db.pool()).await?, 2);

    db.close().await;
    Ok(())
}

#[tokio::test]
async fn test_station_header_round_trips() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = input_dir_with_archive(&temp_dir)?;
    let db = Database::in_memory().await?;

    Ingestor::new(db.clone()).ingest_directory(&input, "").await?;

    let key = StationKey {
        name: "BRASILIA".to_string(),
        wmo_code: "A001".to_string(),
    };
    let station = find_station(db.pool(), &key).await?.expect("station stored");
    assert_eq!(station.region, "CO");
    assert_eq!(station.uf, "DF");
    assert_eq!(station.latitude, Some(-15.78944444));
    assert_eq!(station.longitude, Some(-47.92583332));
    assert_eq!(station.altitude, Some(1160.96));
    assert_eq!(station.founding_date, NaiveDate::from_ymd_opt(2000, 5, 7).unwrap());

    let key = StationKey {
        name: "GOIANIA".to_string(),
        wmo_code: "A002".to_string(),
    };
    let station = find_station(db.pool(), &key).await?.expect("station stored");
    assert_eq!(station.founding_date, NaiveDate::from_ymd_opt(2001, 5, 29).unwrap());
    assert_eq!(station.altitude, Some(770.0));
    Ok(())
}

#[tokio::test]
async fn test_reingesting_reuses_station_ids() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = input_dir_with_archive(&temp_dir)?;
    let db = Database::in_memory().await?;

    Ingestor::new(db.clone()).ingest_directory(&input, "").await?;
    let second = Ingestor::new(db.clone()).ingest_directory(&input, "").await?;

    assert_eq!(second.stations_created, 0);
    assert_eq!(count_stations(db.pool()).await?, 2);
    Ok(())
}

#[tokio::test]
async fn test_extraction_area_is_removed_when_a_file_fails() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = temp_dir.path().join("input");
    let work = temp_dir.path().join("work");
    fs::create_dir(&input)?;
    fs::create_dir(&work)?;
    write_zip(
        &input.join("2020.zip"),
        &[
            ("dados/a_truncated.csv", b"REGIAO:;CO\nUF:;DF\n".to_vec()),
            ("dados/b_good.csv", legacy_station_file()),
        ],
    )?;

    let db = Database::in_memory().await?;
    let report = Ingestor::new(db.clone())
        .with_work_dir(&work)
        .ingest_directory(&input, "")
        .await?;

    assert_eq!(report.archives_processed, 1);
    assert_eq!(report.files_ingested, 1);
    assert_eq!(report.files_skipped, 1);
    assert!(report.skipped[0].path.ends_with("a_truncated.csv"));
    assert!(report.skipped[0].error.contains("Invalid station file"));
    assert_eq!(count_measurements(db.pool(), None).await?, 2);
    assert_eq!(fs::read_dir(&work)?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_broken_archive_does_not_stop_the_run() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = input_dir_with_archive(&temp_dir)?;
    fs::write(input.join("2018.zip"), b"PK\x03\x04 not really a zip")?;

    let db = Database::in_memory().await?;
    let report = Ingestor::new(db.clone()).ingest_directory(&input, "").await?;

    assert_eq!(report.archives_failed, 1);
    assert_eq!(report.archives_processed, 1);
    assert_eq!(report.files_ingested, 2);
    assert!(report.skipped[0].path.ends_with("2018.zip"));
    assert!(report.has_warnings());
    Ok(())
}

#[tokio::test]
async fn test_empty_directory_gives_empty_report() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db = Database::in_memory().await?;

    let report = Ingestor::new(db.clone())
        .ingest_directory(temp_dir.path(), "")
        .await?;

    assert!(report.is_empty());
    assert_eq!(count_measurements(db.pool(), None).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_loose_csv_files_are_ingested() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::write(temp_dir.path().join("INMET_CO_DF_A001.CSV"), legacy_station_file())?;
    fs::write(temp_dir.path().join("notes.txt"), b"not a station file")?;

    let db = Database::in_memory().await?;
    let report = Ingestor::new(db.clone())
        .ingest_directory(temp_dir.path(), "")
        .await?;

    assert_eq!(report.archives_processed, 0);
    assert_eq!(report.files_ingested, 1);
    assert_eq!(count_measurements(db.pool(), None).await?, 2);
    Ok(())
}

#[tokio::test]
async fn test_cancellation_keeps_committed_files() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let first = temp_dir.path().join("a.csv");
    let second = temp_dir.path().join("b.csv");
    fs::write(&first, legacy_station_file())?;
    fs::write(&second, titled_station_file())?;

    let db = Database::in_memory().await?;
    let ingestor = Ingestor::new(db.clone());
    ingestor.ingest_file(&first).await?;

    ingestor.cancel_flag().store(true, Ordering::Relaxed);
    let interrupted = ingestor.ingest_file(&second).await;

    assert!(matches!(interrupted, Err(ProcessingError::Cancelled)));
    assert_eq!(count_measurements(db.pool(), None).await?, 2);
    Ok(())
}

#[tokio::test]
async fn test_ingest_then_aggregate() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = input_dir_with_archive(&temp_dir)?;
    let db = file_database(temp_dir.path(), 2).await?;

    Ingestor::new(db.clone()).ingest_directory(&input, "").await?;

    let aggregator = DailyAggregator::new(db.clone());
    let first = aggregator.run(&AggregationScope::all(), None).await?;
    let second = aggregator.run(&AggregationScope::all(), None).await?;

    assert_eq!(first.days_written, 2);
    assert_eq!(second.days_written, 2);
    assert_eq!(second.days_replaced, 2);

    let days = fetch_daily(db.pool(), &AggregationScope::all()).await?;
    assert_eq!(days.len(), 2);

    let brasilia = days
        .iter()
        .find(|d| d.date == NaiveDate::from_ymd_opt(2000, 5, 7).unwrap())
        .expect("legacy station day");
    assert_eq!(brasilia.readings.get(Reading::DryBulbTemperature), Some(19.0));
    assert_eq!(brasilia.readings.get(Reading::GlobalRadiation), Some(2000.0));
    // One hour reported no precipitation at all, the other 0.
    assert_eq!(brasilia.readings.get(Reading::Precipitation), Some(0.0));

    let goiania = days
        .iter()
        .find(|d| d.date == NaiveDate::from_ymd_opt(2019, 1, 1).unwrap())
        .expect("titled station day");
    assert_eq!(goiania.readings.get(Reading::GlobalRadiation), Some(1520.3));

    db.close().await;
    Ok(())
}
