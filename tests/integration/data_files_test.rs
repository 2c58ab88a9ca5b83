use plant_diagnostics::models::{Action, MachineAssessment};
use plant_diagnostics::{ingest, machines, waste, Config, DiagnosticsError};
use std::fs;
use tempfile::TempDir;

const PRODUCTION_CSV: &str = "\
batch_id,machine,shift,input_liters,output_liters,recorded_waste_liters
B001,Filler-1,Morning,100,90,5
B002,Filler-2,Night,200,195,3
B003,Filler-1,Night,400,390,4
";

const MACHINE_JSON: &str = r#"{
  "machines": {
    "Press-7": {"batches": [
      {"input_liters": 600, "output_liters": 500, "waste_liters": 50, "energy_kwh": 30},
      {"input_liters": 400, "output_liters": 350, "waste_liters": 40, "energy_kwh": 20}
    ]},
    "Idle-2": {"batches": []},
    "Mixer-3": {"batches": [
      {"input_liters": 1000, "output_liters": 960, "waste_liters": 20, "energy_kwh": 10}
    ]}
  }
}"#;

fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("production_data.csv"), PRODUCTION_CSV).unwrap();
    fs::write(dir.path().join("machine_health.json"), MACHINE_JSON).unwrap();
    dir
}

#[test]
fn test_waste_report_from_data_dir() {
    let dir = data_dir();
    let config = Config::new(dir.path());

    let batches = ingest::read_batches(&config.production_csv()).unwrap();
    let report = waste::analyze(&batches).unwrap();

    // invisible waste: 5, 2, 6
    assert_eq!(report.totals.total_waste, 13.0);
    assert_eq!(report.totals.total_cost, 156.0);
    assert_eq!(report.totals.high_batch_count, 1);

    let first = &report.per_batch[0];
    assert_eq!(first.invisible_waste_liters, 5.0);
    assert!(first.high_invisible_waste);
    assert_eq!(first.invisible_waste_cost, 60.0);

    let machines: Vec<_> = report
        .by_machine
        .iter()
        .map(|g| (g.key.as_str(), g.avg_waste))
        .collect();
    assert_eq!(machines, vec![("Filler-1", 5.5), ("Filler-2", 2.0)]);

    let shifts: Vec<_> = report
        .by_shift
        .iter()
        .map(|g| (g.key.as_str(), g.avg_waste))
        .collect();
    assert_eq!(shifts, vec![("Morning", 5.0), ("Night", 4.0)]);
}

#[test]
fn test_waste_report_serializes_flat_rows() {
    let dir = data_dir();
    let batches = ingest::read_batches(&Config::new(dir.path()).production_csv()).unwrap();
    let report = waste::analyze(&batches).unwrap();

    let value = serde_json::to_value(&report).unwrap();
    let row = &value["per_batch"][0];
    assert_eq!(row["batch_id"], "B001");
    assert_eq!(row["invisible_waste_liters"], 5.0);
    assert_eq!(row["high_invisible_waste"], true);
    assert_eq!(value["trend"][2]["batch_id"], "B003");
}

#[test]
fn test_machine_report_from_data_dir() {
    let dir = data_dir();
    let telemetry = ingest::read_machines(&Config::new(dir.path()).machine_json()).unwrap();
    let results = machines::evaluate(&telemetry).unwrap();

    let names: Vec<_> = results.iter().map(MachineAssessment::name).collect();
    assert_eq!(names, vec!["Press-7", "Idle-2", "Mixer-3"]);

    let press = results[0].summary().unwrap();
    assert_eq!(press.waste_ratio, 0.09);
    assert_eq!(press.efficiency, 0.81);
    assert!(press.faulty);
    assert_eq!(press.action, Action::Repair);

    assert!(results[1].summary().is_none());

    let mixer = results[2].summary().unwrap();
    assert!(!mixer.faulty);
    assert_eq!(mixer.action, Action::None);

    let value = serde_json::to_value(&results).unwrap();
    assert_eq!(value[0]["status"], "evaluated");
    assert_eq!(value[0]["action"], "REPAIR");
    assert_eq!(value[1]["status"], "no_data");
    assert_eq!(value[1]["name"], "Idle-2");
}

#[test]
fn test_zero_input_batch_in_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("production_data.csv");
    fs::write(
        &path,
        "batch_id,machine,shift,input_liters,output_liters,recorded_waste_liters\nB9,F,Day,0,0,0\n",
    )
    .unwrap();

    let batches = ingest::read_batches(&path).unwrap();
    let err = waste::analyze(&batches).unwrap_err();
    assert!(matches!(err, DiagnosticsError::UndefinedRatio { .. }));
    assert_eq!(
        err.to_string(),
        "undefined invisible_waste_percent for batch 'B9': denominator is zero"
    );
}

#[test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let config = Config::new(dir.path());
    assert!(matches!(
        ingest::read_batches(&config.production_csv()),
        Err(DiagnosticsError::Io(_))
    ));
}
