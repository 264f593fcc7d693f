// attune_sim/src/harness/core/data.rs

//! Loading the learned model and the logged flight data it was trained on.

use attune_core::cost::AttitudeCost;
use attune_core::models::linear::{LinearModel, LinearModelFile};
use attune_core::models::{DynamicsModel, ModelMetadata};
use attune_core::types::{Action, State};
use nalgebra::DVector;
use rand::Rng;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::info;

use crate::error::{HarnessError, HarnessResult};

pub fn load_model(path: &Path) -> HarnessResult<LinearModel> {
    let text = fs::read_to_string(path).map_err(|source| HarnessError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: LinearModelFile = toml::from_str(&text).map_err(|source| HarnessError::ModelParse {
        path: path.to_path_buf(),
        source,
    })?;
    let model = LinearModel::from_file(file)?;
    let meta = model.metadata();
    info!(
        states = meta.state_columns.len(),
        inputs = meta.input_columns.len(),
        targets = meta.target_columns.len(),
        "Loaded dynamics model from {:?}",
        path
    );
    Ok(model)
}

/// Logged rows projected onto a model's state, input and target columns.
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    pub states: Vec<State>,
    pub actions: Vec<Action>,
    pub targets: Vec<DVector<f64>>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

fn column_indices(headers: &csv::StringRecord, names: &[String]) -> HarnessResult<Vec<usize>> {
    names
        .iter()
        .map(|name| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| HarnessError::MissingColumn(name.clone()))
        })
        .collect()
}

fn select(
    record: &csv::StringRecord,
    headers: &csv::StringRecord,
    indices: &[usize],
) -> HarnessResult<DVector<f64>> {
    let mut values = Vec::with_capacity(indices.len());
    for &i in indices {
        let cell = record.get(i).unwrap_or("").trim();
        let value = cell.parse::<f64>().map_err(|_| HarnessError::BadCell {
            line: record.position().map_or(0, |p| p.line()),
            column: headers.get(i).unwrap_or("").trim().to_string(),
            value: cell.to_string(),
        })?;
        values.push(value);
    }
    Ok(DVector::from_vec(values))
}

/// Reads a headed CSV and keeps, in model order, the columns `metadata`
/// names. Other columns are never parsed.
pub fn read_trajectory<R: Read>(reader: R, metadata: &ModelMetadata) -> HarnessResult<Trajectory> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let state_idx = column_indices(&headers, &metadata.state_columns)?;
    let input_idx = column_indices(&headers, &metadata.input_columns)?;
    let target_idx = column_indices(&headers, &metadata.target_columns)?;

    let mut trajectory = Trajectory::default();
    for record in rdr.records() {
        let record = record?;
        trajectory.states.push(select(&record, &headers, &state_idx)?);
        trajectory.actions.push(select(&record, &headers, &input_idx)?);
        trajectory.targets.push(select(&record, &headers, &target_idx)?);
    }
    Ok(trajectory)
}

pub fn load_trajectory(path: &Path, metadata: &ModelMetadata) -> HarnessResult<Trajectory> {
    let file = fs::File::open(path).map_err(|source| HarnessError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let trajectory = read_trajectory(file, metadata)?;
    info!(rows = trajectory.len(), "Loaded trajectory from {:?}", path);
    Ok(trajectory)
}

/// Rows close enough to level flight to start a rollout from:
/// `|pitch| < max_abs_pitch` and `|roll| < max_abs_roll`.
pub fn permissible_states(
    states: &[State],
    max_abs_pitch: f64,
    max_abs_roll: f64,
) -> HarnessResult<Vec<State>> {
    let reasonable: Vec<State> = states
        .iter()
        .filter(|s| {
            s.len() > AttitudeCost::ROLL
                && s[AttitudeCost::PITCH].abs() < max_abs_pitch
                && s[AttitudeCost::ROLL].abs() < max_abs_roll
        })
        .cloned()
        .collect();
    if reasonable.is_empty() {
        return Err(HarnessError::NoPermissibleStates {
            max_abs_pitch,
            max_abs_roll,
        });
    }
    Ok(reasonable)
}

/// Uniformly picks one state. `states` must be non-empty.
pub fn pick_initial_state<'a, R: Rng>(states: &'a [State], rng: &mut R) -> &'a State {
    &states[rng.gen_range(0..states.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn metadata() -> ModelMetadata {
        ModelMetadata {
            state_columns: vec!["roll".into(), "pitch".into()],
            input_columns: vec!["m1".into()],
            target_columns: vec!["pitch_dx".into()],
        }
    }

    const CSV: &str = "\
time,pitch,roll,m1,pitch_dx
0.0,1.0,2.0,100.0,0.5
0.1,3.0,4.0,110.0,-0.5
";

    #[test]
    fn test_columns_are_selected_in_model_order() {
        let t = read_trajectory(CSV.as_bytes(), &metadata()).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.states[0], dvector![2.0, 1.0]);
        assert_eq!(t.actions[1], dvector![110.0]);
        assert_eq!(t.targets[1], dvector![-0.5]);
    }

    #[test]
    fn test_missing_column_is_named() {
        let mut meta = metadata();
        meta.input_columns.push("m2".into());
        let err = read_trajectory(CSV.as_bytes(), &meta).unwrap_err();
        assert!(matches!(err, HarnessError::MissingColumn(name) if name == "m2"));
    }

    #[test]
    fn test_bad_number_in_a_used_column_is_named() {
        let bad = "pitch,roll,m1,pitch_dx\n1.0,two,3.0,4.0\n";
        let err = read_trajectory(bad.as_bytes(), &metadata()).unwrap_err();
        assert!(matches!(
            err,
            HarnessError::BadCell { line: 2, column, value } if column == "roll" && value == "two"
        ));
    }

    #[test]
    fn test_unused_columns_are_not_parsed() {
        let csv = "\
flight,pitch,roll,m1,note,pitch_dx
cf-01,1.0,2.0,100.0,,0.5
cf-01,3.0,4.0,110.0,gusty,-0.5
";
        let t = read_trajectory(csv.as_bytes(), &metadata()).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.states[1], dvector![4.0, 3.0]);
        assert_eq!(t.targets[0], dvector![0.5]);
    }

    #[test]
    fn test_ragged_row_is_a_csv_error() {
        let bad = "pitch,roll,m1,pitch_dx\n1.0,2.0,3.0\n";
        let err = read_trajectory(bad.as_bytes(), &metadata()).unwrap_err();
        assert!(matches!(err, HarnessError::Csv(_)));
    }

    #[test]
    fn test_permissible_filter() {
        let states = vec![
            dvector![1.0, -2.0, 0.0],
            dvector![12.0, 0.0, 0.0],
            dvector![0.0, -10.0, 0.0],
            dvector![-9.9, 9.9, 0.0],
        ];
        let kept = permissible_states(&states, 10.0, 10.0).unwrap();
        assert_eq!(kept, vec![states[0].clone(), states[3].clone()]);

        assert!(matches!(
            permissible_states(&states, 0.5, 0.5),
            Err(HarnessError::NoPermissibleStates { .. })
        ));
    }

    #[test]
    fn test_pick_is_seeded() {
        let states: Vec<State> = (0..20).map(|i| dvector![i as f64]).collect();
        let a = pick_initial_state(&states, &mut ChaCha8Rng::seed_from_u64(4)).clone();
        let b = pick_initial_state(&states, &mut ChaCha8Rng::seed_from_u64(4)).clone();
        assert_eq!(a, b);
    }

    #[test]
    fn test_model_file_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.toml");
        fs::write(
            &path,
            r#"
state_columns = ["pitch", "roll"]
input_columns = ["m1"]
target_columns = ["pitch_dx", "roll"]
weights = [[0.0, 0.0, 1.0], [0.0, 1.0, 0.0]]
bias = [0.0, 0.5]
"#,
        )
        .unwrap();
        let model = load_model(&path).unwrap();
        assert_eq!(model.metadata().target_columns.len(), 2);

        fs::write(&path, "weights = 3").unwrap();
        assert!(matches!(
            load_model(&path).unwrap_err(),
            HarnessError::ModelParse { .. }
        ));
    }
}
